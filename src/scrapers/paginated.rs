//! Numbered-pagination sections (`.../page-2/`, `.../page-3/`, ...).

use super::listing_hrefs;
use crate::config::{Accumulate, LinkFilter};
use crate::error::PipelineError;
use crate::fetch::Fetch;
use crate::models::CandidateLink;
use itertools::Itertools;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};
use url::Url;

/// Borrowed view of a paginated source descriptor.
#[derive(Debug)]
pub struct Pagination<'a> {
    pub sections: &'a [String],
    pub page_template: &'a str,
    pub pages: u32,
    pub link_filter: &'a LinkFilter,
    pub accumulate: Accumulate,
}

/// URL of page `page` of `section`; page 1 is the section itself.
pub fn page_url(section: &str, template: &str, page: u32) -> String {
    if page <= 1 {
        section.to_string()
    } else {
        template
            .replace("{section}", section)
            .replace("{page}", &page.to_string())
    }
}

enum CompiledFilter {
    Pattern(Regex),
    PathPrefix { base: Url, prefixes: Vec<String> },
}

impl CompiledFilter {
    fn compile(filter: &LinkFilter) -> Result<Self, PipelineError> {
        match filter {
            LinkFilter::Pattern { regex } => Regex::new(regex)
                .map(CompiledFilter::Pattern)
                .map_err(|e| PipelineError::Parse(format!("link regex {regex:?}: {e}"))),
            LinkFilter::PathPrefix { base, prefixes } => Ok(CompiledFilter::PathPrefix {
                base: Url::parse(base).map_err(|e| PipelineError::Parse(format!("prefix base {base}: {e}")))?,
                prefixes: prefixes.clone(),
            }),
        }
    }

    /// Absolute URL for `href` if it passes the filter.
    fn apply(&self, page: &Url, href: &str) -> Option<Url> {
        match self {
            CompiledFilter::Pattern(re) => page.join(href).ok().filter(|u| re.is_match(u.as_str())),
            CompiledFilter::PathPrefix { base, prefixes } => {
                if prefixes.iter().any(|p| href.starts_with(p.as_str())) {
                    base.join(href).ok()
                } else {
                    None
                }
            }
        }
    }
}

/// Walk every page of every section and collect links passing the filter.
///
/// # Arguments
///
/// * `fetcher` - Source of listing markup
/// * `pagination` - Sections, page template, page count, link filter and accumulation mode
///
/// # Returns
///
/// Candidates in accumulation order: sorted for [`Accumulate::Set`], first
/// discovery for [`Accumulate::List`]. Each carries the host of the listing
/// page that produced it first.
///
/// # Errors
///
/// Returns [`PipelineError::Parse`] only if the link filter itself is
/// unusable; listing faults are logged and skipped.
#[instrument(level = "info", skip_all, fields(sections = pagination.sections.len(), pages = pagination.pages))]
pub async fn index_articles<F: Fetch>(fetcher: &F, pagination: &Pagination<'_>) -> Result<Vec<CandidateLink>, PipelineError> {
    let filter = CompiledFilter::compile(pagination.link_filter)?;
    let mut found: Vec<(Url, String)> = Vec::new();

    for section in pagination.sections {
        for page in 1..=pagination.pages.max(1) {
            let url = page_url(section, pagination.page_template, page);
            let page_base = match Url::parse(&url) {
                Ok(u) => u,
                Err(e) => {
                    warn!(%url, error = %e, "Skipping malformed page URL");
                    continue;
                }
            };
            let hrefs = match listing_hrefs(fetcher, &url).await {
                Ok(hrefs) => hrefs,
                Err(e) => {
                    warn!(%url, error = %e, "Listing page fetch failed");
                    continue;
                }
            };
            let listing_host = page_base.host_str().unwrap_or_default().to_string();
            let before = found.len();
            found.extend(
                hrefs
                    .iter()
                    .filter_map(|href| filter.apply(&page_base, href))
                    .map(|u| (u, listing_host.clone())),
            );
            debug!(%url, matched = found.len() - before, "Scanned listing page");
        }
    }

    let links: Vec<(Url, String)> = match pagination.accumulate {
        Accumulate::Set => {
            let mut by_url: BTreeMap<Url, String> = BTreeMap::new();
            for (url, host) in found {
                by_url.entry(url).or_insert(host);
            }
            by_url.into_iter().collect()
        }
        Accumulate::List => found.into_iter().unique_by(|(url, _)| url.clone()).collect(),
    };

    Ok(links
        .into_iter()
        .map(|(url, listing_host)| CandidateLink {
            url: url.to_string(),
            listing_host,
        })
        .collect())
}
