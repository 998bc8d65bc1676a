//! Link discovery for each configured source.
//!
//! Every adapter turns a [`SourceDescriptor`] into a deduplicated list of
//! [`CandidateLink`]s. A fault on one listing page is logged and skipped; the
//! adapter carries on with the next page and never fails the run.
//!
//! # Source kinds
//!
//! | Kind | Module | Link filter | Order |
//! |------|--------|-------------|-------|
//! | Flat listing | [`flat`] | any absolute http(s) anchor, capped | discovery |
//! | Numbered pagination | [`paginated`] | regex or path-prefix allowlist | sorted set or discovery list |
//! | Strict single-domain | [`strict`] | [`crate::url_filter`] + same host | discovery |

pub mod flat;
pub mod paginated;
pub mod strict;

use crate::config::{SourceDescriptor, SourceKind};
use crate::error::PipelineError;
use crate::fetch::Fetch;
use crate::models::CandidateLink;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{info, instrument, warn};
use url::Url;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Discover candidate article links for one source.
///
/// Dispatches on [`SourceKind`] to the matching adapter. Listing faults are
/// logged inside the adapter; an unusable link filter empties the source.
///
/// # Arguments
///
/// * `fetcher` - Source of listing markup
/// * `source` - Descriptor naming the kind, listings and filters
///
/// # Returns
///
/// The source's deduplicated candidates, possibly empty.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn index_articles<F: Fetch>(fetcher: &F, source: &SourceDescriptor) -> Vec<CandidateLink> {
    let links = match &source.kind {
        SourceKind::Flat {
            listings,
            max_links,
        } => flat::index_articles(fetcher, listings, *max_links).await,
        SourceKind::Paginated {
            sections,
            page_template,
            pages,
            link_filter,
            accumulate,
        } => {
            let pagination = paginated::Pagination {
                sections,
                page_template,
                pages: *pages,
                link_filter,
                accumulate: *accumulate,
            };
            match paginated::index_articles(fetcher, &pagination).await {
                Ok(links) => links,
                Err(e) => {
                    warn!(error = %e, "Skipping source with unusable link filter");
                    Vec::new()
                }
            }
        }
        SourceKind::Strict { listings } => strict::index_articles(fetcher, listings).await,
    };

    info!(count = links.len(), "Indexed candidate links");
    links
}

/// Fetch a listing page and return its raw `href` values in document order.
pub(crate) async fn listing_hrefs<F: Fetch>(fetcher: &F, page_url: &str) -> Result<Vec<String>, PipelineError> {
    let markup = fetcher.fetch(page_url).await?;
    Ok(anchor_hrefs(&markup))
}

pub(crate) fn anchor_hrefs(markup: &str) -> Vec<String> {
    let document = Html::parse_document(markup);
    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}

/// Parse a listing URL and return it with its host.
pub(crate) fn listing_base(listing: &str) -> Result<(Url, String), PipelineError> {
    let base = Url::parse(listing).map_err(|e| PipelineError::Parse(format!("listing {listing}: {e}")))?;
    let host = base
        .host_str()
        .ok_or_else(|| PipelineError::Parse(format!("listing {listing} has no host")))?
        .to_string();
    Ok((base, host))
}

pub(crate) fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::fetch::testing::StaticFetcher;

    #[test]
    fn test_anchor_hrefs_in_order() {
        let html = r##"<a href=" /a ">A</a><a>no href</a><a href="">empty</a><a href="https://x.test/b">B</a><a href="#top">top</a>"##;
        assert_eq!(anchor_hrefs(html), vec!["/a", "https://x.test/b", "#top"]);
    }

    #[test]
    fn test_listing_base() {
        let (url, host) = listing_base("https://www.livemint.com/market").unwrap();
        assert_eq!(url.path(), "/market");
        assert_eq!(host, "www.livemint.com");
        assert!(listing_base("not a url").is_err());
    }

    #[tokio::test]
    async fn test_dispatch_survives_unreachable_source() {
        let fetcher = StaticFetcher::new();
        for source in PipelineConfig::default().sources {
            assert!(index_articles(&fetcher, &source).await.is_empty());
        }
        assert!(!fetcher.requests.borrow().is_empty());
    }
}
