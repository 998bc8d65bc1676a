//! Strict single-domain listings.
//!
//! Links are resolved, stripped of fragments, shape-checked with
//! [`looks_like_article`], and kept only if their host equals the listing's
//! host. Cross-domain candidates are dropped here and never fetched.

use super::{is_http, listing_base, listing_hrefs};
use crate::error::PipelineError;
use crate::fetch::Fetch;
use crate::models::CandidateLink;
use crate::url_filter::looks_like_article;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// Collect same-host, article-shaped links from each listing.
///
/// # Arguments
///
/// * `fetcher` - Source of listing markup
/// * `listings` - Absolute listing URLs; each defines the host its candidates must share
///
/// # Returns
///
/// Fragment-free candidates in discovery order, without duplicates.
/// Cross-domain links are counted and dropped.
#[instrument(level = "info", skip(fetcher, listings), fields(listings = listings.len()))]
pub async fn index_articles<F: Fetch>(fetcher: &F, listings: &[String]) -> Vec<CandidateLink> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for listing in listings {
        let (base, host) = match listing_base(listing) {
            Ok(parts) => parts,
            Err(e) => {
                warn!(%listing, error = %e, "Skipping listing");
                continue;
            }
        };
        let hrefs = match listing_hrefs(fetcher, listing).await {
            Ok(hrefs) => hrefs,
            Err(e) => {
                warn!(%listing, error = %e, "Listing fetch failed");
                continue;
            }
        };

        let mut mismatched = 0usize;
        for href in hrefs {
            let Ok(mut resolved) = base.join(&href) else {
                continue;
            };
            if !is_http(&resolved) {
                continue;
            }
            resolved.set_fragment(None);
            let url = resolved.to_string();
            if !looks_like_article(&url) {
                continue;
            }
            let candidate_host = resolved.host_str().unwrap_or_default();
            if candidate_host != host {
                let e = PipelineError::DomainMismatch {
                    listing: host.clone(),
                    candidate: candidate_host.to_string(),
                };
                debug!(%url, error = %e, "Dropping cross-domain candidate");
                mismatched += 1;
                continue;
            }
            if seen.insert(url.clone()) {
                links.push(CandidateLink {
                    url,
                    listing_host: host.clone(),
                });
            }
        }
        debug!(%listing, mismatched, total = links.len(), "Scanned strict listing");
    }

    links
}
