//! Flat listing pages: every absolute http(s) anchor, up to a cap.

use super::{is_http, listing_base, listing_hrefs};
use crate::fetch::Fetch;
use crate::models::CandidateLink;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// Scan each listing once and collect resolved links until `max_links` is hit.
///
/// The cap applies across all listings of the source.
///
/// # Arguments
///
/// * `fetcher` - Source of listing markup
/// * `listings` - Absolute listing URLs, scanned in order
/// * `max_links` - Cap on candidates collected for the whole source
///
/// # Returns
///
/// Absolute http(s) candidates in discovery order, without duplicates.
#[instrument(level = "info", skip(fetcher, listings), fields(listings = listings.len()))]
pub async fn index_articles<F: Fetch>(fetcher: &F, listings: &[String], max_links: usize) -> Vec<CandidateLink> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for listing in listings {
        if links.len() >= max_links {
            break;
        }
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

        let before = links.len();
        for href in hrefs {
            let Ok(resolved) = base.join(&href) else {
                continue;
            };
            if !is_http(&resolved) {
                continue;
            }
            let url = resolved.to_string();
            if seen.insert(url.clone()) {
                links.push(CandidateLink {
                    url,
                    listing_host: host.clone(),
                });
                if links.len() >= max_links {
                    break;
                }
            }
        }
        debug!(%listing, added = links.len() - before, "Scanned flat listing");
    }

    links
}
