//! Heuristic "is this an article?" predicate for discovered links.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Substrings that mark quote/price pages rather than articles.
const NEGATIVE_SIGNALS: &[&str] = &["stockpricequote", "stock-price-quote", "price-quote", "/quote/"];

/// A numeric id of six or more digits followed by an article extension.
static ARTICLE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\D\d{6,}\.(?:cms|html?|ece|php)$").expect("valid article regex"));

/// Returns `true` if `url` looks like an article page.
///
/// Only the path is shape-checked, so query strings and fragments do not
/// affect the verdict. Unparseable URLs are rejected.
pub fn looks_like_article(url: &str) -> bool {
    let lower = url.to_lowercase();
    if NEGATIVE_SIGNALS.iter().any(|s| lower.contains(s)) {
        return false;
    }
    match Url::parse(&lower) {
        Ok(parsed) => ARTICLE_PATH.is_match(parsed.path()),
        Err(_) => false,
    }
}
