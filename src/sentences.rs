//! Evidence sentence selection.

use crate::relevance::contains_any;
use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum number of key sentences kept on a record.
pub const MAX_KEY_SENTENCES: usize = 3;

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]").expect("valid sentence regex"));

/// Segments of `text` containing both an alias and a context keyword, in order.
///
/// `aliases` and `keywords` must be case-folded.
pub fn extract_key_sentences(text: &str, aliases: &[String], keywords: &[String]) -> Vec<String> {
    SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| {
            let folded = s.to_lowercase();
            contains_any(&folded, aliases) && contains_any(&folded, keywords)
        })
        .map(str::to_string)
        .collect()
}

/// Key sentences from the body, falling back to the title, truncated to
/// [`MAX_KEY_SENTENCES`].
pub fn key_sentences_for(
    title: &str,
    body: Option<&str>,
    aliases: &[String],
    keywords: &[String],
) -> Vec<String> {
    let mut sentences = body
        .map(|b| extract_key_sentences(b, aliases, keywords))
        .unwrap_or_default();
    if sentences.is_empty() {
        sentences = extract_key_sentences(title, aliases, keywords);
    }
    sentences.truncate(MAX_KEY_SENTENCES);
    sentences
}
