//! Relevance gate: block-term veto, alias mention and context keyword checks.
//!
//! All checks run over case-folded text. A block term vetoes a page even when
//! an alias and a context keyword are both present; this is what keeps sibling
//! entities sharing a name fragment (e.g. "ICICI Bank" vs "ICICI Securities")
//! out of the output.

use std::collections::BTreeSet;

/// Which check rejected a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Blocked(String),
    NoMention,
    NoContext,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Case-folded vocabularies for one run.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    aliases: Vec<String>,
    context_keywords: Vec<String>,
    block_terms: Vec<String>,
}

impl RelevanceFilter {
    /// Build a filter from raw vocabularies.
    ///
    /// # Arguments
    ///
    /// * `aliases` - Entity aliases
    /// * `context_keywords` - Phrases showing the entity is acting as a broker or analyst
    /// * `block_terms` - Sibling-entity names that veto a page outright
    ///
    /// All three are case-folded; blank entries are dropped.
    pub fn new(aliases: &BTreeSet<String>, context_keywords: &[String], block_terms: &[String]) -> Self {
        RelevanceFilter {
            aliases: fold_terms(aliases),
            context_keywords: fold_terms(context_keywords),
            block_terms: fold_terms(block_terms),
        }
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn context_keywords(&self) -> &[String] {
        &self.context_keywords
    }

    /// First block term present in `text`, if any.
    pub fn blocked_by(&self, text: &str) -> Option<&str> {
        let t = text.to_lowercase();
        self.block_terms
            .iter()
            .find(|b| t.contains(b.as_str()))
            .map(String::as_str)
    }

    /// Whether any alias occurs in `text`.
    pub fn mentions_entity(&self, text: &str) -> bool {
        contains_any(&text.to_lowercase(), &self.aliases)
    }

    /// Whether any context keyword occurs in `text`.
    pub fn has_context(&self, text: &str) -> bool {
        contains_any(&text.to_lowercase(), &self.context_keywords)
    }

    /// Evaluate all three checks; the block veto is reported first.
    ///
    /// # Arguments
    ///
    /// * `text` - Title and body joined, in any case
    ///
    /// # Returns
    ///
    /// [`Verdict::Accepted`], or the first check that failed.
    pub fn evaluate(&self, text: &str) -> Verdict {
        if let Some(term) = self.blocked_by(text) {
            return Verdict::Blocked(term.to_string());
        }
        if !self.mentions_entity(text) {
            return Verdict::NoMention;
        }
        if !self.has_context(text) {
            return Verdict::NoContext;
        }
        Verdict::Accepted
    }
}

fn fold_terms<'a>(items: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `haystack` must already be case-folded.
pub(crate) fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}
