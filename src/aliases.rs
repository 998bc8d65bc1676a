//! Alias generation for the monitored entity.

use crate::error::PipelineError;
use crate::models::Entity;
use std::collections::BTreeSet;

/// Derive the case-folded alias set for an entity name.
///
/// The set holds the base name, `"<base> ltd"`, `"<base> limited"`, the base
/// with `securities` shortened to `sec`, and the first whitespace token of the
/// base. Duplicates collapse.
pub fn generate_aliases(name: &str) -> BTreeSet<String> {
    let base = name.trim().to_lowercase();
    let mut aliases = BTreeSet::new();
    if base.is_empty() {
        return aliases;
    }

    aliases.insert(format!("{base} ltd"));
    aliases.insert(format!("{base} limited"));
    aliases.insert(base.replace("securities", "sec"));
    if let Some(first) = base.split_whitespace().next() {
        aliases.insert(first.to_string());
    }
    aliases.insert(base);
    aliases
}

impl Entity {
    /// Build an entity from an operator-supplied name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the name is empty.
    pub fn new(display_name: &str) -> Result<Self, PipelineError> {
        let aliases = generate_aliases(display_name);
        if aliases.is_empty() {
            return Err(PipelineError::Config("entity name must not be empty".into()));
        }
        Ok(Entity {
            display_name: display_name.trim().to_string(),
            aliases,
        })
    }
}
