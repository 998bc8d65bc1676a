//! Data models for monitored entities, extracted pages and persisted records.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`Entity`]: The monitored name plus its case-folded alias set
//! - [`CandidateLink`]: A URL discovered on a listing page
//! - [`ExtractedContent`]: Title/body pulled out of an article page
//! - [`Record`] / [`DebugRecord`]: The two NDJSON output shapes

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The monitored entity.
///
/// Aliases are always lower-case and always contain the base name and its
/// first whitespace token; see [`crate::aliases::generate_aliases`].
#[derive(Debug, Clone)]
pub struct Entity {
    /// Name as supplied by the operator; written verbatim into records.
    pub display_name: String,
    /// Case-folded substrings used for mention matching.
    pub aliases: BTreeSet<String>,
}

/// A URL discovered while scanning a listing page.
///
/// Candidates are consumed immediately by extraction and never persisted
/// unless they turn into a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    /// Absolute article URL.
    pub url: String,
    /// Host of the listing page the link was found on.
    pub listing_host: String,
}

/// Whether a page yielded a usable body or only a headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentQuality {
    FullBody,
    HeadlineOnly,
}

/// Title and body extracted from an article page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    pub title: String,
    pub body: Option<String>,
}

impl ExtractedContent {
    /// Derived solely from body presence.
    pub fn quality(&self) -> ContentQuality {
        match self.body.as_deref() {
            Some(b) if !b.trim().is_empty() => ContentQuality::FullBody,
            _ => ContentQuality::HeadlineOnly,
        }
    }

    /// Title and body joined with a single space, as matched by the filters.
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.title, self.body.as_deref().unwrap_or(""))
    }
}

/// Mutually exclusive article categories assigned by [`crate::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticleType {
    #[serde(rename = "broker_recommendation")]
    Recommendation,
    #[serde(rename = "broker_opinion")]
    Opinion,
    #[serde(rename = "broker_quote")]
    Quote,
    #[serde(rename = "broker_mention")]
    Mention,
}

/// One accepted article, as written to the output file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub entity: String,
    pub headline: String,
    pub publication: String,
    pub article_type: ArticleType,
    pub content_quality: ContentQuality,
    /// At most three sentences, each containing an alias and a context keyword.
    pub key_sentences: Vec<String>,
    pub url: String,
    pub collected_at: DateTime<Utc>,
}

/// Debug-oriented output line used to inspect what the crawler actually saw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugRecord {
    pub entity: String,
    pub url: String,
    pub publish_date: Option<DateTime<FixedOffset>>,
    pub collected_at: DateTime<Utc>,
    /// First 500 characters of the combined title and body.
    pub text_preview: String,
}
