//! Pipeline configuration: HTTP settings, filter vocabularies and the source table.
//!
//! Sources are declarative [`SourceDescriptor`]s, so a new listing is a YAML
//! entry rather than a new scraper module. [`PipelineConfig::default`] carries
//! the built-in table; `--config sources.yaml` replaces it wholesale.
//!
//! # Example
//!
//! ```yaml
//! request_delay_ms: 600
//! sources:
//!   - name: LiveMint
//!     kind:
//!       type: paginated
//!       sections: ["https://www.livemint.com/market/stock-market-news"]
//!       page_template: "{section}/page-{page}"
//!       pages: 5
//!       accumulate: list
//!       link_filter:
//!         type: path_prefix
//!         base: "https://www.livemint.com"
//!         prefixes: ["/market/stock-market-news/"]
//! ```

use crate::error::PipelineError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (EntityIntelligence/4.0)";
pub const DEFAULT_OUTPUT_FILE: &str = "entity_intelligence_live_results.jsonl";

/// Top-level configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Fixed pause after every article fetch.
    pub request_delay_ms: u64,
    /// Bodies shorter than this fall through to the next extraction step.
    pub min_body_length: usize,
    pub context_keywords: Vec<String>,
    pub block_terms: Vec<String>,
    pub sources: Vec<SourceDescriptor>,
}

/// One configured source and how to discover its article links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Publication name written into records.
    pub name: String,
    /// Only admit articles published "today" in the reference timezone.
    #[serde(default)]
    pub recency_gated: bool,
    #[serde(default)]
    pub date_rules: DateRules,
    pub kind: SourceKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    /// Fetch each listing once and keep every absolute http(s) anchor.
    Flat {
        listings: Vec<String>,
        max_links: usize,
    },
    /// Walk pages `1..=pages` of each section.
    Paginated {
        sections: Vec<String>,
        /// Template for pages 2 and up; `{section}` and `{page}` are substituted.
        page_template: String,
        pages: u32,
        link_filter: LinkFilter,
        #[serde(default)]
        accumulate: Accumulate,
    },
    /// Article-shaped links on the listing's own host only.
    Strict { listings: Vec<String> },
}

/// Per-source link-shape filter for paginated listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkFilter {
    /// Keep resolved links matching `regex`.
    Pattern { regex: String },
    /// Keep raw hrefs starting with one of `prefixes`, resolved against `base`.
    PathPrefix { base: String, prefixes: Vec<String> },
}

/// How paginated links are accumulated across pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accumulate {
    /// Unordered set; emitted sorted.
    #[default]
    Set,
    /// Discovery order with an explicit membership check.
    List,
}

/// Site-specific publish-date locations, tried after the generic ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRules {
    /// Extra `<meta name=...>` / `<meta property=...>` keys.
    pub alt_meta: Vec<String>,
    /// CSS selectors whose visible text holds a date.
    pub text_selectors: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            request_delay_ms: 600,
            min_body_length: 80,
            context_keywords: to_strings(&[
                "says",
                "said",
                "according to",
                "as per",
                "recommends",
                "recommended",
                "rating",
                "target price",
                "upside",
                "downside",
                "buy",
                "sell",
                "hold",
                "coverage",
                "outperform",
                "underperform",
                "bullish",
                "positive",
                "cautious",
                "stocks to buy",
                "top picks",
            ]),
            block_terms: to_strings(&[
                "icici bank",
                "icici prudential",
                "icici lombard",
                "icici mutual",
                "icici life",
            ]),
            sources: default_sources(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor {
            name: "Moneycontrol".to_string(),
            recency_gated: true,
            date_rules: DateRules {
                alt_meta: vec![],
                text_selectors: to_strings(&["div.article_schedule span"]),
            },
            kind: SourceKind::Paginated {
                sections: to_strings(&[
                    "https://www.moneycontrol.com/news/business/markets/",
                    "https://www.moneycontrol.com/technology/",
                ]),
                page_template: "{section}page-{page}/".to_string(),
                pages: 3,
                link_filter: LinkFilter::Pattern {
                    regex: r"^https://www\.moneycontrol\.com/.+-\d+\.html$".to_string(),
                },
                accumulate: Accumulate::Set,
            },
        },
        SourceDescriptor {
            name: "LiveMint".to_string(),
            recency_gated: false,
            date_rules: DateRules::default(),
            kind: SourceKind::Paginated {
                sections: to_strings(&["https://www.livemint.com/market/stock-market-news"]),
                page_template: "{section}/page-{page}".to_string(),
                pages: 5,
                link_filter: LinkFilter::PathPrefix {
                    base: "https://www.livemint.com".to_string(),
                    prefixes: to_strings(&["/market/stock-market-news/"]),
                },
                accumulate: Accumulate::List,
            },
        },
        SourceDescriptor {
            name: "Economic Times".to_string(),
            recency_gated: false,
            date_rules: DateRules::default(),
            kind: SourceKind::Strict {
                listings: to_strings(&[
                    "https://economictimes.indiatimes.com/markets",
                    "https://economictimes.indiatimes.com/markets/stocks/news",
                ]),
            },
        },
        SourceDescriptor {
            name: "Other".to_string(),
            recency_gated: false,
            date_rules: DateRules::default(),
            kind: SourceKind::Flat {
                listings: to_strings(&[
                    "https://www.ndtvprofit.com/markets",
                    "https://www.businesstoday.in/markets",
                    "https://www.business-standard.com/markets/news",
                    "https://www.etnownews.com/markets",
                    "https://www.cnbctv18.com/market/",
                    "https://www.zeebiz.com/markets",
                    "https://www.financialexpress.com/market/",
                    "https://www.thehindubusinessline.com/markets/",
                    "https://www.goodreturns.in/news/",
                    "https://www.indiainfoline.com/markets/news",
                    "https://www.dsij.in/market-news",
                ]),
                max_links: 700,
            },
        },
    ]
}

impl PipelineConfig {
    /// Load configuration from a YAML file, or fall back to the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the file cannot be read, does not
    /// deserialize, or fails [`PipelineConfig::validate`].
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, PipelineError> {
        let config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(Path::new(p))
                    .map_err(|e| PipelineError::Config(format!("cannot read {p}: {e}")))?;
                let parsed: PipelineConfig = serde_yaml::from_str(&raw)
                    .map_err(|e| PipelineError::Config(format!("invalid config {p}: {e}")))?;
                info!(path = p, sources = parsed.sources.len(), "Loaded pipeline config");
                parsed
            }
            None => PipelineConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that could only fail at crawl time.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.sources.is_empty() {
            return Err(PipelineError::Config("no sources configured".into()));
        }
        for source in &self.sources {
            if let SourceKind::Paginated {
                page_template,
                link_filter,
                ..
            } = &source.kind
            {
                if !page_template.contains("{page}") {
                    return Err(PipelineError::Config(format!(
                        "source {:?}: page_template must contain {{page}}",
                        source.name
                    )));
                }
                if let LinkFilter::Pattern { regex } = link_filter {
                    Regex::new(regex).map_err(|e| {
                        PipelineError::Config(format!("source {:?}: bad link regex: {e}", source.name))
                    })?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_body_length, 80);
        assert_eq!(config.request_delay_ms, 600);
        assert!(config.sources.iter().any(|s| s.recency_gated));
    }

    #[test]
    fn test_yaml_round_trip_of_paginated_source() {
        let yaml = r#"
request_delay_ms: 0
sources:
  - name: LiveMint
    kind:
      type: paginated
      sections: ["https://www.livemint.com/market/stock-market-news"]
      page_template: "{section}/page-{page}"
      pages: 2
      accumulate: list
      link_filter:
        type: path_prefix
        base: "https://www.livemint.com"
        prefixes: ["/market/stock-market-news/"]
"#;
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.request_delay_ms, 0);
        // unspecified fields keep their defaults
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.sources.len(), 1);
        assert!(!config.sources[0].recency_gated);
        match &config.sources[0].kind {
            SourceKind::Paginated {
                pages, accumulate, ..
            } => {
                assert_eq!(*pages, 2);
                assert_eq!(*accumulate, Accumulate::List);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_template_without_page() {
        let mut config = PipelineConfig::default();
        config.sources = vec![SourceDescriptor {
            name: "Broken".into(),
            recency_gated: false,
            date_rules: DateRules::default(),
            kind: SourceKind::Paginated {
                sections: vec!["https://example.com/".into()],
                page_template: "{section}next".into(),
                pages: 2,
                link_filter: LinkFilter::Pattern { regex: ".*".into() },
                accumulate: Accumulate::Set,
            },
        }];
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_regex() {
        let mut config = PipelineConfig::default();
        config.sources = vec![SourceDescriptor {
            name: "Broken".into(),
            recency_gated: false,
            date_rules: DateRules::default(),
            kind: SourceKind::Paginated {
                sections: vec!["https://example.com/".into()],
                page_template: "{section}page-{page}".into(),
                pages: 2,
                link_filter: LinkFilter::Pattern { regex: "(".into() },
                accumulate: Accumulate::Set,
            },
        }];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = PipelineConfig::load(Some("/nonexistent/sources.yaml")).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
