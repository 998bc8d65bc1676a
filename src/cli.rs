//! Command-line interface definitions for the entity mention crawler.
//!
//! Only the entity name is required (flag or `ENTITY_NAME`); everything else
//! has a built-in default. Flags given here take precedence over values from
//! `--config`.

use crate::config::{DEFAULT_OUTPUT_FILE, PipelineConfig, SourceKind};
use crate::error::PipelineError;
use crate::outputs::{OutputFormat, SinkMode};
use clap::Parser;

/// Command-line arguments for one monitoring run.
///
/// # Examples
///
/// ```sh
/// # Default run, fresh output file
/// entity_mentions --entity "ICICI Securities"
///
/// # Accumulate across runs and crawl a single source
/// entity_mentions --entity "ICICI Securities" --mode append --only moneycontrol
///
/// # Inspect what the crawler sees
/// ENTITY_NAME="ICICI Securities" entity_mentions --format debug -o debug.jsonl
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Display name of the monitored entity
    #[arg(short, long, env = "ENTITY_NAME")]
    pub entity: String,

    /// NDJSON output file
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: String,

    /// Truncate the output at start, or append to it
    #[arg(long, value_enum, default_value_t = SinkMode::Fresh)]
    pub mode: SinkMode,

    /// Record shape written for each accepted article
    #[arg(long, value_enum, default_value_t = OutputFormat::Record)]
    pub format: OutputFormat,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Pause after every article fetch, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Cap on links collected by flat sources
    #[arg(long)]
    pub max_generic_links: Option<usize>,

    /// Extra block term; may be repeated
    #[arg(long = "block-term")]
    pub block_term: Vec<String>,

    /// Only crawl the named source(s), matched case-insensitively; may be repeated
    #[arg(long)]
    pub only: Vec<String>,
}

impl Cli {
    /// Fold command-line overrides into a loaded config.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when `--only` names no configured
    /// source, or when the result fails validation.
    pub fn apply_overrides(&self, config: &mut PipelineConfig) -> Result<(), PipelineError> {
        if let Some(ms) = self.delay_ms {
            config.request_delay_ms = ms;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(cap) = self.max_generic_links {
            for source in &mut config.sources {
                if let SourceKind::Flat { max_links, .. } = &mut source.kind {
                    *max_links = cap;
                }
            }
        }
        config.block_terms.extend(self.block_term.iter().cloned());

        if !self.only.is_empty() {
            let wanted: Vec<String> = self.only.iter().map(|n| n.to_lowercase()).collect();
            config
                .sources
                .retain(|s| wanted.contains(&s.name.to_lowercase()));
            if config.sources.is_empty() {
                return Err(PipelineError::Config(format!(
                    "--only {} matched no configured source",
                    self.only.join(",")
                )));
            }
        }
        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["entity_mentions", "--entity", "ICICI Securities"]);
        assert_eq!(cli.entity, "ICICI Securities");
        assert_eq!(cli.output, DEFAULT_OUTPUT_FILE);
        assert_eq!(cli.mode, SinkMode::Fresh);
        assert_eq!(cli.format, OutputFormat::Record);
        assert!(cli.only.is_empty());
    }

    #[test]
    fn test_cli_value_enums_and_repeats() {
        let cli = Cli::parse_from([
            "entity_mentions",
            "-e",
            "HDFC Securities",
            "--mode",
            "append",
            "--format",
            "debug",
            "--block-term",
            "hdfc bank",
            "--block-term",
            "hdfc life",
        ]);
        assert_eq!(cli.mode, SinkMode::Append);
        assert_eq!(cli.format, OutputFormat::Debug);
        assert_eq!(cli.block_term, vec!["hdfc bank", "hdfc life"]);
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::parse_from([
            "entity_mentions",
            "--entity",
            "ICICI Securities",
            "--delay-ms",
            "0",
            "--timeout-secs",
            "3",
            "--max-generic-links",
            "25",
            "--block-term",
            "icici direct",
            "--only",
            "OTHER",
        ]);
        let mut config = PipelineConfig::default();
        cli.apply_overrides(&mut config).unwrap();

        assert_eq!(config.request_delay_ms, 0);
        assert_eq!(config.timeout_secs, 3);
        assert!(config.block_terms.iter().any(|b| b == "icici direct"));
        assert_eq!(config.sources.len(), 1);
        match &config.sources[0].kind {
            SourceKind::Flat { max_links, .. } => assert_eq!(*max_links, 25),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_unknown_only_source_is_config_error() {
        let cli = Cli::parse_from(["entity_mentions", "-e", "ICICI Securities", "--only", "nowhere"]);
        let mut config = PipelineConfig::default();
        let err = cli.apply_overrides(&mut config).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
