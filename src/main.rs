//! # Entity Mentions
//!
//! Crawls financial news listings for mentions of one entity (a brokerage,
//! by default) and records each relevant article as a classified,
//! evidence-backed NDJSON line.
//!
//! ## Usage
//!
//! ```sh
//! entity_mentions --entity "ICICI Securities"
//! entity_mentions --entity "ICICI Securities" --mode append --format debug
//! ```
//!
//! ## Architecture
//!
//! A single sequential pipeline:
//! 1. **Indexing**: Discover candidate article URLs per source (flat, paginated or strict-domain)
//! 2. **Fetching**: Download each article once, pausing a fixed delay after every request
//! 3. **Extraction**: Resolve the publish date and title/body, degrading to headline-only
//! 4. **Relevance**: Block-term veto, alias mention and context keyword checks
//! 5. **Output**: Key sentences, article type, and one flushed NDJSON line per hit

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aliases;
mod classify;
mod cli;
mod config;
mod dates;
mod error;
mod extract;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod relevance;
mod scrapers;
mod sentences;
mod url_filter;
mod utils;

use cli::Cli;
use config::PipelineConfig;
use fetch::HttpFetcher;
use models::Entity;
use outputs::RecordSink;
use pipeline::RunContext;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("entity_mentions starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = PipelineConfig::load(args.config.as_deref()).inspect_err(|e| {
        error!(error = %e, "Failed to load config");
    })?;
    args.apply_overrides(&mut config).inspect_err(|e| {
        error!(error = %e, "Invalid command-line overrides");
    })?;

    let entity = Entity::new(&args.entity).inspect_err(|e| {
        error!(error = %e, "Cannot monitor an empty entity name");
    })?;
    let fetcher = HttpFetcher::new(&config.user_agent, Duration::from_secs(config.timeout_secs))?;

    // Fatal before any crawling: an unwritable destination would lose every hit
    let sink = RecordSink::open(&args.output, args.mode).await?;

    let mut ctx = RunContext::new(entity, &config, sink, args.format);
    let summary = pipeline::run(&fetcher, &config.sources, &mut ctx).await.inspect_err(|e| {
        error!(path = %ctx.sink.path().display(), error = %e, "Output write failed; aborting run");
    })?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        records = summary.total_accepted(),
        lines_written = ctx.sink.written(),
        output = %ctx.sink.path().display(),
        "Execution complete"
    );

    Ok(())
}
