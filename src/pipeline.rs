//! Run orchestration: sources in order, one article at a time.
//!
//! The [`RunContext`] holds everything scoped to a single run: the entity and
//! its filter vocabulary, the visited-URL set, the rate limiter and the output
//! sink. It is created at run start and passed by `&mut` to each stage.
//!
//! Per-article flow:
//! 1. Skip URLs already visited this run
//! 2. Fetch once, then pause for the fixed request delay
//! 3. Resolve the publish date and apply the recency gate (gated sources only)
//! 4. Extract title/body, degrading to headline-only
//! 5. Relevance gate, key sentences, classification
//! 6. Write one line to the sink

use crate::classify::classify_article;
use crate::config::{PipelineConfig, SourceDescriptor};
use crate::dates::{passes_recency_gate, resolve_publish_date, today_in_reference};
use crate::error::{PipelineError, StageOutcome};
use crate::extract::extract_content;
use crate::fetch::{Fetch, RateLimiter, download};
use crate::models::{CandidateLink, DebugRecord, Entity, ExtractedContent, Record};
use crate::outputs::{OutputFormat, RecordSink};
use crate::relevance::{RelevanceFilter, Verdict};
use crate::scrapers;
use crate::sentences::key_sentences_for;
use crate::utils::{preview, truncate_for_log};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use scraper::Html;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const TEXT_PREVIEW_CHARS: usize = 500;

/// State scoped to one run.
#[derive(Debug)]
pub struct RunContext {
    pub entity: Entity,
    pub filter: RelevanceFilter,
    /// Every URL attempted so far; guarantees at most one record per URL.
    pub visited: HashSet<String>,
    pub limiter: RateLimiter,
    pub sink: RecordSink,
    pub format: OutputFormat,
    pub min_body_length: usize,
    /// "Today" for the recency gate, fixed at run start.
    pub today: NaiveDate,
}

impl RunContext {
    pub fn new(entity: Entity, config: &PipelineConfig, sink: RecordSink, format: OutputFormat) -> Self {
        let filter = RelevanceFilter::new(&entity.aliases, &config.context_keywords, &config.block_terms);
        RunContext {
            entity,
            filter,
            visited: HashSet::new(),
            limiter: RateLimiter::new(Duration::from_millis(config.request_delay_ms)),
            sink,
            format,
            min_body_length: config.min_body_length,
            today: today_in_reference(),
        }
    }
}

/// What happened to one candidate link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Written,
    AlreadyVisited,
    /// Download or extraction stage failed outright.
    Failed,
    Stale,
    Rejected(Verdict),
}

/// Per-source counters reported when the run completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSummary {
    pub name: String,
    pub candidates: usize,
    pub fetched: usize,
    pub accepted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub sources: Vec<SourceSummary>,
}

impl RunSummary {
    pub fn total_accepted(&self) -> usize {
        self.sources.iter().map(|s| s.accepted).sum()
    }
}

/// Recency-gated sources first, then the rest in configured order.
pub fn ordered_sources(sources: &[SourceDescriptor]) -> Vec<&SourceDescriptor> {
    sources
        .iter()
        .filter(|s| s.recency_gated)
        .chain(sources.iter().filter(|s| !s.recency_gated))
        .collect()
}

/// Run every source to exhaustion.
///
/// # Errors
///
/// Only sink write failures escape; every crawl fault becomes a skip.
#[instrument(level = "info", skip_all, fields(entity = %ctx.entity.display_name))]
pub async fn run<F: Fetch>(
    fetcher: &F,
    sources: &[SourceDescriptor],
    ctx: &mut RunContext,
) -> Result<RunSummary, PipelineError> {
    info!(aliases = ?ctx.entity.aliases, today = %ctx.today, "Entity intelligence run starting");
    let mut summary = RunSummary::default();

    for source in ordered_sources(sources) {
        let links = scrapers::index_articles(fetcher, source).await;
        let mut counts = SourceSummary {
            name: source.name.clone(),
            candidates: links.len(),
            ..SourceSummary::default()
        };

        for link in &links {
            let outcome = process_link(fetcher, source, link, ctx).await?;
            match outcome {
                ItemOutcome::Written => {
                    counts.fetched += 1;
                    counts.accepted += 1;
                }
                ItemOutcome::Stale | ItemOutcome::Rejected(_) => {
                    counts.fetched += 1;
                    counts.skipped += 1;
                }
                ItemOutcome::AlreadyVisited | ItemOutcome::Failed => counts.skipped += 1,
            }
        }

        info!(
            source = %counts.name,
            candidates = counts.candidates,
            fetched = counts.fetched,
            accepted = counts.accepted,
            skipped = counts.skipped,
            "Source complete"
        );
        summary.sources.push(counts);
    }

    info!(
        accepted = summary.total_accepted(),
        pauses = ctx.limiter.pauses(),
        "Entity intelligence run complete"
    );
    Ok(summary)
}

/// Everything learned from one downloaded page.
struct PageAnalysis {
    publish_date: Option<DateTime<FixedOffset>>,
    extraction: StageOutcome<ExtractedContent>,
}

fn analyze_page(markup: &str, url: &str, source: &SourceDescriptor, min_body_length: usize) -> PageAnalysis {
    let document = Html::parse_document(markup);
    PageAnalysis {
        publish_date: resolve_publish_date(&document, &source.date_rules),
        extraction: extract_content(&document, url, min_body_length),
    }
}

#[instrument(level = "debug", skip_all, fields(url = %link.url, listing = %link.listing_host))]
async fn process_link<F: Fetch>(
    fetcher: &F,
    source: &SourceDescriptor,
    link: &CandidateLink,
    ctx: &mut RunContext,
) -> Result<ItemOutcome, PipelineError> {
    if !ctx.visited.insert(link.url.clone()) {
        debug!("Already visited this run");
        return Ok(ItemOutcome::AlreadyVisited);
    }

    let fetched = download(fetcher, &link.url).await;
    ctx.limiter.pause().await;
    if let StageOutcome::Failed(e) = &fetched {
        warn!(url = %link.url, error = %e, "Article fetch failed; skipping");
        return Ok(ItemOutcome::Failed);
    }
    let markup = fetched.into_payload().unwrap_or_default();

    let page = analyze_page(&markup, &link.url, source, ctx.min_body_length);
    debug!(
        extraction = ?page.extraction.status(),
        publish_date = ?page.publish_date,
        "Analyzed page"
    );
    if source.recency_gated && !passes_recency_gate(page.publish_date.as_ref(), ctx.today) {
        debug!(publish_date = ?page.publish_date, "Not published today; skipping");
        return Ok(ItemOutcome::Stale);
    }
    let content = match page.extraction {
        StageOutcome::Ok(content) => content,
        StageOutcome::Degraded(content, e) => {
            debug!(error = %e, "Matching on headline only");
            content
        }
        StageOutcome::Failed(e) => {
            warn!(url = %link.url, error = %e, "Extraction failed; skipping");
            return Ok(ItemOutcome::Failed);
        }
    };

    let combined = content.combined_text();
    let verdict = ctx.filter.evaluate(&combined);
    if !verdict.is_accepted() {
        debug!(?verdict, "Not relevant");
        return Ok(ItemOutcome::Rejected(verdict));
    }

    let collected_at = Utc::now();
    match ctx.format {
        OutputFormat::Record => {
            let key_sentences = key_sentences_for(
                &content.title,
                content.body.as_deref(),
                ctx.filter.aliases(),
                ctx.filter.context_keywords(),
            );
            let record = Record {
                entity: ctx.entity.display_name.clone(),
                headline: content.title.clone(),
                publication: source.name.clone(),
                article_type: classify_article(&content.title, content.body.as_deref()),
                content_quality: content.quality(),
                key_sentences,
                url: link.url.clone(),
                collected_at,
            };
            ctx.sink.write(&record).await?;
        }
        OutputFormat::Debug => {
            let record = DebugRecord {
                entity: ctx.entity.display_name.clone(),
                url: link.url.clone(),
                publish_date: page.publish_date,
                collected_at,
                text_preview: preview(combined.trim(), TEXT_PREVIEW_CHARS),
            };
            ctx.sink.write(&record).await?;
        }
    }

    info!(
        publication = %source.name,
        headline = %truncate_for_log(&content.title, 120),
        "Recorded mention"
    );
    Ok(ItemOutcome::Written)
}
