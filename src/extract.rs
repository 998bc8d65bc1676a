//! Article title/body extraction with graceful degradation.
//!
//! A downloaded page is run through three strategies; each later
//! step only runs while the body found so far is shorter than the configured
//! minimum:
//!
//! 1. **Article container**: paragraphs inside the main article element
//! 2. **All paragraphs**: every `<p>` on the page, space-joined
//! 3. **JSON-LD**: the first object exposing a non-empty `articleBody`
//!
//! When all three miss, the page degrades to a headline-only result instead
//! of being dropped.

use crate::dates::ld_nodes;
use crate::error::{PipelineError, StageOutcome};
use crate::models::ExtractedContent;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

/// Main-content containers, most specific first.
const ARTICLE_CONTAINERS: &[&str] = &[
    r#"[itemprop="articleBody"]"#,
    "article",
    "div.article-content",
    "div.article_content",
    "div.story-content",
    "div.storyDetails",
    "div.content_wrapper",
    "div.artText",
    "#article-body",
    "main",
];

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("valid selector"));
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("valid selector"));
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("valid selector"));
static LD_JSON: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector"));
static CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ARTICLE_CONTAINERS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .collect()
});

/// Run the extraction fallback chain over an already-parsed page.
///
/// Returns `Ok` with a body, or `Degraded` carrying the best-known title and
/// no body.
pub fn extract_content(document: &Html, url: &str, min_body_length: usize) -> StageOutcome<ExtractedContent> {
    let title = best_title(document);

    let steps: [(&str, fn(&Html) -> Option<String>); 2] =
        [("article_container", container_body), ("all_paragraphs", all_paragraphs)];
    for (step, run) in steps {
        match run(document) {
            Some(body) if char_len(&body) >= min_body_length => {
                debug!(%url, step, chars = char_len(&body), "Extracted body");
                return StageOutcome::Ok(ExtractedContent {
                    title,
                    body: Some(body),
                });
            }
            other => {
                debug!(%url, step, chars = other.as_deref().map(char_len).unwrap_or(0), "Body too short; falling back");
            }
        }
    }

    if let Some(body) = json_ld_body(document) {
        debug!(%url, step = "json_ld", chars = char_len(&body), "Extracted body");
        return StageOutcome::Ok(ExtractedContent {
            title,
            body: Some(body),
        });
    }

    StageOutcome::Degraded(
        ExtractedContent { title, body: None },
        PipelineError::ExtractionFailure(url.to_string()),
    )
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Element text with whitespace collapsed, like `get_text(" ", strip=True)`.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn best_title(document: &Html) -> String {
    let og = document
        .select(&OG_TITLE)
        .filter_map(|el| el.value().attr("content"))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|t| !t.is_empty());
    og.or_else(|| {
        document
            .select(&H1)
            .map(element_text)
            .find(|t| !t.is_empty())
    })
    .or_else(|| {
        document
            .select(&TITLE)
            .map(element_text)
            .find(|t| !t.is_empty())
    })
    .unwrap_or_default()
}

fn join_paragraphs<'a>(paragraphs: impl Iterator<Item = ElementRef<'a>>) -> String {
    paragraphs
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn container_body(document: &Html) -> Option<String> {
    CONTAINERS.iter().find_map(|selector| {
        let container = document.select(selector).next()?;
        let body = join_paragraphs(container.select(&PARAGRAPH));
        let body = if body.is_empty() { element_text(container) } else { body };
        (!body.is_empty()).then_some(body)
    })
}

fn all_paragraphs(document: &Html) -> Option<String> {
    let body = join_paragraphs(document.select(&PARAGRAPH));
    (!body.is_empty()).then_some(body)
}

fn json_ld_body(document: &Html) -> Option<String> {
    for script in document.select(&LD_JSON) {
        let text = script.text().collect::<String>();
        let value: Value = match serde_json::from_str(text.trim()) {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %PipelineError::Parse(e.to_string()), "Skipping JSON-LD block");
                continue;
            }
        };
        let body = ld_nodes(&value).into_iter().find_map(|node| {
            node.get("articleBody")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string)
        });
        if body.is_some() {
            return body;
        }
    }
    None
}
