//! Publish-date resolution and the recency gate.
//!
//! Dates are looked up in this order, first parseable value wins:
//! 1. JSON-LD `datePublished` (top level, array member or `@graph` member)
//! 2. `<meta property="article:published_time">`
//! 3. Alternate meta tags (generic names plus per-source [`DateRules::alt_meta`])
//! 4. Per-source text selectors ([`DateRules::text_selectors`])
//! 5. `<time datetime>` / `<time>` text anywhere on the page
//!
//! Every result is normalised to the reference timezone (IST, UTC+05:30).

use crate::config::DateRules;
use crate::error::PipelineError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

const GENERIC_DATE_META: &[&str] = &["publish-date", "pubdate", "publish_date", "date"];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%B %d, %Y %H:%M",
    "%B %d, %Y %I:%M %p",
    "%b %d, %Y %I:%M %p",
    "%d %B %Y %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];

static LD_JSON: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector"));
static OG_PUBLISHED: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[property="article:published_time"]"#).expect("valid selector")
});
static ITEMPROP_PUBLISHED: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[itemprop="datePublished"]"#).expect("valid selector"));
static TIME_ELEMENT: Lazy<Selector> = Lazy::new(|| Selector::parse("time").expect("valid selector"));

static TZ_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(ist|gmt|utc)$").expect("valid tz regex"));
static LABEL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(first\s+)?(published|updated|last updated)\s*(on)?\s*:?\s*").expect("valid label regex")
});

/// The fixed timezone all publish dates are normalised to.
pub fn reference_tz() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Today's calendar date in the reference timezone.
pub fn today_in_reference() -> NaiveDate {
    Utc::now().with_timezone(&reference_tz()).date_naive()
}

/// Parse a date string found in markup.
///
/// Offset-bearing values keep their instant; naive values are read as
/// reference-timezone wall time. Returns [`PipelineError::DateAmbiguous`] when
/// nothing matches.
pub fn parse_date(raw: &str) -> Result<DateTime<FixedOffset>, PipelineError> {
    let tz = reference_tz();
    let cleaned = clean_date_text(raw);
    if cleaned.is_empty() {
        return Err(PipelineError::DateAmbiguous(raw.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&cleaned) {
        return Ok(dt.with_timezone(&tz));
    }
    if let Ok(dt) = DateTime::parse_from_str(&cleaned, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.with_timezone(&tz));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&cleaned) {
        return Ok(dt.with_timezone(&tz));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&cleaned, fmt) {
            if let Some(dt) = tz.from_local_datetime(&naive).single() {
                return Ok(dt);
            }
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, fmt) {
            if let Some(dt) = date
                .and_hms_opt(0, 0, 0)
                .and_then(|naive| tz.from_local_datetime(&naive).single())
            {
                return Ok(dt);
            }
        }
    }
    Err(PipelineError::DateAmbiguous(raw.to_string()))
}

/// Strip labels, separators and trailing zone words ("October 18, 2026 / 10:23 IST").
fn clean_date_text(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let unlabeled = LABEL_PREFIX.replace(&collapsed, "");
    let without_tz = TZ_SUFFIX.replace(&unlabeled, "");
    without_tz.replace(" / ", " ").replace(" | ", " ").trim().to_string()
}

/// Resolve the publish date of a parsed page, or `None` if no source parses.
pub fn resolve_publish_date(document: &Html, rules: &DateRules) -> Option<DateTime<FixedOffset>> {
    json_ld_date(document)
        .or_else(|| meta_content(document, &OG_PUBLISHED))
        .or_else(|| alternate_meta_date(document, rules))
        .or_else(|| text_selector_date(document, rules))
        .or_else(|| time_element_date(document))
}

fn accept(candidate: &str, origin: &str) -> Option<DateTime<FixedOffset>> {
    match parse_date(candidate) {
        Ok(dt) => Some(dt),
        Err(e) => {
            debug!(origin, error = %e, "Skipping unparseable date");
            None
        }
    }
}

fn json_ld_date(document: &Html) -> Option<DateTime<FixedOffset>> {
    for script in document.select(&LD_JSON) {
        let text = script.text().collect::<String>();
        let value: Value = match serde_json::from_str(text.trim()) {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "Malformed JSON-LD block");
                continue;
            }
        };
        for node in ld_nodes(&value) {
            if let Some(raw) = node.get("datePublished").and_then(Value::as_str) {
                if let Some(dt) = accept(raw, "json-ld") {
                    return Some(dt);
                }
            }
        }
    }
    None
}

/// The object itself, members of a top-level array, and members of `@graph`.
pub(crate) fn ld_nodes(value: &Value) -> Vec<&Value> {
    let mut nodes = Vec::new();
    let roots: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    for root in roots {
        if root.is_object() {
            nodes.push(root);
        }
        if let Some(graph) = root.get("@graph").and_then(Value::as_array) {
            nodes.extend(graph.iter().filter(|n| n.is_object()));
        }
    }
    nodes
}

fn meta_content(document: &Html, selector: &Selector) -> Option<DateTime<FixedOffset>> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr("content"))
        .find_map(|raw| accept(raw, "meta"))
}

fn alternate_meta_date(document: &Html, rules: &DateRules) -> Option<DateTime<FixedOffset>> {
    let names = rules
        .alt_meta
        .iter()
        .map(String::as_str)
        .chain(GENERIC_DATE_META.iter().copied());
    for name in names {
        let selector = match Selector::parse(&format!(r#"meta[name="{name}"], meta[property="{name}"]"#)) {
            Ok(s) => s,
            Err(e) => {
                debug!(name, error = %e, "Invalid meta selector");
                continue;
            }
        };
        if let Some(dt) = meta_content(document, &selector) {
            return Some(dt);
        }
    }
    meta_content(document, &ITEMPROP_PUBLISHED)
}

fn time_element_date(document: &Html) -> Option<DateTime<FixedOffset>> {
    document.select(&TIME_ELEMENT).find_map(|el| {
        el.value()
            .attr("datetime")
            .and_then(|raw| accept(raw, "time[datetime]"))
            .or_else(|| accept(&el.text().collect::<String>(), "time text"))
    })
}

fn text_selector_date(document: &Html, rules: &DateRules) -> Option<DateTime<FixedOffset>> {
    for css in &rules.text_selectors {
        let selector = match Selector::parse(css) {
            Ok(s) => s,
            Err(e) => {
                debug!(selector = %css, error = %e, "Invalid date selector");
                continue;
            }
        };
        if let Some(dt) = document
            .select(&selector)
            .find_map(|el| accept(&el.text().collect::<String>(), "text selector"))
        {
            return Some(dt);
        }
    }
    None
}

/// Recency gate: a missing date passes, a resolved date must fall on `today`.
pub fn passes_recency_gate(date: Option<&DateTime<FixedOffset>>, today: NaiveDate) -> bool {
    match date {
        Some(dt) => dt.with_timezone(&reference_tz()).date_naive() == today,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_rfc3339_converted_to_ist() {
        let dt = parse_date("2026-10-17T20:00:00Z").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), IST_OFFSET_SECS);
        assert_eq!(dt.date_naive(), ymd(2026, 10, 18));
    }

    #[test]
    fn test_parse_moneycontrol_schedule_text() {
        let dt = parse_date("October 18, 2026 / 10:23 IST").unwrap();
        assert_eq!(dt.date_naive(), ymd(2026, 10, 18));
        assert_eq!(dt.format("%H:%M").to_string(), "10:23");
    }

    #[test]
    fn test_parse_plain_and_labelled_dates() {
        assert_eq!(parse_date("October 18, 2026").unwrap().date_naive(), ymd(2026, 10, 18));
        assert_eq!(
            parse_date("Updated: Oct 17, 2026 09:15 PM IST").unwrap().date_naive(),
            ymd(2026, 10, 17)
        );
        assert_eq!(parse_date("2026-10-18").unwrap().date_naive(), ymd(2026, 10, 18));
    }

    #[test]
    fn test_parse_garbage_is_ambiguous() {
        assert!(matches!(parse_date("yesterday-ish"), Err(PipelineError::DateAmbiguous(_))));
        assert!(matches!(parse_date("   "), Err(PipelineError::DateAmbiguous(_))));
    }

    #[test]
    fn test_json_ld_wins_over_meta() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"NewsArticle","datePublished":"2026-10-18T09:00:00+05:30"}</script>
            <meta property="article:published_time" content="2026-01-01T00:00:00Z">
        </head><body></body></html>"#;
        let dt = resolve_publish_date(&doc(html), &DateRules::default()).unwrap();
        assert_eq!(dt.date_naive(), ymd(2026, 10, 18));
    }

    #[test]
    fn test_json_ld_graph_member() {
        let html = r#"<script type="application/ld+json">
            {"@context":"https://schema.org","@graph":[{"@type":"WebPage"},{"@type":"NewsArticle","datePublished":"2026-10-16"}]}
        </script>"#;
        let dt = resolve_publish_date(&doc(html), &DateRules::default()).unwrap();
        assert_eq!(dt.date_naive(), ymd(2026, 10, 16));
    }

    #[test]
    fn test_malformed_json_ld_falls_through_to_meta() {
        let html = r#"<head>
            <script type="application/ld+json">{ not json </script>
            <meta property="article:published_time" content="2026-10-15T12:00:00+05:30">
        </head>"#;
        let dt = resolve_publish_date(&doc(html), &DateRules::default()).unwrap();
        assert_eq!(dt.date_naive(), ymd(2026, 10, 15));
    }

    #[test]
    fn test_unparseable_meta_falls_through_to_time_element() {
        let html = r#"<head><meta property="article:published_time" content="garbage"></head>
            <body><time datetime="2026-10-14T08:00:00Z">Oct 14</time></body>"#;
        let dt = resolve_publish_date(&doc(html), &DateRules::default()).unwrap();
        assert_eq!(dt.date_naive(), ymd(2026, 10, 14));
    }

    #[test]
    fn test_site_specific_meta_and_text_selector() {
        let rules = DateRules {
            alt_meta: vec!["sailthru.date".to_string()],
            text_selectors: vec!["div.article_schedule span".to_string()],
        };
        let meta_html = r#"<meta name="sailthru.date" content="2026-10-13 10:00:00">"#;
        assert_eq!(
            resolve_publish_date(&doc(meta_html), &rules).unwrap().date_naive(),
            ymd(2026, 10, 13)
        );

        let text_html = r#"<div class="article_schedule"><span>October 12, 2026</span> / 10:23 IST</div>"#;
        assert_eq!(
            resolve_publish_date(&doc(text_html), &rules).unwrap().date_naive(),
            ymd(2026, 10, 12)
        );
    }

    #[test]
    fn test_text_selector_beats_sidebar_time_element() {
        let rules = DateRules {
            alt_meta: vec![],
            text_selectors: vec!["div.article_schedule span".to_string()],
        };
        let html = r#"<body>
            <div class="article_schedule"><span>October 18, 2026</span> / 10:23 IST</div>
            <aside><h3>Related</h3><time datetime="2026-10-17T08:00:00+05:30">Yesterday</time></aside>
            </body>"#;
        let dt = resolve_publish_date(&doc(html), &rules).unwrap();
        assert_eq!(dt.date_naive(), ymd(2026, 10, 18));
        assert!(passes_recency_gate(Some(&dt), ymd(2026, 10, 18)));
    }

    #[test]
    fn test_no_date_anywhere() {
        let html = "<html><body><p>No metadata here.</p></body></html>";
        assert!(resolve_publish_date(&doc(html), &DateRules::default()).is_none());
    }

    #[test]
    fn test_recency_gate() {
        let today = ymd(2026, 10, 18);
        let fresh = parse_date("2026-10-18T01:00:00+05:30").unwrap();
        let stale = parse_date("2026-10-17T23:59:00+05:30").unwrap();
        // 20:00 UTC on the 17th is already the 18th in IST
        let late_utc = parse_date("2026-10-17T20:00:00Z").unwrap();

        assert!(passes_recency_gate(Some(&fresh), today));
        assert!(!passes_recency_gate(Some(&stale), today));
        assert!(passes_recency_gate(Some(&late_utc), today));
        assert!(passes_recency_gate(None, today));
    }
}
