//! HTTP fetching behind a small trait, plus the fixed-delay rate limiter.
//!
//! # Architecture
//!
//! - [`Fetch`]: Core trait every stage fetches markup through
//! - [`HttpFetcher`]: `reqwest`-backed implementation with custom headers and a timeout
//! - [`RateLimiter`]: Fixed post-request pause, no adaptive backoff
//!
//! Failed requests are not retried; callers skip the item.

use crate::error::{PipelineError, StageOutcome};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Anything that can turn a URL into a markup string.
pub trait Fetch {
    /// Download `url` and return its body as text.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Transport`] for connect/DNS/timeout failures
    /// and non-success status codes.
    async fn fetch(&self, url: &str) -> Result<String, PipelineError>;
}

/// `reqwest`-backed fetcher with default headers and a bounded timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client sending `user_agent` and giving up after `timeout`.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Value of the `User-Agent` header on every request
    /// * `timeout` - Whole-request timeout, connect through body
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the user agent is not a valid
    /// header value or the TLS backend cannot be initialised.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, PipelineError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| PipelineError::Config(format!("invalid user agent: {e}")))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(HttpFetcher { client })
    }
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher").finish_non_exhaustive()
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, PipelineError> {
        let t0 = Instant::now();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::transport(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%url, %status, "Non-success status");
            return Err(PipelineError::transport(url, format!("HTTP {status}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| PipelineError::transport(url, e))?;
        debug!(
            %url,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched"
        );
        Ok(body)
    }
}

/// Download one article page as a pipeline stage.
///
/// # Arguments
///
/// * `fetcher` - Any [`Fetch`] implementation
/// * `url` - Absolute article URL
///
/// # Returns
///
/// [`StageOutcome::Ok`] with the page markup, or [`StageOutcome::Failed`]
/// carrying the [`PipelineError::Transport`] fault. Download never degrades.
pub async fn download<F: Fetch>(fetcher: &F, url: &str) -> StageOutcome<String> {
    match fetcher.fetch(url).await {
        Ok(markup) => StageOutcome::Ok(markup),
        Err(e) => StageOutcome::Failed(e),
    }
}

/// Fixed pause applied after every article fetch.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    delay: Duration,
    pauses: u64,
}

impl RateLimiter {
    /// A limiter sleeping `delay` on every [`RateLimiter::pause`]; zero never sleeps.
    pub fn new(delay: Duration) -> Self {
        RateLimiter { delay, pauses: 0 }
    }

    /// Count one pause and sleep for the configured delay.
    pub async fn pause(&mut self) {
        self.pauses += 1;
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }

    /// Number of pauses taken so far in this run.
    pub fn pauses(&self) -> u64 {
        self.pauses
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory [`Fetch`] used by the crawl tests.

    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned pages and records every URL it was asked for.
    #[derive(Debug, Default)]
    pub struct StaticFetcher {
        pages: HashMap<String, String>,
        pub requests: RefCell<Vec<String>>,
    }

    impl StaticFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        pub fn was_requested(&self, url: &str) -> bool {
            self.requests.borrow().iter().any(|u| u == url)
        }
    }

    impl Fetch for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String, PipelineError> {
            self.requests.borrow_mut().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| PipelineError::transport(url, "HTTP 404 Not Found"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StaticFetcher;
    use super::*;
    use crate::error::Status;

    #[test]
    fn test_http_fetcher_rejects_bad_user_agent() {
        let err = HttpFetcher::new("bad\nagent", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[tokio::test]
    async fn test_static_fetcher_serves_and_records() {
        let fetcher = StaticFetcher::new().with_page("https://a.test/", "<p>hi</p>");
        assert_eq!(fetcher.fetch("https://a.test/").await.unwrap(), "<p>hi</p>");
        assert!(fetcher.fetch("https://a.test/missing").await.is_err());
        assert!(fetcher.was_requested("https://a.test/missing"));
    }

    #[tokio::test]
    async fn test_download_stage_outcomes() {
        let fetcher = StaticFetcher::new().with_page("https://a.test/x-1234567.html", "<p>body</p>");

        let ok = download(&fetcher, "https://a.test/x-1234567.html").await;
        assert_eq!(ok.status(), Status::Ok);
        assert_eq!(ok.into_payload().as_deref(), Some("<p>body</p>"));

        let failed = download(&fetcher, "https://a.test/gone-7654321.html").await;
        assert_eq!(failed.status(), Status::Failed);
        match failed {
            StageOutcome::Failed(PipelineError::Transport { url, message }) => {
                assert_eq!(url, "https://a.test/gone-7654321.html");
                assert!(message.contains("404"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limiter_counts_pauses() {
        let mut limiter = RateLimiter::new(Duration::ZERO);
        limiter.pause().await;
        limiter.pause().await;
        assert_eq!(limiter.pauses(), 2);
    }
}
