//! Error taxonomy and per-stage outcomes.
//!
//! Nothing in the crawl path is fatal: transport and parse faults are turned
//! into skips at the smallest enclosing scope. Only a [`PipelineError::Config`]
//! or [`PipelineError::Io`] raised while opening the output sink aborts a run.

use thiserror::Error;

/// Every failure the pipeline knows how to name.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Connect, DNS, TLS, timeout or non-success HTTP status.
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// Malformed markup, selector or structured-data JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// No body survived the extraction fallback chain.
    #[error("no article body extracted from {0}")]
    ExtractionFailure(String),

    /// A date field was present but could not be parsed.
    #[error("unparseable date value: {0:?}")]
    DateAmbiguous(String),

    /// A strict listing produced a candidate on another host.
    #[error("candidate host {candidate:?} differs from listing host {listing:?}")]
    DomainMismatch { listing: String, candidate: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn transport(url: &str, err: impl std::fmt::Display) -> Self {
        PipelineError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// Status tag carried by every [`StageOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Degraded,
    Failed,
}

/// Result of one pipeline stage.
///
/// `Degraded` still carries a usable payload (e.g. a headline with no body),
/// so callers branch on [`StageOutcome::status`] rather than on `Option`s.
#[derive(Debug)]
pub enum StageOutcome<T> {
    Ok(T),
    Degraded(T, PipelineError),
    Failed(PipelineError),
}

impl<T> StageOutcome<T> {
    pub fn status(&self) -> Status {
        match self {
            StageOutcome::Ok(_) => Status::Ok,
            StageOutcome::Degraded(..) => Status::Degraded,
            StageOutcome::Failed(_) => Status::Failed,
        }
    }

    /// The payload, if the stage produced one.
    pub fn into_payload(self) -> Option<T> {
        match self {
            StageOutcome::Ok(v) | StageOutcome::Degraded(v, _) => Some(v),
            StageOutcome::Failed(_) => None,
        }
    }
}
