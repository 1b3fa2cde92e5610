use reply_harvester_core::{HarvestResult, LocatorError, SessionView, StopReason};

use crate::decode::DecodeError;

/// Failures of a content source. Only navigation failures end a harvest;
/// a failed reveal is logged and treated as an empty load step.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("response too large (max {max_bytes} bytes)")]
    TooLarge { max_bytes: u64 },
    #[error("invalid selector {0:?}")]
    InvalidSelector(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("replay fixture error: {0}")]
    Fixture(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("navigate must be called before loading more content")]
    NotNavigated,
    #[error("browser error: {0}")]
    Browser(String),
}

/// Session-level failures surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("invalid locator: {0}")]
    InvalidLocator(#[from] LocatorError),
    #[error("no posts were harvested for {root_code}")]
    NoDataHarvested { root_code: String },
    #[error("content source failed: {0}")]
    Source(#[from] SourceError),
}

/// Outcome of a harvest that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    /// `None` only when the harvest was cancelled before anything was admitted.
    pub result: Option<HarvestResult>,
    pub stop_reason: StopReason,
    pub iterations: u32,
    /// Unique posts admitted before truncation to the requested total.
    pub admitted: usize,
    pub root_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    /// Emitted after every scan step.
    Iteration(SessionView),
    /// Emitted once when the session reached a terminal phase.
    Finished(SessionView),
}
