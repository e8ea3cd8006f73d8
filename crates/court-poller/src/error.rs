//! Error types for the polling cycle.
//!
//! Failures of a single (tenant, date) request are `FetchError`s and stay
//! local to that pair. Anything that aborts a whole cycle is a `CycleError`,
//! which the scheduler logs before waiting out the retry delay.

use thiserror::Error;

/// Why a single availability request produced no data
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure, including timeouts
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

/// A failure that aborts the current cycle
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("malformed start time {start_time:?} on resource {resource_id}")]
    MalformedStartTime {
        resource_id: String,
        start_time: String,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Request(e) if e.is_timeout())
    }
}
