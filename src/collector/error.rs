//! Collector error types.
//!
//! The split matters for retry: a [`FetchError`] describes one failed attempt
//! and is retried, while [`CollectorError::NotFound`] comes from a response
//! that parsed fine and will not change on retry.

use std::time::Duration;

use thiserror::Error;

use crate::types::QueueId;

/// A single failed attempt to fetch the catalog.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or per-request timeout failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with something other than 200 OK.
    #[error("unexpected status code: {0}")]
    Status(u16),

    /// The body was not a valid catalog document, or the monitored entry in
    /// it was malformed.
    #[error("failed to parse response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The overall collection deadline passed.
    #[error("status collection timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors returned by [`StatusCollector::fetch`](super::StatusCollector::fetch).
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The response was valid but did not contain the monitored queue.
    #[error("queue {id} not found in group {group:?}")]
    NotFound { group: String, id: QueueId },

    /// No usable response was obtained within the retry budget.
    #[error("failed to get queue status after {attempts} attempt(s): {source}")]
    Fetch {
        attempts: u32,
        #[source]
        source: FetchError,
    },
}

impl CollectorError {
    /// Returns true if a later tick could plausibly succeed without any
    /// change on the upstream side.
    pub fn is_transient(&self) -> bool {
        matches!(self, CollectorError::Fetch { .. })
    }
}
