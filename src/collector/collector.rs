//! Status collector: one validated snapshot per call.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use super::error::{CollectorError, FetchError};
use super::source::CatalogSource;
use crate::retry::{RetryConfig, RetryResult, retry_with_fixed_delay};
use crate::types::{Queue, QueueId};

/// Default overall timeout for one collection (4 seconds).
const DEFAULT_TIMEOUT_MS: u64 = 4000;

/// Which queue to look for, and how hard to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Group key in the upstream catalog (a city name for DUW).
    pub group: String,

    /// Id of the monitored queue within `group`.
    pub queue_id: QueueId,

    /// Upper bound on the whole collection, retries included.
    pub timeout: Duration,

    /// Attempt budget and inter-attempt delay.
    pub retry: RetryConfig,
}

impl CollectorConfig {
    pub fn new(group: impl Into<String>, queue_id: QueueId) -> Self {
        CollectorConfig {
            group: group.into(),
            queue_id,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retry: RetryConfig::DEFAULT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Fetches the monitored queue's snapshot from a [`CatalogSource`].
///
/// Has no side effects beyond the upstream request, so it is safe to call on
/// every tick.
#[derive(Debug, Clone)]
pub struct StatusCollector<S> {
    source: S,
    config: CollectorConfig,
}

impl<S: CatalogSource> StatusCollector<S> {
    pub fn new(source: S, config: CollectorConfig) -> Self {
        StatusCollector { source, config }
    }

    /// Fetches the catalog and returns the configured queue.
    ///
    /// Failed requests, non-200 responses, undecodable bodies and a malformed
    /// monitored entry are retried with a fixed delay. A decoded catalog
    /// without the queue is returned as [`CollectorError::NotFound`] straight
    /// away.
    pub async fn fetch(&self) -> Result<Queue, CollectorError> {
        let deadline = Instant::now() + self.config.timeout;

        let result = retry_with_fixed_delay(self.config.retry, deadline, || self.attempt()).await;

        match result {
            RetryResult::Success(Some(queue)) => Ok(queue),
            RetryResult::Success(None) => Err(CollectorError::NotFound {
                group: self.config.group.clone(),
                id: self.config.queue_id,
            }),
            RetryResult::ExhaustedRetries {
                last_error,
                attempts,
            } => {
                warn!(attempts, error = %last_error, "Status endpoint retries exhausted");
                Err(CollectorError::Fetch {
                    attempts,
                    source: last_error,
                })
            }
            RetryResult::DeadlineExceeded {
                last_error,
                attempts,
            } => {
                if let Some(e) = &last_error {
                    warn!(attempts, error = %e, "Status collection deadline passed");
                }
                Err(CollectorError::Fetch {
                    attempts,
                    source: FetchError::Timeout(self.config.timeout),
                })
            }
        }
    }

    /// One request. `Ok(None)` means the catalog decoded but lacks the queue.
    async fn attempt(&self) -> Result<Option<Queue>, FetchError> {
        let catalog = self.source.fetch_catalog().await?;

        match catalog.find(&self.config.group, self.config.queue_id) {
            Some(queue) => Ok(Some(queue?)),
            None => {
                debug!(
                    queue_id = %self.config.queue_id,
                    group = %self.config.group,
                    groups = catalog.result.len(),
                    "Queue not found in status response"
                );
                Ok(None)
            }
        }
    }
}
