//! Fixed-delay retry for upstream HTTP calls.
//!
//! Both the status endpoint and the Telegram API are retried the same way:
//! a bounded number of attempts with a constant pause between them, all
//! inside one overall deadline. Retries never span poll ticks; once the
//! budget or the deadline is spent the caller gets the failure for this tick.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Configuration for fixed-delay retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    ///
    /// A value of zero is treated as one.
    pub max_attempts: u32,

    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl RetryConfig {
    /// 3 attempts, 500ms apart.
    pub const DEFAULT: Self = Self {
        max_attempts: 3,
        delay: Duration::from_millis(500),
    };

    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub enum RetryResult<T, E> {
    /// The operation succeeded.
    Success(T),

    /// Every attempt failed.
    ExhaustedRetries {
        /// The error from the final attempt.
        last_error: E,
        /// Number of attempts made.
        attempts: u32,
    },

    /// The overall deadline passed before the operation succeeded.
    DeadlineExceeded {
        /// The error from the most recent completed attempt, if any completed.
        last_error: Option<E>,
        /// Number of attempts started.
        attempts: u32,
    },
}

/// Runs `operation` until it succeeds, the attempt budget is spent, or
/// `deadline` passes.
///
/// Every failure is considered retriable. Callers that can tell a permanent
/// failure apart should inspect the response before returning `Err`.
pub async fn retry_with_fixed_delay<T, E, F, Fut>(
    config: RetryConfig,
    deadline: Instant,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = config.attempt_budget();
    let mut attempt = 0;
    let mut last_error = None;

    loop {
        attempt += 1;

        let outcome = match tokio::time::timeout_at(deadline, operation()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                return RetryResult::DeadlineExceeded {
                    last_error,
                    attempts: attempt,
                };
            }
        };

        match outcome {
            Ok(value) => return RetryResult::Success(value),
            Err(e) => {
                if attempt >= max_attempts {
                    return RetryResult::ExhaustedRetries {
                        last_error: e,
                        attempts: attempt,
                    };
                }

                if Instant::now() + config.delay >= deadline {
                    return RetryResult::DeadlineExceeded {
                        last_error: Some(e),
                        attempts: attempt,
                    };
                }

                last_error = Some(e);
                tokio::time::sleep(config.delay).await;
            }
        }
    }
}
