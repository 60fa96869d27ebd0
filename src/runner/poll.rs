//! Poll loop configuration.
//!
//! # Persistence Strategy
//!
//! By default the state is written once, at shutdown. A crash therefore loses
//! whatever changed since the last clean stop, and the next start may repeat
//! a notification. Setting `persist_every_tick` trades extra writes for
//! tighter at-most-once behaviour.

use std::time::Duration;

/// Default interval between status checks (10 seconds).
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 10;

/// Default bound on a single state load or save (5 seconds).
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;

/// Shortest interval the loop will run at.
const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Interval between status checks.
    ///
    /// Default: 10 seconds. Configure via `STATUS_CHECK_INTERVAL_SECONDS`.
    pub interval: Duration,

    /// Save the state after every completed check, not only at shutdown.
    ///
    /// Default: false. Configure via `STATE_PERSIST_EVERY_TICK`.
    pub persist_every_tick: bool,

    /// Bound on each state load or save.
    ///
    /// The shutdown save runs after cancellation, so this is what keeps a
    /// hung store from blocking process exit. Default: 5 seconds.
    pub store_timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PollConfig {
    /// Creates a `PollConfig` with default values.
    pub fn new() -> Self {
        PollConfig {
            interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            persist_every_tick: false,
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_persist_every_tick(mut self, persist_every_tick: bool) -> Self {
        self.persist_every_tick = persist_every_tick;
        self
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// The interval actually used by the loop.
    ///
    /// `tokio::time::interval` rejects a zero period.
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_CHECK_INTERVAL)
    }
}
