//! TTL key-value store abstraction.

use std::future::Future;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors from a [`StateStore`] or the repository built on it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error while reading or writing the backing storage.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A string key-value store whose entries expire.
///
/// A missing or expired key is `Ok(None)`, never an error.
pub trait StateStore: Send + Sync {
    /// Reads the value under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// The entry expires after `ttl`. A zero `ttl` means the entry never
    /// expires.
    fn set(&self, key: &str, value: String, ttl: Duration)
    -> impl Future<Output = Result<()>> + Send;
}
