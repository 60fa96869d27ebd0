//! Monitor state repository.
//!
//! The monitor's state is persisted so a restart does not re-announce a
//! condition subscribers already heard about. Entries carry a TTL: a
//! deployment that stays down longer than that starts over from
//! `Uninitialized` instead of trusting stale data.

use std::time::Duration;

use super::store::{Result, StateStore};
use crate::monitor::MonitorState;

/// Key under which the latest state is stored.
pub const QUEUE_STATE_KEY: &str = "queue-monitor-state:latest";

/// Default time-to-live for the persisted state (60 seconds).
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(60);

/// Loads and saves the [`MonitorState`] under a single fixed key.
#[derive(Debug, Clone)]
pub struct StateRepository<S> {
    store: S,
    ttl: Duration,
}

impl<S: StateStore> StateRepository<S> {
    pub fn new(store: S, ttl: Duration) -> Self {
        StateRepository { store, ttl }
    }

    /// Returns the stored state, or `None` if there is none or it expired.
    pub async fn get(&self) -> Result<Option<MonitorState>> {
        let Some(raw) = self.store.get(QUEUE_STATE_KEY).await? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Stores `state` with the configured TTL.
    pub async fn save(&self, state: &MonitorState) -> Result<()> {
        let raw = serde_json::to_string(state)?;
        self.store.set(QUEUE_STATE_KEY, raw, self.ttl).await
    }
}
