//! Persisted monitor state.
//!
//! The record carries two encodings of the same fact. `state_name` is
//! authoritative. `queue_active`/`queue_enabled` are the older boolean
//! encoding: still written so that an older deployment reading the record
//! keeps working, and still read when `state_name` is absent.
//!
//! ```json
//! {"state_name": "ActiveEnabled", "queue_active": true, "queue_enabled": true,
//!  "last_ticket_processed": "K123", "tickets_left": 10}
//! ```
//!
//! Both directions of the mapping live in this module so the transition
//! logic only ever sees a [`QueueState`].

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::state::{QueueState, StateName};
use crate::types::Queue;

/// The monitor's persisted representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    /// Name of the [`QueueState`] variant. Absent in records written before
    /// state names existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,

    #[serde(default)]
    pub queue_active: bool,

    #[serde(default)]
    pub queue_enabled: bool,

    #[serde(default)]
    pub last_ticket_processed: String,

    #[serde(default)]
    pub tickets_left: u32,
}

impl MonitorState {
    /// Returns the recognised state name, if the record carries one.
    pub fn state_name(&self) -> Option<StateName> {
        let raw = self.state_name.as_deref().filter(|s| !s.is_empty())?;
        match raw.parse() {
            Ok(name) => Some(name),
            Err(e) => {
                warn!(error = %e, "Ignoring unrecognised persisted state name");
                None
            }
        }
    }
}

/// Reconstructs a [`QueueState`] from a persisted record.
///
/// A recognised `state_name` wins. Otherwise the state is derived from the
/// boolean flags: inactive, active-but-disabled, or enabled with the stored
/// ticket count. No record at all means nothing was observed yet.
pub fn state_from_persistence(record: Option<&MonitorState>) -> QueueState {
    let Some(record) = record else {
        return QueueState::Uninitialized;
    };

    match record.state_name() {
        Some(StateName::Uninitialized) => QueueState::Uninitialized,
        Some(StateName::Inactive) => QueueState::Inactive,
        Some(StateName::ActiveDisabled) => QueueState::ActiveDisabled,
        Some(StateName::ActiveEnabled) => QueueState::ActiveEnabled {
            tickets_left: record.tickets_left,
        },
        None => match (record.queue_active, record.queue_enabled) {
            (false, _) => QueueState::Inactive,
            (true, false) => QueueState::ActiveDisabled,
            (true, true) => QueueState::ActiveEnabled {
                tickets_left: record.tickets_left,
            },
        },
    }
}

/// Builds the persisted record for `state`.
///
/// When the latest snapshot is known its ticket fields take precedence over
/// the ones derived from the state.
pub fn state_to_persistence(state: &QueueState, latest: Option<&Queue>) -> MonitorState {
    let (queue_active, queue_enabled) = match state {
        QueueState::Uninitialized | QueueState::Inactive => (false, false),
        QueueState::ActiveDisabled => (true, false),
        QueueState::ActiveEnabled { .. } => (true, true),
    };

    let mut record = MonitorState {
        state_name: Some(state.name().as_str().to_string()),
        queue_active,
        queue_enabled,
        last_ticket_processed: String::new(),
        tickets_left: state.tickets_left(),
    };

    if let Some(queue) = latest {
        record.last_ticket_processed = queue.ticket_value.clone();
        record.tickets_left = queue.tickets_left;
    }

    record
}
