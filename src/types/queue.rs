//! Upstream snapshot types.
//!
//! The status endpoint returns the whole catalog of queues, grouped by city:
//!
//! ```text
//! {"result": {"<group>": [{"id": 24, "name": "...", "active": true,
//!   "enabled": true, "ticket_value": "K123", "tickets_left": 10}, ...]}}
//! ```
//!
//! Only the monitored entry is decoded into a [`Queue`]. Every other entry is
//! kept as raw JSON, so a malformed neighbour cannot make the monitored queue
//! unreadable. Within an entry, missing and `null` fields take their zero
//! value and a negative ticket count reads as zero.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Identifier of a queue within the upstream catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueId(pub i64);

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point-in-time read of a single queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub id: QueueId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// The queue is inside its operating window.
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,

    /// The queue is currently handing out tickets. Only meaningful when active.
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,

    /// The ticket currently being served. May be empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ticket_value: String,

    #[serde(default, deserialize_with = "ticket_count")]
    pub tickets_left: u32,
}

impl Queue {
    /// Returns true if the queue is active and accepting work.
    pub fn is_workable(&self) -> bool {
        self.active && self.enabled
    }
}

/// Top-level upstream response: group key to the raw queue entries in that
/// group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: HashMap<String, Vec<Value>>,
}

impl CatalogResponse {
    /// Looks up a queue by group and id and decodes it.
    ///
    /// `None` if no entry in `group` carries `id`; `Some(Err(_))` if the
    /// matching entry is malformed.
    pub fn find(&self, group: &str, id: QueueId) -> Option<Result<Queue, serde_json::Error>> {
        self.result
            .get(group)?
            .iter()
            .find(|entry| entry.get("id").and_then(Value::as_i64) == Some(id.0))
            .map(Queue::deserialize)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn ticket_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let count = Option::<i64>::deserialize(deserializer)?.unwrap_or(0);
    Ok(u32::try_from(count.max(0)).unwrap_or(u32::MAX))
}
