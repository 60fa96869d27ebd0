//! The queue monitor: one collect-decide-notify step per call.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::record::{MonitorState, state_from_persistence, state_to_persistence};
use super::state::{QueueState, StateName};
use crate::collector::{CatalogSource, CollectorError, StatusCollector};
use crate::notify::{Notifier, NotifyError};
use crate::types::Queue;

/// Errors from a single monitor check.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// No snapshot could be obtained this tick.
    #[error("error getting queue status: {0}")]
    Collect(#[from] CollectorError),

    /// The snapshot was processed but its notification was not delivered.
    #[error("error sending queue notification: {0}")]
    Notify(#[from] NotifyError),
}

impl MonitorError {
    /// Returns true if the next tick could succeed with no change on either
    /// end. A missing queue or a message the API refuses outright is not.
    pub fn is_transient(&self) -> bool {
        match self {
            MonitorError::Collect(e) => e.is_transient(),
            MonitorError::Notify(NotifyError::Rejected { status, .. }) => {
                *status == 429 || *status >= 500
            }
            MonitorError::Notify(_) => true,
        }
    }
}

/// What the monitor does with its state when a notification cannot be
/// delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryFailurePolicy {
    /// Move to the new state anyway and report the failure. The missed
    /// message is not re-sent, but the tracked condition stays accurate.
    #[default]
    CommitTransition,

    /// Stay in the current state so the next tick sees the same change and
    /// tries the notification again.
    RetainCurrent,
}

impl DeliveryFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryFailurePolicy::CommitTransition => "commit",
            DeliveryFailurePolicy::RetainCurrent => "retain",
        }
    }
}

impl fmt::Display for DeliveryFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "commit" => Ok(DeliveryFailurePolicy::CommitTransition),
            "retain" => Ok(DeliveryFailurePolicy::RetainCurrent),
            other => Err(format!("expected \"commit\" or \"retain\", got {:?}", other)),
        }
    }
}

/// Result of a successful check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The check was not run (e.g. outside working hours).
    Skipped,

    /// A snapshot was processed.
    Checked {
        /// State after the check.
        state: QueueState,
        /// Whether a notification was delivered.
        notified: bool,
    },
}

/// A stateful queue monitor driven by the runner.
///
/// Ticks never overlap, so implementations need no internal locking.
pub trait QueueMonitor: Send {
    /// Restores state from a persisted record (`None` when nothing was stored).
    fn init(&mut self, record: Option<&MonitorState>);

    /// Returns the record to persist for the current state.
    fn state(&self) -> MonitorState;

    /// Collects a snapshot, advances the state and notifies if warranted.
    fn check_and_process(
        &mut self,
    ) -> impl Future<Output = Result<CheckOutcome, MonitorError>> + Send;
}

/// The monitor proper: collector, state machine and notifier.
///
/// The broadcast destination is injected at construction and passed to the
/// notifier verbatim.
pub struct DefaultQueueMonitor<S, N> {
    collector: StatusCollector<S>,
    notifier: N,
    destination: String,
    policy: DeliveryFailurePolicy,
    state: QueueState,
    last_queue: Option<Queue>,
}

impl<S: CatalogSource, N: Notifier> DefaultQueueMonitor<S, N> {
    pub fn new(collector: StatusCollector<S>, notifier: N, destination: impl Into<String>) -> Self {
        DefaultQueueMonitor {
            collector,
            notifier,
            destination: destination.into(),
            policy: DeliveryFailurePolicy::default(),
            state: QueueState::Uninitialized,
            last_queue: None,
        }
    }

    pub fn with_policy(mut self, policy: DeliveryFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the current in-memory state.
    pub fn current(&self) -> QueueState {
        self.state
    }

    /// Returns the most recently committed snapshot.
    pub fn last_queue(&self) -> Option<&Queue> {
        self.last_queue.as_ref()
    }

    fn commit(&mut self, next: QueueState, queue: Queue) {
        let previous = self.state.name();
        if next.name() != previous {
            info!(from = %previous, to = %next.name(), "State transition");
        }
        self.state = next;
        self.last_queue = Some(queue);
        debug!(state = %self.state, "Latest state");
    }
}

impl<S: CatalogSource, N: Notifier> QueueMonitor for DefaultQueueMonitor<S, N> {
    fn init(&mut self, record: Option<&MonitorState>) {
        self.state = state_from_persistence(record);
        self.last_queue = None;
        info!(state = %self.state, "Queue monitor initialized");
    }

    fn state(&self) -> MonitorState {
        state_to_persistence(&self.state, self.last_queue.as_ref())
    }

    async fn check_and_process(&mut self) -> Result<CheckOutcome, MonitorError> {
        let queue = self.collector.fetch().await?;
        let transition = self.state.handle(&queue);

        let Some(text) = transition.notification.as_deref() else {
            self.commit(transition.next, queue);
            return Ok(CheckOutcome::Checked {
                state: self.state,
                notified: false,
            });
        };

        if let Err(e) = self.notifier.send_message(&self.destination, text).await {
            match self.policy {
                DeliveryFailurePolicy::CommitTransition => {
                    warn!(
                        to = %transition.next,
                        "Notification failed, committing transition anyway"
                    );
                    self.commit(transition.next, queue);
                }
                DeliveryFailurePolicy::RetainCurrent => {
                    warn!(
                        current = %self.state,
                        to = %transition.next,
                        "Notification failed, keeping current state"
                    );
                }
            }
            return Err(MonitorError::Notify(e));
        }

        info!(destination = %self.destination, "Queue notification sent");
        self.commit(transition.next, queue);
        Ok(CheckOutcome::Checked {
            state: self.state,
            notified: true,
        })
    }
}

impl<S, N> fmt::Debug for DefaultQueueMonitor<S, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultQueueMonitor")
            .field("destination", &self.destination)
            .field("policy", &self.policy)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Returns the name the given record will be restored as.
pub fn restored_state_name(record: Option<&MonitorState>) -> StateName {
    state_from_persistence(record).name()
}
