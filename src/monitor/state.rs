//! Queue state machine.
//!
//! Pure functions deciding, from the previous state and a fresh snapshot,
//! the next state and whether subscribers should hear about it.
//!
//! # Transition table
//!
//! | Current | inactive | active, disabled | enabled, same tickets | enabled, tickets changed |
//! |---|---|---|---|---|
//! | Uninitialized | Inactive | ActiveDisabled, notify | ActiveEnabled, notify | ActiveEnabled, notify |
//! | Inactive | stay | ActiveDisabled, notify | ActiveEnabled, notify | ActiveEnabled, notify |
//! | ActiveDisabled | Inactive | stay | ActiveEnabled, notify | ActiveEnabled, notify |
//! | ActiveEnabled | Inactive | ActiveDisabled, notify | stay | ActiveEnabled, notify |
//!
//! Entering `Inactive` is always silent: it marks the end of office hours and
//! is not worth an alert.

use std::fmt;
use std::str::FromStr;

use super::messages::build_status_message;
use crate::types::Queue;

/// Name of a [`QueueState`] variant, as written to persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateName {
    Uninitialized,
    Inactive,
    ActiveDisabled,
    ActiveEnabled,
}

impl StateName {
    pub const ALL: [StateName; 4] = [
        StateName::Uninitialized,
        StateName::Inactive,
        StateName::ActiveDisabled,
        StateName::ActiveEnabled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateName::Uninitialized => "Uninitialized",
            StateName::Inactive => "Inactive",
            StateName::ActiveDisabled => "ActiveDisabled",
            StateName::ActiveEnabled => "ActiveEnabled",
        }
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a state name that is not one of the four known variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStateName(pub String);

impl fmt::Display for UnknownStateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown state name: {:?}", self.0)
    }
}

impl std::error::Error for UnknownStateName {}

impl FromStr for StateName {
    type Err = UnknownStateName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StateName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownStateName(s.to_string()))
    }
}

/// The externally visible condition of the monitored queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueState {
    /// Nothing has been observed yet.
    #[default]
    Uninitialized,

    /// Outside the operating window.
    Inactive,

    /// Inside the operating window but not handing out tickets.
    ActiveDisabled,

    /// Handing out tickets. Carries the last reported ticket count so a
    /// change in it can be surfaced.
    ActiveEnabled { tickets_left: u32 },
}

/// Outcome of feeding a snapshot to a [`QueueState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The state to move to.
    pub next: QueueState,

    /// The message to broadcast, if this transition warrants one.
    pub notification: Option<String>,
}

impl Transition {
    fn silent(next: QueueState) -> Self {
        Transition {
            next,
            notification: None,
        }
    }

    fn notify(next: QueueState, queue: &Queue) -> Self {
        Transition {
            next,
            notification: Some(build_status_message(queue)),
        }
    }

    /// Returns true if this transition should be broadcast.
    pub fn notifies(&self) -> bool {
        self.notification.is_some()
    }
}

impl QueueState {
    pub fn name(&self) -> StateName {
        match self {
            QueueState::Uninitialized => StateName::Uninitialized,
            QueueState::Inactive => StateName::Inactive,
            QueueState::ActiveDisabled => StateName::ActiveDisabled,
            QueueState::ActiveEnabled { .. } => StateName::ActiveEnabled,
        }
    }

    /// Last known ticket count. Zero for every variant except `ActiveEnabled`.
    pub fn tickets_left(&self) -> u32 {
        match self {
            QueueState::ActiveEnabled { tickets_left } => *tickets_left,
            _ => 0,
        }
    }

    /// Decides the next state for `queue`.
    ///
    /// Total: every snapshot yields exactly one next state. Sending the
    /// notification is left to the caller.
    pub fn handle(&self, queue: &Queue) -> Transition {
        if !queue.active {
            return Transition::silent(QueueState::Inactive);
        }

        if !queue.enabled {
            return match self {
                QueueState::ActiveDisabled => Transition::silent(*self),
                _ => Transition::notify(QueueState::ActiveDisabled, queue),
            };
        }

        let enabled = QueueState::ActiveEnabled {
            tickets_left: queue.tickets_left,
        };
        match self {
            QueueState::ActiveEnabled { tickets_left } if *tickets_left == queue.tickets_left => {
                Transition::silent(*self)
            }
            _ => Transition::notify(enabled, queue),
        }
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueState::ActiveEnabled { tickets_left } => {
                write!(f, "ActiveEnabled({})", tickets_left)
            }
            other => f.write_str(other.name().as_str()),
        }
    }
}
