//! Queue state tracking and change notification.
//!
//! # Module Structure
//!
//! - [`state`]: the four-state machine and its transition function
//! - [`record`]: the persisted record and its legacy-aware decoding
//! - [`messages`]: broadcast text
//! - [`monitor`]: the [`QueueMonitor`] trait and [`DefaultQueueMonitor`]
//! - [`working_hours`]: a decorator that skips checks outside office hours

mod messages;
#[allow(clippy::module_inception)]
mod monitor;
mod record;
mod state;
mod working_hours;

pub use messages::build_status_message;
pub use monitor::{
    CheckOutcome, DefaultQueueMonitor, DeliveryFailurePolicy, MonitorError, QueueMonitor,
    restored_state_name,
};
pub use record::{MonitorState, state_from_persistence, state_to_persistence};
pub use state::{QueueState, StateName, Transition, UnknownStateName};
pub use working_hours::{Clock, SystemClock, WorkingHours, WorkingHoursMonitor};
