//! The poll loop.
//!
//! A single task owns the monitor and drives it on a fixed interval. Ticks
//! never overlap, so neither the monitor nor its state needs locking. The
//! owner stops the loop through a `CancellationToken` and learns that the
//! final state was persisted when the task completes.
//!
//! # Module Structure
//!
//! - [`poll`]: interval and persistence settings
//! - [`runner`]: the loop itself

mod poll;
#[allow(clippy::module_inception)]
mod runner;


pub use poll::PollConfig;
pub use runner::Runner;
