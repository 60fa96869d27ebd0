//! Persistence layer for the queue monitor.
//!
//! The monitor's state survives restarts through a TTL-backed key-value
//! store, so the same condition is not announced twice.
//!
//! # Architecture
//!
//! - [`store`]: the [`StateStore`] trait (string values, per-entry TTL)
//! - [`file`]: one JSON file per key, written atomically
//! - [`memory`]: an in-process store
//! - [`repository`]: [`StateRepository`], the JSON record under a fixed key
//!
//! # Failure Semantics
//!
//! A missing or expired key is not an error. IO and JSON failures are
//! returned to the caller, which decides whether they are fatal (the runner
//! never treats them as such).

pub mod file;
pub mod memory;
pub mod repository;
pub mod store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use repository::{DEFAULT_STATE_TTL, QUEUE_STATE_KEY, StateRepository};
pub use store::{StateStore, StoreError};
