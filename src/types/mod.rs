//! Core domain types for the queue monitor.

pub mod queue;

pub use queue::{CatalogResponse, Queue, QueueId};
