//! Queue status collection from the upstream status endpoint.
//!
//! The collector turns a noisy, retryable HTTP fetch into one validated
//! [`Queue`](crate::types::Queue) snapshot per tick.
//!
//! - [`source`]: the [`CatalogSource`] seam and its reqwest implementation
//! - [`collector`]: retry, overall timeout and queue lookup
//! - [`error`]: fetch vs. not-found failures

#[allow(clippy::module_inception)]
mod collector;
mod error;
mod source;

pub use collector::{CollectorConfig, StatusCollector};
pub use error::{CollectorError, FetchError};
pub use source::{CatalogSource, HttpCatalogSource};
