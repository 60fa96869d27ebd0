//! Catalog sources.
//!
//! [`CatalogSource`] is one attempt at reading the upstream catalog. Retry and
//! timeouts live in the collector, so a source only has to report what a
//! single request produced.

use std::future::Future;

use reqwest::StatusCode;

use super::error::FetchError;
use crate::types::CatalogResponse;

/// Performs a single fetch of the upstream catalog.
pub trait CatalogSource: Send + Sync {
    /// Fetch and decode the catalog once.
    fn fetch_catalog(&self) -> impl Future<Output = Result<CatalogResponse, FetchError>> + Send;
}

/// Reads the catalog from an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCatalogSource {
    /// Creates a source for `url`.
    ///
    /// Per-request timeouts are taken from the client's configuration.
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl CatalogSource for HttpCatalogSource {
    async fn fetch_catalog(&self) -> Result<CatalogResponse, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        // Decode from bytes so a malformed body is reported as a decode
        // failure rather than a transport failure.
        let body = response.bytes().await?;
        let catalog = serde_json::from_slice(&body)?;
        Ok(catalog)
    }
}
