//! HTTP catalog client.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use slice_catalog::facets::{FacetVocabulary, VocabularyPayload};
use slice_catalog::ids::CityId;
use slice_catalog::listing::Listing;
use slice_catalog::search::SearchCriteria;

use crate::backend::CatalogBackend;
use crate::timeout::TimeoutConfig;

/// Error type for fetch operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Unknown city: {0}")]
    UnknownCity(String),
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error, limit: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(limit)
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_decode() {
            FetchError::Deserialization(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Search response body.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    listings: Vec<Listing>,
}

/// Catalog backend speaking JSON over HTTP.
///
/// - `GET {base}/cities/{city}/facets` returns the vocabulary payload
/// - `POST {base}/search` takes the criteria and returns `{"listings": [...]}`
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    timeouts: TimeoutConfig,
}

impl HttpBackend {
    /// Create a client for a base URL.
    pub fn new(base_url: impl Into<String>, timeouts: TimeoutConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.total)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeouts,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, FetchError> {
        let limit = self.timeouts.total;
        let resp = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, limit))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(e, limit))?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Deserialization(e.to_string()))
    }
}

#[async_trait]
impl CatalogBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_facet_vocabulary(&self, city: &CityId) -> Result<FacetVocabulary, FetchError> {
        let url = self.url(&format!("cities/{}/facets", city.as_str()));
        tracing::debug!(url = %url, "fetching facet vocabulary");

        let payload: VocabularyPayload = self.read_json(&url, self.client.get(&url)).await?;
        Ok(payload.into_vocabulary(city.clone()))
    }

    async fn search_products(&self, criteria: &SearchCriteria) -> Result<Vec<Listing>, FetchError> {
        let url = self.url("search");
        tracing::debug!(url = %url, city = %criteria.city, sort = %criteria.sort, "searching");

        let response: SearchResponse = self
            .read_json(&url, self.client.post(&url).json(criteria))
            .await?;
        Ok(response.listings)
    }
}
