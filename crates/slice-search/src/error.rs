//! Search error types.

use slice_catalog::CatalogError;
use slice_data::FetchError;
use thiserror::Error;

/// Errors surfaced by a search session.
///
/// A response for a superseded query is not an error; it is reported as
/// [`crate::PublishOutcome::StaleDiscard`] and never reaches the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// No city is pinned; nothing was dispatched.
    #[error("Missing search context: no city selected")]
    MissingContext,

    /// The facet vocabulary could not be fetched; filters are disabled.
    #[error("Facet vocabulary unavailable: {0}")]
    VocabularyFetchFailure(FetchError),

    /// The current query failed; results are empty.
    #[error("Search failed: {0}")]
    SearchDispatchFailure(FetchError),

    /// The current query was aborted before it could publish.
    #[error("Search cancelled before completion")]
    Cancelled,
}

impl SearchError {
    /// Whether the error came from a timed-out call.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            SearchError::VocabularyFetchFailure(FetchError::Timeout(_))
                | SearchError::SearchDispatchFailure(FetchError::Timeout(_))
        )
    }
}

impl From<CatalogError> for SearchError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MissingContext => SearchError::MissingContext,
        }
    }
}
