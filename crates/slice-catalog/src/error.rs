//! Catalog error types.

use thiserror::Error;

/// Errors raised while composing search criteria.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No city is pinned, so there is nothing to search.
    #[error("Missing search context: no city selected")]
    MissingContext,
}
