//! The remote catalog interface.

use async_trait::async_trait;
use slice_catalog::facets::FacetVocabulary;
use slice_catalog::ids::CityId;
use slice_catalog::listing::Listing;
use slice_catalog::search::SearchCriteria;

use crate::client::FetchError;

/// A source of facet vocabularies and search results.
///
/// Implementations do not enforce the engine's deadlines; callers wrap each
/// call with [`crate::with_timeout`] using the [`crate::DependencyTag`]
/// timeout of the operation.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetch the facet vocabulary of a city.
    async fn fetch_facet_vocabulary(&self, city: &CityId) -> Result<FacetVocabulary, FetchError>;

    /// Run a search, returning listings in backend order.
    async fn search_products(&self, criteria: &SearchCriteria) -> Result<Vec<Listing>, FetchError>;
}
