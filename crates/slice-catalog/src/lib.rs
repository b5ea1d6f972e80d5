//! Catalog domain types for pizza discovery.
//!
//! - **Listings**: pizzas as the backend reports them
//! - **Facets**: the per-city vocabulary of filter values and bounds
//! - **Metrics**: area, price per cm², price per 100 g and energy density
//! - **Search**: selection state, sort resolution and criteria composition
//!
//! # Example
//!
//! ```rust
//! use slice_catalog::prelude::*;
//!
//! let vocabulary = FacetVocabulary::new(
//!     "krakow",
//!     [(FacetKind::Dough, FacetGroup::new().with("thin", "Thin"))],
//!     NumericBounds::default(),
//! );
//!
//! let mut selection = SelectionState::with_sort("price-asc");
//! selection.toggle(FacetKind::Dough, FacetId::new("thin"));
//!
//! let criteria =
//!     CriteriaComposer::compose(&selection, &vocabulary, &PinnedContext::city("krakow")).unwrap();
//! assert_eq!(criteria.sort, SortCode::PriceAsc);
//! ```

pub mod error;
pub mod facets;
pub mod ids;
pub mod listing;
pub mod metrics;
pub mod money;
pub mod search;

pub use error::CatalogError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CatalogError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    pub use crate::facets::{
        FacetControl, FacetGroup, FacetKind, FacetOption, FacetVocabulary, FilterControls,
        NumericBounds, VocabularyPayload,
    };
    pub use crate::listing::{Listing, ShapeKind};
    pub use crate::metrics::{annotate_batch, AnnotatedListing, DerivedMetrics, MetricBadge};
    pub use crate::search::{
        CriteriaComposer, PinnedContext, SearchCriteria, SelectionState, SortCode, SortLabel,
        SortStrategy,
    };
}
