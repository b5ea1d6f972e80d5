//! Criteria composition.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::facets::{FacetKind, FacetVocabulary};
use crate::ids::{CityId, FacetId};
use crate::listing::ShapeKind;
use crate::money::Money;
use crate::search::selection::SelectionState;
use crate::search::sort::{SortCode, SortStrategy};

/// Context supplied by navigation: the city and the last search term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinnedContext {
    pub city: Option<CityId>,
    pub previous_term: Option<String>,
}

impl PinnedContext {
    pub fn city(city: impl Into<CityId>) -> Self {
        Self {
            city: Some(city.into()),
            previous_term: None,
        }
    }

    pub fn with_previous_term(mut self, term: impl Into<String>) -> Self {
        self.previous_term = Some(term.into());
        self
    }

    /// The city, if it is present and not blank.
    pub fn resolved_city(&self) -> Option<&CityId> {
        self.city.as_ref().filter(|c| !c.is_blank())
    }
}

/// Normalized query sent to the backend.
///
/// Built only by [`CriteriaComposer::compose`]; equal inputs always give
/// equal criteria, which is what request de-duplication relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub city: CityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<FacetId>,
    /// Multi-select groups; only non-empty groups are present.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facets: BTreeMap<FacetKind, BTreeSet<FacetId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_diameter_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length_cm: Option<f64>,
    #[serde(default)]
    pub sort: SortCode,
}

impl SearchCriteria {
    /// Unfiltered criteria for a city.
    pub fn for_city(city: impl Into<CityId>) -> Self {
        Self {
            city: city.into(),
            term: None,
            shape: None,
            facets: BTreeMap::new(),
            max_price: None,
            min_diameter_cm: None,
            min_width_cm: None,
            min_length_cm: None,
            sort: SortCode::Default,
        }
    }

    /// Every facet id the criteria reference, with its group.
    pub fn referenced_facets(&self) -> Vec<(FacetKind, &FacetId)> {
        let shape = self.shape.iter().map(|id| (FacetKind::Shape, id));
        let rest = self
            .facets
            .iter()
            .flat_map(|(kind, ids)| ids.iter().map(move |id| (*kind, id)));
        shape.chain(rest).collect()
    }

    /// Allowed ids of a multi-select group; `None` means unconstrained.
    pub fn allowed(&self, kind: FacetKind) -> Option<&BTreeSet<FacetId>> {
        self.facets.get(&kind)
    }

    /// True when nothing narrows the result set.
    pub fn is_unfiltered(&self) -> bool {
        self.term.is_none()
            && self.shape.is_none()
            && self.facets.is_empty()
            && self.max_price.is_none()
            && self.min_diameter_cm.is_none()
            && self.min_width_cm.is_none()
            && self.min_length_cm.is_none()
    }
}

/// Merges selection, vocabulary and pinned context into criteria.
pub struct CriteriaComposer;

impl CriteriaComposer {
    /// Compose criteria.
    ///
    /// Selected ids missing from the vocabulary are dropped. Geometry floors
    /// follow the selected shape's family. Fails with `MissingContext` when
    /// the pinned city is absent or blank.
    pub fn compose(
        selection: &SelectionState,
        vocabulary: &FacetVocabulary,
        pinned: &PinnedContext,
    ) -> Result<SearchCriteria, CatalogError> {
        let city = pinned
            .resolved_city()
            .cloned()
            .ok_or(CatalogError::MissingContext)?;

        let term = normalize_term(&selection.term)
            .or_else(|| pinned.previous_term.as_deref().and_then(normalize_term));

        let shape = selection
            .shape
            .as_ref()
            .filter(|id| vocabulary.contains(FacetKind::Shape, id))
            .cloned();

        let facets = selection
            .facets
            .iter()
            .filter(|(kind, _)| !kind.is_exclusive())
            .map(|(kind, ids)| {
                let known: BTreeSet<FacetId> = ids
                    .iter()
                    .filter(|id| vocabulary.contains(*kind, id))
                    .cloned()
                    .collect();
                (*kind, known)
            })
            .filter(|(_, ids)| !ids.is_empty())
            .collect();

        let bounds = &vocabulary.bounds;
        let max_price = selection
            .price_ceiling
            .filter(Money::is_positive)
            .filter(|ceiling| match bounds.price_max {
                Some(max) => !matches!(
                    ceiling.try_cmp(&max),
                    Some(Ordering::Greater | Ordering::Equal)
                ),
                None => true,
            });

        let shape_kind = shape.as_ref().and_then(|id| vocabulary.shape_kind(id));
        let (min_diameter_cm, min_width_cm, min_length_cm) = match shape_kind {
            Some(ShapeKind::Circular) => (
                positive(selection.diameter_floor_cm)
                    .filter(|floor| bounds.diameter_min_cm.map_or(true, |min| *floor > min)),
                None,
                None,
            ),
            Some(ShapeKind::Rectangular) => (
                None,
                positive(selection.min_width_cm),
                positive(selection.min_length_cm),
            ),
            _ => (None, None, None),
        };

        Ok(SearchCriteria {
            city,
            term,
            shape,
            facets,
            max_price,
            min_diameter_cm,
            min_width_cm,
            min_length_cm,
            sort: SortStrategy::resolve(&selection.sort),
        })
    }
}

fn normalize_term(term: &str) -> Option<String> {
    let trimmed = term.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}
