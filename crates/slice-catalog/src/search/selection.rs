//! User selection state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::facets::FacetKind;
use crate::ids::FacetId;
use crate::money::Money;

/// Current filter and sort choices made in the UI.
///
/// Shape is single-choice and lives in its own field; every other facet
/// group is a set. Nothing here is validated: validation against the
/// vocabulary happens when criteria are composed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionState {
    /// Selected shape.
    #[serde(default)]
    pub shape: Option<FacetId>,
    /// Multi-select groups.
    #[serde(default)]
    pub facets: BTreeMap<FacetKind, BTreeSet<FacetId>>,
    /// Maximum price.
    #[serde(default)]
    pub price_ceiling: Option<Money>,
    /// Minimum diameter, meaningful for circular shapes.
    #[serde(default)]
    pub diameter_floor_cm: Option<f64>,
    /// Minimum width, meaningful for rectangular shapes.
    #[serde(default)]
    pub min_width_cm: Option<f64>,
    /// Minimum length, meaningful for rectangular shapes.
    #[serde(default)]
    pub min_length_cm: Option<f64>,
    /// Free-text term.
    #[serde(default)]
    pub term: String,
    /// User-facing sort label.
    #[serde(default)]
    pub sort: String,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a sort label.
    pub fn with_sort(sort: impl Into<String>) -> Self {
        Self {
            sort: sort.into(),
            ..Self::default()
        }
    }

    /// Select a shape, replacing any previous one.
    pub fn select_shape(&mut self, shape: Option<FacetId>) {
        self.shape = shape;
    }

    /// Toggle a facet value.
    ///
    /// For the shape group this selects the value, or clears it when it is
    /// already the selected one.
    pub fn toggle(&mut self, kind: FacetKind, id: FacetId) {
        if kind.is_exclusive() {
            if self.shape.as_ref() == Some(&id) {
                self.shape = None;
            } else {
                self.shape = Some(id);
            }
            return;
        }

        let set = self.facets.entry(kind).or_default();
        if !set.remove(&id) {
            set.insert(id);
        }
        if set.is_empty() {
            self.facets.remove(&kind);
        }
    }

    pub fn is_selected(&self, kind: FacetKind, id: &FacetId) -> bool {
        if kind.is_exclusive() {
            return self.shape.as_ref() == Some(id);
        }
        self.facets.get(&kind).is_some_and(|set| set.contains(id))
    }

    /// Selected ids of one group.
    pub fn selected(&self, kind: FacetKind) -> Vec<&FacetId> {
        if kind.is_exclusive() {
            return self.shape.iter().collect();
        }
        self.facets
            .get(&kind)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    pub fn set_price_ceiling(&mut self, ceiling: Option<Money>) {
        self.price_ceiling = ceiling;
    }

    pub fn set_diameter_floor(&mut self, floor_cm: Option<f64>) {
        self.diameter_floor_cm = floor_cm;
    }

    pub fn set_rectangle_floor(&mut self, width_cm: Option<f64>, length_cm: Option<f64>) {
        self.min_width_cm = width_cm;
        self.min_length_cm = length_cm;
    }

    pub fn set_term(&mut self, term: impl Into<String>) {
        self.term = term.into();
    }

    pub fn set_sort(&mut self, sort: impl Into<String>) {
        self.sort = sort.into();
    }

    /// Clear every filter but keep the term and the sort.
    pub fn clear_filters(&mut self) {
        *self = Self {
            term: std::mem::take(&mut self.term),
            sort: std::mem::take(&mut self.sort),
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_is_exclusive() {
        let mut selection = SelectionState::new();
        selection.toggle(FacetKind::Shape, FacetId::new("round"));
        selection.toggle(FacetKind::Shape, FacetId::new("roman"));
        assert_eq!(selection.shape, Some(FacetId::new("roman")));
        assert!(!selection.is_selected(FacetKind::Shape, &FacetId::new("round")));

        selection.toggle(FacetKind::Shape, FacetId::new("roman"));
        assert_eq!(selection.shape, None);
    }

    #[test]
    fn test_multi_select_toggle() {
        let mut selection = SelectionState::new();
        selection.toggle(FacetKind::Sauce, FacetId::new("tomato"));
        selection.toggle(FacetKind::Sauce, FacetId::new("white"));
        assert_eq!(selection.selected(FacetKind::Sauce).len(), 2);

        selection.toggle(FacetKind::Sauce, FacetId::new("tomato"));
        selection.toggle(FacetKind::Sauce, FacetId::new("white"));
        assert!(selection.selected(FacetKind::Sauce).is_empty());
        // Emptied groups do not linger, so equal selections compare equal.
        assert_eq!(selection, SelectionState::new());
    }

    #[test]
    fn test_clear_filters_keeps_term_and_sort() {
        let mut selection = SelectionState::with_sort("price-asc");
        selection.set_term("salami");
        selection.toggle(FacetKind::Dough, FacetId::new("thin"));
        selection.set_diameter_floor(Some(32.0));

        selection.clear_filters();
        assert_eq!(selection.term, "salami");
        assert_eq!(selection.sort, "price-asc");
        assert!(selection.facets.is_empty());
        assert!(selection.diameter_floor_cm.is_none());
    }
}
