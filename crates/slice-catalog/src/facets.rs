//! Facet vocabulary.
//!
//! The vocabulary is the authoritative list of filter values for one city.
//! It is fetched once per search session and never mutated afterwards;
//! a city change starts a new session with a fresh vocabulary.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CityId, FacetId};
use crate::listing::ShapeKind;
use crate::money::Money;
use crate::search::SelectionState;

/// A named, finite filter dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetKind {
    Shape,
    Dough,
    Sauce,
    Crust,
    Style,
    Vendor,
}

impl FacetKind {
    /// Every facet group, in display order.
    pub const ALL: [FacetKind; 6] = [
        FacetKind::Shape,
        FacetKind::Dough,
        FacetKind::Sauce,
        FacetKind::Crust,
        FacetKind::Style,
        FacetKind::Vendor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FacetKind::Shape => "shape",
            FacetKind::Dough => "dough",
            FacetKind::Sauce => "sauce",
            FacetKind::Crust => "crust",
            FacetKind::Style => "style",
            FacetKind::Vendor => "vendor",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FacetKind::Shape => "Shape",
            FacetKind::Dough => "Dough",
            FacetKind::Sauce => "Sauce",
            FacetKind::Crust => "Crust thickness",
            FacetKind::Style => "Style",
            FacetKind::Vendor => "Restaurant",
        }
    }

    /// Shape is single-choice; every other group is multi-select.
    pub fn is_exclusive(&self) -> bool {
        matches!(self, FacetKind::Shape)
    }
}

impl std::fmt::Display for FacetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable value inside a facet group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFacetOption")]
pub struct FacetOption {
    /// Display label.
    pub label: String,
    /// Geometry family, set for shape options only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ShapeKind>,
}

/// Backends send either a bare label or a full option object.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawFacetOption {
    Label(String),
    Full {
        label: String,
        #[serde(default)]
        kind: Option<ShapeKind>,
    },
}

impl From<RawFacetOption> for FacetOption {
    fn from(raw: RawFacetOption) -> Self {
        match raw {
            RawFacetOption::Label(label) => Self { label, kind: None },
            RawFacetOption::Full { label, kind } => Self { label, kind },
        }
    }
}

/// A facet group: stable id -> option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetGroup {
    options: BTreeMap<FacetId, FacetOption>,
}

impl FacetGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option (builder style).
    pub fn with(mut self, id: impl Into<FacetId>, label: impl Into<String>) -> Self {
        self.options.insert(
            id.into(),
            FacetOption {
                label: label.into(),
                kind: None,
            },
        );
        self
    }

    /// Add a shape option carrying its geometry family.
    pub fn with_shape(
        mut self,
        id: impl Into<FacetId>,
        label: impl Into<String>,
        kind: ShapeKind,
    ) -> Self {
        self.options.insert(
            id.into(),
            FacetOption {
                label: label.into(),
                kind: Some(kind),
            },
        );
        self
    }

    pub fn contains(&self, id: &FacetId) -> bool {
        self.options.contains_key(id)
    }

    pub fn get(&self, id: &FacetId) -> Option<&FacetOption> {
        self.options.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FacetId, &FacetOption)> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Scalar bounds reported by the backend for the whole city catalog.
///
/// Every bound is optional: a degraded vocabulary has none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diameter_min_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diameter_max_cm: Option<f64>,
}

/// Vocabulary as sent by the backend, before it is pinned to a city.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabularyPayload {
    #[serde(default)]
    pub groups: BTreeMap<FacetKind, FacetGroup>,
    #[serde(default)]
    pub bounds: NumericBounds,
}

impl VocabularyPayload {
    /// Pin the payload to the city it was fetched for.
    pub fn into_vocabulary(self, city: CityId) -> FacetVocabulary {
        FacetVocabulary {
            city,
            groups: self.groups,
            bounds: self.bounds,
            fetched_at: Utc::now(),
        }
    }
}

/// Snapshot of selectable filter values and bounds for one city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetVocabulary {
    /// City the vocabulary was fetched for.
    pub city: CityId,
    groups: BTreeMap<FacetKind, FacetGroup>,
    /// Numeric bounds.
    pub bounds: NumericBounds,
    /// When the snapshot was taken.
    pub fetched_at: DateTime<Utc>,
}

impl FacetVocabulary {
    /// Create a vocabulary from groups and bounds.
    pub fn new(
        city: impl Into<CityId>,
        groups: impl IntoIterator<Item = (FacetKind, FacetGroup)>,
        bounds: NumericBounds,
    ) -> Self {
        Self {
            city: city.into(),
            groups: groups.into_iter().collect(),
            bounds,
            fetched_at: Utc::now(),
        }
    }

    /// The degraded, criteria-less vocabulary used when a fetch fails.
    pub fn empty(city: impl Into<CityId>) -> Self {
        Self::new(city, [], NumericBounds::default())
    }

    /// Get a facet group; missing groups read as empty.
    pub fn group(&self, kind: FacetKind) -> Option<&FacetGroup> {
        self.groups.get(&kind)
    }

    pub fn contains(&self, kind: FacetKind, id: &FacetId) -> bool {
        self.group(kind).is_some_and(|g| g.contains(id))
    }

    pub fn label(&self, kind: FacetKind, id: &FacetId) -> Option<&str> {
        self.group(kind)?.get(id).map(|o| o.label.as_str())
    }

    /// Geometry family of a shape option.
    pub fn shape_kind(&self, id: &FacetId) -> Option<ShapeKind> {
        self.group(FacetKind::Shape)?.get(id)?.kind
    }

    /// True when no group has any option.
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(FacetGroup::is_empty)
    }
}

/// One option as rendered by a filter control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlOption {
    pub id: FacetId,
    pub label: String,
    pub selected: bool,
}

/// A rendered facet group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetControl {
    pub kind: FacetKind,
    pub exclusive: bool,
    pub options: Vec<ControlOption>,
}

/// View model for the filter sidebar.
///
/// Every facet group is always present; after a failed vocabulary fetch the
/// groups are empty, `enabled` is false and `error` carries the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterControls {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub groups: Vec<FacetControl>,
    pub bounds: NumericBounds,
}

impl FilterControls {
    /// Build the controls for a vocabulary and the current selection.
    pub fn build(
        vocabulary: &FacetVocabulary,
        selection: &SelectionState,
        error: Option<&str>,
    ) -> Self {
        let groups = FacetKind::ALL
            .iter()
            .map(|&kind| FacetControl {
                kind,
                exclusive: kind.is_exclusive(),
                options: vocabulary
                    .group(kind)
                    .map(|group| {
                        group
                            .iter()
                            .map(|(id, option)| ControlOption {
                                id: id.clone(),
                                label: option.label.clone(),
                                selected: selection.is_selected(kind, id),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            enabled: error.is_none() && !vocabulary.is_empty(),
            error: error.map(str::to_string),
            groups,
            bounds: vocabulary.bounds.clone(),
        }
    }

    pub fn group(&self, kind: FacetKind) -> Option<&FacetControl> {
        self.groups.iter().find(|g| g.kind == kind)
    }
}
