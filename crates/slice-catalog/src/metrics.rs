//! Derived economic metrics.
//!
//! Every metric is `Option<f64>`: `None` means undefined and must render as
//! absent. A metric is never reported as 0, NaN or infinity because of
//! missing or malformed input.

use std::f64::consts::PI;

use serde::Serialize;

use crate::listing::{Listing, ShapeKind};

/// Why a listing's area cannot be computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryIssue {
    #[error("shape is not recognized")]
    UnknownShape,

    #[error("circular listing has no diameter")]
    MissingDiameter,

    #[error("rectangular listing is missing width or length")]
    MissingDimensions,

    #[error("{field} must be a positive number, got {value}")]
    NonPositiveDimension { field: &'static str, value: f64 },
}

fn positive(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn check_dimension(field: &'static str, value: Option<f64>) -> Result<f64, Option<GeometryIssue>> {
    let value = value.ok_or(None)?;
    positive(value).ok_or(Some(GeometryIssue::NonPositiveDimension { field, value }))
}

/// Report what is wrong with a listing's geometry, if anything.
///
/// Only the fields that belong to the listing's shape are inspected: a
/// rectangular listing with a stray diameter is well formed.
pub fn geometry_issue(listing: &Listing) -> Option<GeometryIssue> {
    match listing.shape {
        ShapeKind::Circular => match check_dimension("diameter", listing.diameter_cm) {
            Ok(_) => None,
            Err(issue) => Some(issue.unwrap_or(GeometryIssue::MissingDiameter)),
        },
        ShapeKind::Rectangular => {
            let width = check_dimension("width", listing.width_cm);
            let length = check_dimension("length", listing.length_cm);
            match (width, length) {
                (Ok(_), Ok(_)) => None,
                (Err(Some(issue)), _) | (_, Err(Some(issue))) => Some(issue),
                _ => Some(GeometryIssue::MissingDimensions),
            }
        }
        ShapeKind::Unknown => Some(GeometryIssue::UnknownShape),
    }
}

/// Surface area in cm².
///
/// Circular: `π·(d/2)²`. Rectangular: `w·l`. Undefined for missing or
/// non-positive dimensions and for unknown shapes.
pub fn area(listing: &Listing) -> Option<f64> {
    match listing.shape {
        ShapeKind::Circular => {
            let diameter = positive(listing.diameter_cm?)?;
            finite(PI * (diameter / 2.0).powi(2))
        }
        ShapeKind::Rectangular => {
            let width = positive(listing.width_cm?)?;
            let length = positive(listing.length_cm?)?;
            finite(width * length)
        }
        ShapeKind::Unknown => None,
    }
}

fn price(listing: &Listing) -> Option<f64> {
    finite(listing.price.to_decimal())
}

/// Price per cm² of surface.
pub fn price_per_area(listing: &Listing) -> Option<f64> {
    let area = area(listing)?;
    finite(price(listing)? / area)
}

/// Price per 100 g.
pub fn price_per_weight(listing: &Listing) -> Option<f64> {
    let weight = positive(listing.weight_g?)?;
    finite(price(listing)? / weight * 100.0)
}

/// Energy density in kcal per gram.
pub fn energy_density(listing: &Listing) -> Option<f64> {
    let weight = positive(listing.weight_g?)?;
    let energy = listing.energy_kcal.filter(|e| e.is_finite() && *e >= 0.0)?;
    finite(energy / weight)
}

/// Metrics computed for one listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DerivedMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_cm2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_cm2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_100g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kcal_per_gram: Option<f64>,
}

impl DerivedMetrics {
    pub fn compute(listing: &Listing) -> Self {
        Self {
            area_cm2: area(listing),
            price_per_cm2: price_per_area(listing),
            price_per_100g: price_per_weight(listing),
            kcal_per_gram: energy_density(listing),
        }
    }

    /// True when no metric is defined.
    pub fn is_empty(&self) -> bool {
        self.area_cm2.is_none()
            && self.price_per_cm2.is_none()
            && self.price_per_100g.is_none()
            && self.kcal_per_gram.is_none()
    }

    /// Display badges for the defined metrics only.
    pub fn badges(&self, currency_symbol: &str) -> Vec<MetricBadge> {
        let mut badges = Vec::new();
        if let Some(value) = self.area_cm2 {
            badges.push(MetricBadge::new(MetricKind::Area, value, format!("{:.0} cm\u{00b2}", value)));
        }
        if let Some(value) = self.price_per_cm2 {
            badges.push(MetricBadge::new(
                MetricKind::PricePerArea,
                value,
                format!("{:.4} {}/cm\u{00b2}", value, currency_symbol),
            ));
        }
        if let Some(value) = self.price_per_100g {
            badges.push(MetricBadge::new(
                MetricKind::PricePerWeight,
                value,
                format!("{:.2} {}/100 g", value, currency_symbol),
            ));
        }
        if let Some(value) = self.kcal_per_gram {
            badges.push(MetricBadge::new(
                MetricKind::EnergyDensity,
                value,
                format!("{:.2} kcal/g", value),
            ));
        }
        badges
    }
}

/// Which metric a badge shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Area,
    PricePerArea,
    PricePerWeight,
    EnergyDensity,
}

/// A rendered metric annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricBadge {
    pub kind: MetricKind,
    pub value: f64,
    pub text: String,
}

impl MetricBadge {
    fn new(kind: MetricKind, value: f64, text: String) -> Self {
        Self { kind, value, text }
    }
}

/// A listing with its metrics attached for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedListing {
    pub listing: Listing,
    pub metrics: DerivedMetrics,
    /// Lowest price per cm² in its batch. A hint only: order is not changed.
    pub best_value: bool,
}

impl AnnotatedListing {
    pub fn new(listing: Listing) -> Self {
        let metrics = DerivedMetrics::compute(&listing);
        Self {
            listing,
            metrics,
            best_value: false,
        }
    }

    pub fn badges(&self) -> Vec<MetricBadge> {
        self.metrics.badges(self.listing.price.currency.symbol())
    }
}

/// Annotate a response batch, preserving backend order.
///
/// The best-value flag goes to the first listing with the lowest defined
/// price per cm², compared within the currency of the first such listing,
/// and only when at least two listings are comparable.
pub fn annotate_batch(listings: Vec<Listing>) -> Vec<AnnotatedListing> {
    let mut annotated: Vec<AnnotatedListing> =
        listings.into_iter().map(AnnotatedListing::new).collect();

    let currency = annotated
        .iter()
        .find(|a| a.metrics.price_per_cm2.is_some())
        .map(|a| a.listing.price.currency);

    let comparable: Vec<(usize, f64)> = annotated
        .iter()
        .enumerate()
        .filter(|(_, a)| Some(a.listing.price.currency) == currency)
        .filter_map(|(i, a)| a.metrics.price_per_cm2.map(|v| (i, v)))
        .collect();

    if comparable.len() >= 2 {
        let best = comparable
            .iter()
            .fold(None::<(usize, f64)>, |best, &(i, v)| match best {
                Some((_, bv)) if bv <= v => best,
                _ => Some((i, v)),
            });
        if let Some((index, _)) = best {
            annotated[index].best_value = true;
        }
    }

    annotated
}
