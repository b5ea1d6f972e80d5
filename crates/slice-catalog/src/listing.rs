//! Search result listings.
//!
//! A listing is one vendor product as returned by the backend. The engine
//! never mutates it; it only annotates it with derived metrics.

use crate::facets::FacetKind;
use crate::ids::{FacetId, ListingId, VendorId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Geometry family of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Measured by diameter.
    #[serde(alias = "round", alias = "circle")]
    Circular,
    /// Measured by width and length.
    #[serde(alias = "square", alias = "rectangle")]
    Rectangular,
    /// Anything the engine cannot compute an area for.
    #[default]
    #[serde(other)]
    Unknown,
}

impl ShapeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Circular => "circular",
            ShapeKind::Rectangular => "rectangular",
            ShapeKind::Unknown => "unknown",
        }
    }
}

/// A product listing returned by a search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    /// Backend identifier.
    pub id: ListingId,
    /// Product name.
    pub name: String,
    /// Vendor (restaurant) offering the product.
    pub vendor: VendorId,
    /// Vendor display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    /// Price of one item.
    pub price: Money,
    /// Weight in grams.
    #[serde(default)]
    pub weight_g: Option<f64>,
    /// Energy value in kcal for the whole item.
    #[serde(default)]
    pub energy_kcal: Option<f64>,
    /// Geometry family.
    #[serde(default)]
    pub shape: ShapeKind,
    /// Shape facet id, as listed in the vocabulary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_id: Option<FacetId>,
    /// Diameter in cm (circular only).
    #[serde(default)]
    pub diameter_cm: Option<f64>,
    /// Width in cm (rectangular only).
    #[serde(default)]
    pub width_cm: Option<f64>,
    /// Length in cm (rectangular only).
    #[serde(default)]
    pub length_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dough: Option<FacetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sauce: Option<FacetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crust: Option<FacetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<FacetId>,
}

impl Listing {
    /// Create a listing with no geometry or nutrition data.
    pub fn new(
        id: impl Into<ListingId>,
        name: impl Into<String>,
        vendor: impl Into<VendorId>,
        price: Money,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            vendor: vendor.into(),
            vendor_name: None,
            price,
            weight_g: None,
            energy_kcal: None,
            shape: ShapeKind::Unknown,
            shape_id: None,
            diameter_cm: None,
            width_cm: None,
            length_cm: None,
            dough: None,
            sauce: None,
            crust: None,
            style: None,
        }
    }

    /// Set circular geometry.
    pub fn circular(mut self, diameter_cm: f64) -> Self {
        self.shape = ShapeKind::Circular;
        self.diameter_cm = Some(diameter_cm);
        self
    }

    /// Set rectangular geometry.
    pub fn rectangular(mut self, width_cm: f64, length_cm: f64) -> Self {
        self.shape = ShapeKind::Rectangular;
        self.width_cm = Some(width_cm);
        self.length_cm = Some(length_cm);
        self
    }

    pub fn with_weight(mut self, grams: f64) -> Self {
        self.weight_g = Some(grams);
        self
    }

    pub fn with_energy(mut self, kcal: f64) -> Self {
        self.energy_kcal = Some(kcal);
        self
    }

    /// Tag the listing with a facet value.
    pub fn with_facet(mut self, kind: FacetKind, id: impl Into<FacetId>) -> Self {
        let id = id.into();
        match kind {
            FacetKind::Shape => self.shape_id = Some(id),
            FacetKind::Dough => self.dough = Some(id),
            FacetKind::Sauce => self.sauce = Some(id),
            FacetKind::Crust => self.crust = Some(id),
            FacetKind::Style => self.style = Some(id),
            FacetKind::Vendor => self.vendor = VendorId::new(id.as_str()),
        }
        self
    }

    /// The listing's value for a facet group, as a plain id string.
    pub fn facet_value(&self, kind: FacetKind) -> Option<&str> {
        match kind {
            FacetKind::Shape => self.shape_id.as_ref().map(FacetId::as_str),
            FacetKind::Dough => self.dough.as_ref().map(FacetId::as_str),
            FacetKind::Sauce => self.sauce.as_ref().map(FacetId::as_str),
            FacetKind::Crust => self.crust.as_ref().map(FacetId::as_str),
            FacetKind::Style => self.style.as_ref().map(FacetId::as_str),
            FacetKind::Vendor => Some(self.vendor.as_str()),
        }
    }

    /// Vendor display name, falling back to the vendor id.
    pub fn vendor_label(&self) -> &str {
        self.vendor_name.as_deref().unwrap_or(self.vendor.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    #[test]
    fn test_shape_aliases_and_unknowns() {
        let round: ShapeKind = serde_json::from_str(r#""round""#).unwrap();
        let square: ShapeKind = serde_json::from_str(r#""square""#).unwrap();
        let calzone: ShapeKind = serde_json::from_str(r#""calzone""#).unwrap();
        assert_eq!(round, ShapeKind::Circular);
        assert_eq!(square, ShapeKind::Rectangular);
        assert_eq!(calzone, ShapeKind::Unknown);
    }

    #[test]
    fn test_listing_deserializes_sparse_payload() {
        let listing: Listing = serde_json::from_str(
            r#"{
                "id": "p-1",
                "name": "Margherita",
                "vendor": "da-grasso",
                "price": {"amount_cents": 2999, "currency": "PLN"}
            }"#,
        )
        .unwrap();
        assert_eq!(listing.shape, ShapeKind::Unknown);
        assert!(listing.diameter_cm.is_none());
        assert!(listing.weight_g.is_none());
        assert_eq!(listing.vendor_label(), "da-grasso");
    }

    #[test]
    fn test_facet_values() {
        let listing = Listing::new("p-2", "Diavola", "luka", Money::new(3500, Currency::PLN))
            .circular(32.0)
            .with_facet(FacetKind::Shape, "round")
            .with_facet(FacetKind::Sauce, "tomato");
        assert_eq!(listing.facet_value(FacetKind::Shape), Some("round"));
        assert_eq!(listing.facet_value(FacetKind::Sauce), Some("tomato"));
        assert_eq!(listing.facet_value(FacetKind::Dough), None);
        assert_eq!(listing.facet_value(FacetKind::Vendor), Some("luka"));
    }
}
