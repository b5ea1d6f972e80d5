//! Sort labels and backend sort codes.

use serde::{Deserialize, Serialize};

/// Sort order understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortCode {
    /// Backend default ordering.
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "price")]
    PriceAsc,
    #[serde(rename = "-price")]
    PriceDesc,
    #[serde(rename = "name")]
    NameAsc,
    #[serde(rename = "-name")]
    NameDesc,
    /// Cheapest surface first.
    #[serde(rename = "price_per_cm2")]
    PricePerAreaAsc,
    #[serde(rename = "kcal_per_gram")]
    EnergyDensityAsc,
    #[serde(rename = "-kcal_per_gram")]
    EnergyDensityDesc,
}

impl SortCode {
    /// Wire value of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortCode::Default => "default",
            SortCode::PriceAsc => "price",
            SortCode::PriceDesc => "-price",
            SortCode::NameAsc => "name",
            SortCode::NameDesc => "-name",
            SortCode::PricePerAreaAsc => "price_per_cm2",
            SortCode::EnergyDensityAsc => "kcal_per_gram",
            SortCode::EnergyDensityDesc => "-kcal_per_gram",
        }
    }
}

impl std::fmt::Display for SortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort choices offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortLabel {
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    Profitability,
    EnergyAsc,
    EnergyDesc,
}

impl SortLabel {
    /// Every label, in menu order.
    pub const ALL: [SortLabel; 8] = [
        SortLabel::Default,
        SortLabel::PriceAsc,
        SortLabel::PriceDesc,
        SortLabel::NameAsc,
        SortLabel::NameDesc,
        SortLabel::Profitability,
        SortLabel::EnergyAsc,
        SortLabel::EnergyDesc,
    ];

    /// Short machine key (used on the command line and in config).
    pub fn key(&self) -> &'static str {
        match self {
            SortLabel::Default => "default",
            SortLabel::PriceAsc => "price-asc",
            SortLabel::PriceDesc => "price-desc",
            SortLabel::NameAsc => "name-asc",
            SortLabel::NameDesc => "name-desc",
            SortLabel::Profitability => "profitability",
            SortLabel::EnergyAsc => "energy-asc",
            SortLabel::EnergyDesc => "energy-desc",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SortLabel::Default => "Default",
            SortLabel::PriceAsc => "Price: Low to High",
            SortLabel::PriceDesc => "Price: High to Low",
            SortLabel::NameAsc => "Name: A-Z",
            SortLabel::NameDesc => "Name: Z-A",
            SortLabel::Profitability => "Best value (price per cm\u{00b2})",
            SortLabel::EnergyAsc => "Energy density: Low to High",
            SortLabel::EnergyDesc => "Energy density: High to Low",
        }
    }

    /// Backend code for the label.
    pub fn code(&self) -> SortCode {
        match self {
            SortLabel::Default => SortCode::Default,
            SortLabel::PriceAsc => SortCode::PriceAsc,
            SortLabel::PriceDesc => SortCode::PriceDesc,
            SortLabel::NameAsc => SortCode::NameAsc,
            SortLabel::NameDesc => SortCode::NameDesc,
            SortLabel::Profitability => SortCode::PricePerAreaAsc,
            SortLabel::EnergyAsc => SortCode::EnergyDensityAsc,
            SortLabel::EnergyDesc => SortCode::EnergyDensityDesc,
        }
    }

    /// Match a key or a display name, case-insensitively.
    pub fn parse(label: &str) -> Option<Self> {
        let wanted = label.trim();
        Self::ALL.into_iter().find(|l| {
            l.key().eq_ignore_ascii_case(wanted) || l.display_name().eq_ignore_ascii_case(wanted)
        })
    }
}

/// Resolves user-facing sort labels to backend codes.
///
/// Sorting is never applied to an already fetched result set; a new code
/// means a new query.
pub struct SortStrategy;

impl SortStrategy {
    /// Code used for blank or unrecognized labels.
    pub const DEFAULT_CODE: SortCode = SortCode::Default;

    pub fn resolve(label: &str) -> SortCode {
        SortLabel::parse(label)
            .map(|l| l.code())
            .unwrap_or(Self::DEFAULT_CODE)
    }
}
