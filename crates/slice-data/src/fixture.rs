//! In-memory catalog backend loaded from a JSON fixture.
//!
//! Used for demos and offline runs. It answers the same two operations as
//! the HTTP backend and applies criteria and sort codes itself, standing in
//! for the server.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use slice_catalog::facets::{FacetKind, FacetVocabulary, VocabularyPayload};
use slice_catalog::ids::CityId;
use slice_catalog::listing::Listing;
use slice_catalog::metrics;
use slice_catalog::search::{SearchCriteria, SortCode};

use crate::backend::CatalogBackend;
use crate::client::FetchError;

/// Error loading a fixture file.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid fixture: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One city in a fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureCity {
    #[serde(default)]
    pub facets: VocabularyPayload,
    #[serde(default)]
    pub listings: Vec<Listing>,
}

/// Fixture file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureCatalog {
    pub cities: BTreeMap<CityId, FixtureCity>,
}

impl FixtureCatalog {
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Backend answering from a [`FixtureCatalog`].
#[derive(Debug, Clone)]
pub struct FixtureBackend {
    catalog: FixtureCatalog,
    latency: Option<Duration>,
}

impl FixtureBackend {
    pub fn new(catalog: FixtureCatalog) -> Self {
        Self {
            catalog,
            latency: None,
        }
    }

    /// Load a fixture file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        Ok(Self::new(FixtureCatalog::load(path)?))
    }

    /// Delay every response, to simulate a slow network.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = (!latency.is_zero()).then_some(latency);
        self
    }

    /// Cities the fixture knows, in id order.
    pub fn cities(&self) -> impl Iterator<Item = &CityId> {
        self.catalog.cities.keys()
    }

    fn city(&self, city: &CityId) -> Result<&FixtureCity, FetchError> {
        self.catalog
            .cities
            .get(city)
            .ok_or_else(|| FetchError::UnknownCity(city.to_string()))
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl CatalogBackend for FixtureBackend {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn fetch_facet_vocabulary(&self, city: &CityId) -> Result<FacetVocabulary, FetchError> {
        self.simulate_latency().await;
        let fixture = self.city(city)?;
        Ok(fixture.facets.clone().into_vocabulary(city.clone()))
    }

    async fn search_products(&self, criteria: &SearchCriteria) -> Result<Vec<Listing>, FetchError> {
        self.simulate_latency().await;
        let fixture = self.city(&criteria.city)?;

        let mut listings: Vec<Listing> = fixture
            .listings
            .iter()
            .filter(|l| matches_criteria(l, criteria))
            .cloned()
            .collect();
        sort_listings(&mut listings, criteria.sort);
        Ok(listings)
    }
}

/// Whether a listing satisfies every constraint in the criteria.
pub fn matches_criteria(listing: &Listing, criteria: &SearchCriteria) -> bool {
    if let Some(term) = &criteria.term {
        let term = term.to_lowercase();
        if !listing.name.to_lowercase().contains(&term)
            && !listing.vendor_label().to_lowercase().contains(&term)
        {
            return false;
        }
    }

    if let Some(shape) = &criteria.shape {
        if listing.facet_value(FacetKind::Shape) != Some(shape.as_str()) {
            return false;
        }
    }

    let facets_match = criteria.facets.iter().all(|(kind, allowed)| {
        listing
            .facet_value(*kind)
            .is_some_and(|value| allowed.iter().any(|id| id.as_str() == value))
    });
    if !facets_match {
        return false;
    }

    if let Some(max) = &criteria.max_price {
        if !matches!(listing.price.try_cmp(max), Some(Ordering::Less | Ordering::Equal)) {
            return false;
        }
    }

    at_least(listing.diameter_cm, criteria.min_diameter_cm)
        && at_least(listing.width_cm, criteria.min_width_cm)
        && at_least(listing.length_cm, criteria.min_length_cm)
}

fn at_least(value: Option<f64>, floor: Option<f64>) -> bool {
    match floor {
        Some(floor) => value.is_some_and(|v| v >= floor),
        None => true,
    }
}

/// Order listings by a sort code. Undefined metrics sort last.
pub fn sort_listings(listings: &mut [Listing], code: SortCode) {
    match code {
        SortCode::Default => {}
        SortCode::PriceAsc => listings.sort_by_key(|l| l.price.amount_cents),
        SortCode::PriceDesc => listings.sort_by_key(|l| std::cmp::Reverse(l.price.amount_cents)),
        SortCode::NameAsc => listings.sort_by_cached_key(|l| l.name.to_lowercase()),
        SortCode::NameDesc => {
            listings.sort_by_cached_key(|l| std::cmp::Reverse(l.name.to_lowercase()))
        }
        SortCode::PricePerAreaAsc => {
            listings.sort_by(|a, b| by_metric(metrics::price_per_area(a), metrics::price_per_area(b)))
        }
        SortCode::EnergyDensityAsc => {
            listings.sort_by(|a, b| by_metric(metrics::energy_density(a), metrics::energy_density(b)))
        }
        SortCode::EnergyDensityDesc => listings.sort_by(|a, b| {
            by_metric(
                metrics::energy_density(a).map(|v| -v),
                metrics::energy_density(b).map(|v| -v),
            )
        }),
    }
}

fn by_metric(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slice_catalog::ids::FacetId;
    use slice_catalog::money::{Currency, Money};
    use std::io::Write;

    const FIXTURE: &str = r#"{
        "cities": {
            "krakow": {
                "facets": {
                    "groups": {
                        "shape": {
                            "round": {"label": "Round", "kind": "circular"},
                            "roman": {"label": "Roman", "kind": "rectangular"}
                        },
                        "dough": {"thin": "Thin", "thick": "Thick"}
                    },
                    "bounds": {"diameter_min_cm": 24.0, "diameter_max_cm": 50.0}
                },
                "listings": [
                    {"id": "p1", "name": "Margherita", "vendor": "luka",
                     "price": {"amount_cents": 3200}, "shape": "circular", "shape_id": "round",
                     "diameter_cm": 32.0, "dough": "thin", "weight_g": 450.0, "energy_kcal": 1100.0},
                    {"id": "p2", "name": "Diavola", "vendor": "luka",
                     "price": {"amount_cents": 5850}, "shape": "circular", "shape_id": "round",
                     "diameter_cm": 40.0, "dough": "thick", "weight_g": 800.0, "energy_kcal": 2400.0},
                    {"id": "p3", "name": "Al taglio", "vendor": "roma",
                     "price": {"amount_cents": 2800}, "shape": "rectangular", "shape_id": "roman",
                     "width_cm": 20.0, "length_cm": 30.0}
                ]
            }
        }
    }"#;

    fn backend() -> FixtureBackend {
        FixtureBackend::new(FixtureCatalog::from_json(FIXTURE).unwrap())
    }

    fn names(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_vocabulary_for_known_city() {
        let vocab = backend()
            .fetch_facet_vocabulary(&CityId::new("krakow"))
            .await
            .unwrap();
        assert!(vocab.contains(FacetKind::Dough, &FacetId::new("thick")));
        assert_eq!(vocab.bounds.diameter_min_cm, Some(24.0));
    }

    #[tokio::test]
    async fn test_unknown_city() {
        let err = backend()
            .fetch_facet_vocabulary(&CityId::new("atlantis"))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::UnknownCity("atlantis".into()));
    }

    #[tokio::test]
    async fn test_search_filters() {
        let backend = backend();

        let mut criteria = SearchCriteria::for_city("krakow");
        criteria.shape = Some(FacetId::new("round"));
        criteria.min_diameter_cm = Some(35.0);
        let found = backend.search_products(&criteria).await.unwrap();
        assert_eq!(names(&found), ["Diavola"]);

        let mut criteria = SearchCriteria::for_city("krakow");
        criteria.term = Some("MARGH".into());
        let found = backend.search_products(&criteria).await.unwrap();
        assert_eq!(names(&found), ["Margherita"]);

        let mut criteria = SearchCriteria::for_city("krakow");
        criteria.max_price = Some(Money::new(3200, Currency::PLN));
        criteria
            .facets
            .insert(FacetKind::Dough, [FacetId::new("thin"), FacetId::new("thick")].into());
        let found = backend.search_products(&criteria).await.unwrap();
        assert_eq!(names(&found), ["Margherita"]);
    }

    #[tokio::test]
    async fn test_search_sorts() {
        let backend = backend();
        let mut criteria = SearchCriteria::for_city("krakow");

        criteria.sort = SortCode::PriceAsc;
        let found = backend.search_products(&criteria).await.unwrap();
        assert_eq!(names(&found), ["Al taglio", "Margherita", "Diavola"]);

        criteria.sort = SortCode::NameDesc;
        let found = backend.search_products(&criteria).await.unwrap();
        assert_eq!(names(&found), ["Margherita", "Diavola", "Al taglio"]);

        // 0.0398 vs 0.0466 vs 0.0466 zł/cm²
        criteria.sort = SortCode::PricePerAreaAsc;
        let found = backend.search_products(&criteria).await.unwrap();
        assert_eq!(found[0].name, "Margherita");

        // Al taglio has no energy data and goes last either way.
        criteria.sort = SortCode::EnergyDensityDesc;
        let found = backend.search_products(&criteria).await.unwrap();
        assert_eq!(names(&found), ["Diavola", "Margherita", "Al taglio"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_simulated() {
        let backend = backend().with_latency(Duration::from_millis(300));
        let started = tokio::time::Instant::now();
        backend
            .search_products(&SearchCriteria::for_city("krakow"))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let backend = FixtureBackend::load(file.path()).unwrap();
        assert_eq!(backend.cities().map(CityId::as_str).collect::<Vec<_>>(), ["krakow"]);

        let missing = FixtureBackend::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(FixtureError::Io { .. })));
    }
}
