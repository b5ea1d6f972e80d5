//! End-to-end searches over the bundled demo catalog.

use std::sync::Arc;

use slice_catalog::facets::FacetKind;
use slice_catalog::ids::FacetId;
use slice_catalog::money::{Currency, Money};
use slice_catalog::search::PinnedContext;
use slice_core::{QueryPhase, SearchConfig};
use slice_data::{FetchError, FixtureBackend};
use slice_search::{SearchError, SearchSession, SearchState};

const DEMO_CATALOG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures/catalog.json");

async fn session(city: &str) -> SearchSession {
    let backend = FixtureBackend::load(DEMO_CATALOG).unwrap();
    SearchSession::start(
        Arc::new(backend),
        PinnedContext::city(city),
        SearchConfig::default(),
    )
    .await
    .unwrap()
}

fn ids(state: &SearchState) -> Vec<&str> {
    state.results.iter().map(|r| r.listing.id.as_str()).collect()
}

#[tokio::test]
async fn test_profitability_orders_by_price_per_area() {
    let mut session = session("krakow").await;
    session.set_sort("profitability").unwrap();
    let state = session.settled().await;

    assert_eq!(state.phase, QueryPhase::Settled);
    assert_eq!(
        ids(&state),
        ["kr-1", "kr-5", "kr-2", "kr-4", "kr-3", "kr-7", "kr-6"]
    );
    // The calzone has no area and carries no area metrics.
    let calzone = &state.results[6];
    assert!(calzone.metrics.area_cm2.is_none());
    assert!(calzone.metrics.price_per_cm2.is_none());
    assert!(calzone.metrics.price_per_100g.is_some());

    let best: Vec<&str> = state
        .results
        .iter()
        .filter(|r| r.best_value)
        .map(|r| r.listing.id.as_str())
        .collect();
    assert_eq!(best, ["kr-1"]);
}

#[tokio::test]
async fn test_round_shape_with_diameter_floor() {
    let mut session = session("krakow").await;
    session
        .update(|s| {
            s.select_shape(Some(FacetId::new("round")));
            s.set_diameter_floor(Some(40.0));
            s.set_sort("price-asc");
        })
        .unwrap();
    let state = session.settled().await;

    assert_eq!(ids(&state), ["kr-2", "kr-5"]);
    let criteria = state.criteria.unwrap();
    assert_eq!(criteria.min_diameter_cm, Some(40.0));
}

#[tokio::test]
async fn test_price_ceiling_at_catalog_maximum_is_not_sent() {
    let mut session = session("krakow").await;
    session
        .set_price_ceiling(Some(Money::new(7900, Currency::PLN)))
        .unwrap();
    assert_eq!(session.criteria().unwrap().max_price, None);

    session
        .set_price_ceiling(Some(Money::new(3000, Currency::PLN)))
        .unwrap();
    session.set_sort("price-asc").unwrap();
    let state = session.settled().await;
    assert_eq!(ids(&state), ["kr-7", "kr-4"]);
}

#[tokio::test]
async fn test_multi_select_facets_and_no_match() {
    let mut session = session("krakow").await;
    session
        .toggle_facet(FacetKind::Sauce, FacetId::new("cream"))
        .unwrap();
    session
        .toggle_facet(FacetKind::Sauce, FacetId::new("bbq"))
        .unwrap();
    session.set_sort("name-asc").unwrap();
    let state = session.settled().await;
    assert_eq!(ids(&state), ["kr-5", "kr-3"]);

    session.set_term("hawaii").unwrap();
    let state = session.settled().await;
    assert!(state.is_no_match());
    assert!(!state.has_error());
}

#[tokio::test]
async fn test_unknown_city_fails_vocabulary_and_search() {
    let session = session("warszawa").await;

    assert!(matches!(
        session.vocabulary_error(),
        Some(SearchError::VocabularyFetchFailure(FetchError::UnknownCity(_)))
    ));
    assert!(!session.controls().enabled);

    let state = session.settled().await;
    assert_eq!(state.phase, QueryPhase::Failed);
    assert!(state.results.is_empty());
}
