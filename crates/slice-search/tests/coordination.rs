//! Session and coordinator behaviour against a scripted backend whose
//! responses are released by the test, in any order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use slice_catalog::facets::{FacetGroup, FacetKind, FacetVocabulary, NumericBounds};
use slice_catalog::ids::{CityId, FacetId};
use slice_catalog::listing::{Listing, ShapeKind};
use slice_catalog::money::{Currency, Money};
use slice_catalog::search::{PinnedContext, SearchCriteria};
use slice_core::{QueryPhase, SearchConfig, SessionId};
use slice_data::{CatalogBackend, FetchError};
use slice_observability::{LogCapture, StructuredLogger};
use slice_search::{QueryToken, SearchError, SearchSession};
use tokio::sync::oneshot;

type Reply = Result<Vec<Listing>, FetchError>;

/// Backend whose search responses wait on gates keyed by price ceiling.
#[derive(Default)]
struct ScriptedBackend {
    vocabulary_fails: AtomicBool,
    gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    calls: Mutex<Vec<SearchCriteria>>,
}

impl ScriptedBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn failing_vocabulary() -> Arc<Self> {
        let backend = Self::default();
        backend.vocabulary_fails.store(true, Ordering::SeqCst);
        Arc::new(backend)
    }

    /// Hold the response for a ceiling (in zł) until the sender fires.
    fn gate(&self, ceiling_zl: i64) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(key_for(ceiling_zl * 100), rx);
        tx
    }

    fn calls(&self) -> Vec<SearchCriteria> {
        self.calls.lock().unwrap().clone()
    }
}

fn key_for(cents: i64) -> String {
    format!("ceiling:{cents}")
}

fn criteria_key(criteria: &SearchCriteria) -> String {
    match &criteria.max_price {
        Some(max) => key_for(max.amount_cents),
        None => "ceiling:none".to_string(),
    }
}

fn listing(name: &str) -> Listing {
    Listing::new(name, name, "luka", Money::new(3999, Currency::PLN))
        .circular(32.0)
        .with_weight(550.0)
}

#[async_trait]
impl CatalogBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_facet_vocabulary(&self, city: &CityId) -> Result<FacetVocabulary, FetchError> {
        if self.vocabulary_fails.load(Ordering::SeqCst) {
            return Err(FetchError::Http {
                status: 502,
                url: format!("/cities/{city}/facets"),
            });
        }
        Ok(FacetVocabulary::new(
            city.clone(),
            [
                (
                    FacetKind::Shape,
                    FacetGroup::new().with_shape("round", "Round", ShapeKind::Circular),
                ),
                (FacetKind::Dough, FacetGroup::new().with("thin", "Thin")),
            ],
            NumericBounds {
                price_max: Some(Money::new(10_000, Currency::PLN)),
                ..NumericBounds::default()
            },
        ))
    }

    async fn search_products(&self, criteria: &SearchCriteria) -> Reply {
        self.calls.lock().unwrap().push(criteria.clone());
        let key = criteria_key(criteria);
        let gate = self.gates.lock().unwrap().remove(&key);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(FetchError::Request("gate dropped".into()))),
            None => Ok(vec![listing(&key)]),
        }
    }
}

fn config(cancel_superseded: bool) -> SearchConfig {
    SearchConfig {
        cancel_superseded,
        ..SearchConfig::default()
    }
}

async fn start(backend: Arc<ScriptedBackend>, config: SearchConfig) -> (SearchSession, LogCapture) {
    let capture = LogCapture::new();
    let logger = StructuredLogger::new(SessionId::from_string("test")).with_capture(capture.clone());
    let session = SearchSession::start_with_logger(
        backend,
        PinnedContext::city("krakow"),
        config,
        logger,
    )
    .await
    .unwrap();

    let initial = session.settled().await;
    assert_eq!(initial.phase, QueryPhase::Settled);
    (session, capture)
}

fn zl(amount: i64) -> Option<Money> {
    Some(Money::new(amount * 100, Currency::PLN))
}

/// Let spawned tasks run until `done` holds.
async fn run_until(mut done: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !done() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached");
}

fn names(session: &SearchSession) -> Vec<String> {
    session
        .state()
        .results
        .iter()
        .map(|r| r.listing.name.clone())
        .collect()
}

#[tokio::test]
async fn test_late_response_of_superseded_query_is_discarded() {
    let backend = ScriptedBackend::new();
    let (mut session, capture) = start(backend.clone(), config(false)).await;

    let gate_a = backend.gate(50);
    let gate_b = backend.gate(80);
    let a = session.set_price_ceiling(zl(50)).unwrap().token();
    let b = session.set_price_ceiling(zl(80)).unwrap().token();
    assert!(b > a);

    // B answers first and is published.
    gate_b.send(Ok(vec![listing("from B")])).unwrap();
    let state = session.settled().await;
    assert_eq!(state.results_token, Some(b));
    assert_eq!(names(&session), ["from B"]);

    // A answers afterwards and must not replace B.
    gate_a.send(Ok(vec![listing("from A")])).unwrap();
    let counters = session.counters().clone();
    run_until(|| counters.snapshot().stale_discarded == 1).await;

    let state = session.state();
    assert_eq!(state.token, Some(b));
    assert_eq!(state.results_token, Some(b));
    assert_eq!(names(&session), ["from B"]);
    assert_eq!(capture.with_message("stale response discarded").len(), 1);
}

#[tokio::test]
async fn test_rapid_ceiling_changes_publish_only_the_last() {
    let backend = ScriptedBackend::new();
    let (mut session, _) = start(backend.clone(), config(false)).await;
    let before = session.state().published_sets;

    let gate_50 = backend.gate(50);
    let gate_80 = backend.gate(80);
    let gate_60 = backend.gate(60);
    session.set_price_ceiling(zl(50)).unwrap();
    session.set_price_ceiling(zl(80)).unwrap();
    let last = session.set_price_ceiling(zl(60)).unwrap().token();

    // Arrival order is the reverse of what the user would expect.
    gate_60.send(Ok(vec![listing("ceiling 60")])).unwrap();
    gate_80.send(Ok(vec![listing("ceiling 80")])).unwrap();
    gate_50.send(Ok(vec![listing("ceiling 50")])).unwrap();

    let counters = session.counters().clone();
    run_until(|| {
        let s = counters.snapshot();
        s.published + s.stale_discarded == 4
    })
    .await;

    let state = session.state();
    assert_eq!(state.published_sets, before + 1);
    assert_eq!(state.results_token, Some(last));
    assert_eq!(names(&session), ["ceiling 60"]);
    assert_eq!(
        state.criteria.unwrap().max_price,
        Some(Money::new(6000, Currency::PLN))
    );
}

#[tokio::test]
async fn test_superseded_queries_are_cancelled() {
    let backend = ScriptedBackend::new();
    let (mut session, _) = start(backend.clone(), config(true)).await;

    let _gate_50 = backend.gate(50);
    let _gate_80 = backend.gate(80);
    let gate_60 = backend.gate(60);
    session.set_price_ceiling(zl(50)).unwrap();
    session.set_price_ceiling(zl(80)).unwrap();
    session.set_price_ceiling(zl(60)).unwrap();
    gate_60.send(Ok(vec![listing("ceiling 60")])).unwrap();

    let state = session.settled().await;
    assert_eq!(names(&session), ["ceiling 60"]);
    assert_eq!(state.phase, QueryPhase::Settled);

    let snapshot = session.counters().snapshot();
    assert_eq!(snapshot.cancelled, 2);
    assert_eq!(snapshot.stale_discarded, 0);
}

#[tokio::test]
async fn test_waiting_on_a_superseded_token_returns_immediately() {
    let backend = ScriptedBackend::new();
    let (mut session, _) = start(backend.clone(), config(false)).await;

    // This gate is never released: the query never answers.
    let _never = backend.gate(50);
    let stuck: QueryToken = session.set_price_ceiling(zl(50)).unwrap().token();
    session.set_price_ceiling(zl(70)).unwrap();

    assert_eq!(session.coordinator().wait_until_settled(stuck).await, None);
    assert_eq!(session.settled().await.phase, QueryPhase::Settled);
}

#[tokio::test]
async fn test_dispatch_failure_surfaces_error_without_retry() {
    let backend = ScriptedBackend::new();
    let (mut session, _) = start(backend.clone(), config(true)).await;

    let gate = backend.gate(40);
    session.set_price_ceiling(zl(40)).unwrap();
    gate.send(Err(FetchError::Connection("connection reset".into())))
        .unwrap();

    let state = session.settled().await;
    assert_eq!(state.phase, QueryPhase::Failed);
    assert!(state.results.is_empty());
    assert!(!state.is_no_match());
    assert!(matches!(
        state.error,
        Some(SearchError::SearchDispatchFailure(FetchError::Connection(_)))
    ));
    let calls_after_failure = backend.calls().len();

    // No automatic retry; an explicit refresh re-dispatches the same criteria.
    tokio::task::yield_now().await;
    assert_eq!(backend.calls().len(), calls_after_failure);
    assert!(session.refresh().unwrap().is_dispatched());
    let state = session.settled().await;
    assert_eq!(state.phase, QueryPhase::Settled);
    assert!(state.error.is_none());
    assert_eq!(session.counters().snapshot().failed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_query_times_out() {
    let backend = ScriptedBackend::new();
    let config = SearchConfig {
        search_timeout_ms: 200,
        ..SearchConfig::default()
    };
    let (mut session, _) = start(backend.clone(), config).await;

    let _never = backend.gate(45);
    session.set_price_ceiling(zl(45)).unwrap();

    let state = session.settled().await;
    assert_eq!(state.phase, QueryPhase::Failed);
    assert!(state.error.as_ref().is_some_and(SearchError::is_timeout));
}

#[tokio::test]
async fn test_vocabulary_failure_degrades_filters() {
    let backend = ScriptedBackend::failing_vocabulary();
    let (mut session, capture) = start(backend.clone(), config(true)).await;

    assert!(matches!(
        session.vocabulary_error(),
        Some(SearchError::VocabularyFetchFailure(FetchError::Http { status: 502, .. }))
    ));
    let controls = session.controls();
    assert!(!controls.enabled);
    assert!(controls.error.is_some());
    assert!(controls.groups.iter().all(|g| g.options.is_empty()));
    assert_eq!(
        capture
            .with_message("facet vocabulary unavailable, filters disabled")
            .len(),
        1
    );

    // The initial query still ran, unfiltered, for the pinned city.
    let first = &backend.calls()[0];
    assert_eq!(first.city.as_str(), "krakow");
    assert!(first.is_unfiltered());

    // Selections cannot reference anything while the vocabulary is empty.
    session.toggle_facet(FacetKind::Dough, FacetId::new("thin")).unwrap();
    assert!(session.criteria().unwrap().referenced_facets().is_empty());

    backend.vocabulary_fails.store(false, Ordering::SeqCst);
    assert!(session.retry_vocabulary().await.unwrap());
    assert!(session.controls().enabled);
    assert_eq!(session.criteria().unwrap().referenced_facets().len(), 1);
    session.settled().await;
}

#[tokio::test]
async fn test_unknown_selection_does_not_dispatch() {
    let backend = ScriptedBackend::new();
    let (mut session, _) = start(backend.clone(), config(true)).await;
    let calls = backend.calls().len();

    // Not in the vocabulary: dropped, so the criteria are unchanged.
    let outcome = session
        .toggle_facet(FacetKind::Sauce, FacetId::new("pesto"))
        .unwrap();
    assert!(!outcome.is_dispatched());
    assert_eq!(backend.calls().len(), calls);
}

#[tokio::test]
async fn test_sort_change_redispatches() {
    let backend = ScriptedBackend::new();
    let (mut session, _) = start(backend.clone(), config(true)).await;

    assert!(session.set_sort("profitability").unwrap().is_dispatched());
    session.settled().await;
    let last = backend.calls().pop().unwrap();
    assert_eq!(last.sort.as_str(), "price_per_cm2");
}

#[tokio::test]
async fn test_missing_city_never_reaches_backend() {
    let backend = ScriptedBackend::new();
    let result =
        SearchSession::start(backend.clone(), PinnedContext::city("   "), SearchConfig::default())
            .await;

    assert!(matches!(result, Err(SearchError::MissingContext)));
    assert!(backend.calls().is_empty());
}
