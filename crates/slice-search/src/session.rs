//! Search sessions.
//!
//! A session is one visit to one city's catalog. It owns the vocabulary,
//! the selection and the coordinator, and runs every change through the same
//! pipeline: selection -> criteria -> coordinator. Changing city means
//! starting a new session.

use std::sync::Arc;
use std::time::Instant;

use slice_catalog::facets::{FacetKind, FacetVocabulary, FilterControls};
use slice_catalog::ids::{CityId, FacetId};
use slice_catalog::money::Money;
use slice_catalog::search::{CriteriaComposer, PinnedContext, SearchCriteria, SelectionState};
use slice_core::{SearchConfig, SessionId, TimingContext};
use slice_data::{with_timeout, CatalogBackend, DependencyTag};
use slice_observability::{SearchCounters, StructuredLogger};
use tokio::sync::watch;

use crate::coordinator::SearchCoordinator;
use crate::error::SearchError;
use crate::state::{SearchState, SubmitOutcome};

/// One city's search session.
pub struct SearchSession {
    id: SessionId,
    city: CityId,
    pinned: PinnedContext,
    backend: Arc<dyn CatalogBackend>,
    config: SearchConfig,
    vocabulary: FacetVocabulary,
    vocabulary_error: Option<SearchError>,
    selection: SelectionState,
    coordinator: SearchCoordinator,
    counters: SearchCounters,
    logger: StructuredLogger,
    timing: TimingContext,
}

impl SearchSession {
    /// Start a session: fetch the vocabulary, then dispatch the initial query.
    ///
    /// Fails only with `MissingContext`. A vocabulary failure degrades the
    /// session to empty filters and is reported by [`Self::vocabulary_error`].
    pub async fn start(
        backend: Arc<dyn CatalogBackend>,
        pinned: PinnedContext,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        let logger = StructuredLogger::new(SessionId::generate()).with_format(config.log_format);
        Self::start_with_logger(backend, pinned, config, logger).await
    }

    /// Start a session that logs through the given logger.
    pub async fn start_with_logger(
        backend: Arc<dyn CatalogBackend>,
        pinned: PinnedContext,
        config: SearchConfig,
        logger: StructuredLogger,
    ) -> Result<Self, SearchError> {
        let selection = SelectionState::with_sort(config.default_sort.clone());
        Self::start_with_selection(backend, pinned, config, logger, selection).await
    }

    /// Start a session whose initial query uses `selection` instead of the
    /// configured default sort alone.
    pub async fn start_with_selection(
        backend: Arc<dyn CatalogBackend>,
        pinned: PinnedContext,
        config: SearchConfig,
        logger: StructuredLogger,
        selection: SelectionState,
    ) -> Result<Self, SearchError> {
        let Some(city) = pinned.resolved_city().cloned() else {
            logger.warn("search session rejected: no city");
            return Err(SearchError::MissingContext);
        };

        let logger = logger.with_city(city.as_str());
        let counters = SearchCounters::new();
        let coordinator = SearchCoordinator::new(
            backend.clone(),
            config.clone(),
            logger.clone(),
            counters.clone(),
        );
        let mut timing = TimingContext::new();
        timing.mark("session_start");

        let mut session = Self {
            id: logger.session_id().clone(),
            selection,
            vocabulary: FacetVocabulary::empty(city.clone()),
            vocabulary_error: None,
            city,
            pinned,
            backend,
            config,
            coordinator,
            counters,
            logger,
            timing,
        };

        session
            .logger
            .info_builder("search session started")
            .field("backend", session.backend.name())
            .emit();
        session.load_vocabulary().await;
        session.refresh()?;
        Ok(session)
    }

    async fn load_vocabulary(&mut self) {
        let started = Instant::now();
        let result = with_timeout(
            self.config.facets_timeout(),
            self.backend.fetch_facet_vocabulary(&self.city),
        )
        .await;
        self.counters
            .record_dependency(DependencyTag::Facets.name(), started.elapsed(), result.is_ok());
        self.timing.mark("vocabulary");

        match result {
            Ok(vocabulary) => {
                self.logger
                    .info_builder("facet vocabulary loaded")
                    .field_bool("empty", vocabulary.is_empty())
                    .duration_ms("latency_ms", started.elapsed())
                    .emit();
                self.vocabulary = vocabulary;
                self.vocabulary_error = None;
            }
            Err(err) => {
                self.logger
                    .warn_builder("facet vocabulary unavailable, filters disabled")
                    .field("error", err.to_string())
                    .emit();
                self.vocabulary = FacetVocabulary::empty(self.city.clone());
                self.vocabulary_error = Some(SearchError::VocabularyFetchFailure(err));
            }
        }
    }

    /// Fetch the vocabulary again after a failure, then re-run the query
    /// with the selection validated against the new vocabulary.
    ///
    /// Returns whether the vocabulary is now available.
    pub async fn retry_vocabulary(&mut self) -> Result<bool, SearchError> {
        self.load_vocabulary().await;
        self.refresh()?;
        Ok(self.vocabulary_error.is_none())
    }

    /// Compose criteria from the current selection.
    pub fn criteria(&self) -> Result<SearchCriteria, SearchError> {
        Ok(CriteriaComposer::compose(
            &self.selection,
            &self.vocabulary,
            &self.pinned,
        )?)
    }

    /// Re-compose and submit the current selection.
    pub fn refresh(&self) -> Result<SubmitOutcome, SearchError> {
        let criteria = self.criteria()?;
        Ok(self.coordinator.submit(criteria))
    }

    /// Apply a selection change and submit the resulting criteria.
    pub fn update<F>(&mut self, change: F) -> Result<SubmitOutcome, SearchError>
    where
        F: FnOnce(&mut SelectionState),
    {
        change(&mut self.selection);
        self.refresh()
    }

    pub fn select_shape(&mut self, shape: Option<FacetId>) -> Result<SubmitOutcome, SearchError> {
        self.update(|s| s.select_shape(shape))
    }

    pub fn toggle_facet(
        &mut self,
        kind: FacetKind,
        id: FacetId,
    ) -> Result<SubmitOutcome, SearchError> {
        self.update(|s| s.toggle(kind, id))
    }

    pub fn set_price_ceiling(
        &mut self,
        ceiling: Option<Money>,
    ) -> Result<SubmitOutcome, SearchError> {
        self.update(|s| s.set_price_ceiling(ceiling))
    }

    pub fn set_diameter_floor(
        &mut self,
        floor_cm: Option<f64>,
    ) -> Result<SubmitOutcome, SearchError> {
        self.update(|s| s.set_diameter_floor(floor_cm))
    }

    pub fn set_rectangle_floor(
        &mut self,
        width_cm: Option<f64>,
        length_cm: Option<f64>,
    ) -> Result<SubmitOutcome, SearchError> {
        self.update(|s| s.set_rectangle_floor(width_cm, length_cm))
    }

    pub fn set_term(&mut self, term: impl Into<String>) -> Result<SubmitOutcome, SearchError> {
        let term = term.into();
        self.update(|s| s.set_term(term))
    }

    /// Change the sort label. The new order comes from a new query.
    pub fn set_sort(&mut self, label: impl Into<String>) -> Result<SubmitOutcome, SearchError> {
        let label = label.into();
        self.update(|s| s.set_sort(label))
    }

    pub fn clear_filters(&mut self) -> Result<SubmitOutcome, SearchError> {
        self.update(SelectionState::clear_filters)
    }

    /// Filter controls for the current vocabulary and selection.
    pub fn controls(&self) -> FilterControls {
        let error = self.vocabulary_error.as_ref().map(ToString::to_string);
        FilterControls::build(&self.vocabulary, &self.selection, error.as_deref())
    }

    /// Watch the published state.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.coordinator.subscribe()
    }

    /// Copy of the published state.
    pub fn state(&self) -> SearchState {
        self.coordinator.state()
    }

    /// Wait for the current query to settle or fail.
    pub async fn settled(&self) -> SearchState {
        self.coordinator.wait_for_current().await
    }

    pub fn coordinator(&self) -> &SearchCoordinator {
        &self.coordinator
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn city(&self) -> &CityId {
        &self.city
    }

    pub fn vocabulary(&self) -> &FacetVocabulary {
        &self.vocabulary
    }

    pub fn vocabulary_error(&self) -> Option<&SearchError> {
        self.vocabulary_error.as_ref()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn counters(&self) -> &SearchCounters {
        &self.counters
    }

    pub fn timing(&self) -> &TimingContext {
        &self.timing
    }

    /// End the session, aborting any in-flight query.
    pub fn end(self) {
        self.coordinator.shutdown();
        let snapshot = self.counters.snapshot();
        self.logger
            .info_builder("search session ended")
            .field_u64("dispatched", snapshot.dispatched)
            .field_u64("published", snapshot.published)
            .field_u64("stale_discarded", snapshot.stale_discarded)
            .duration_ms("duration_ms", self.timing.elapsed())
            .emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use slice_catalog::facets::{FacetGroup, NumericBounds};
    use slice_catalog::listing::{Listing, ShapeKind};
    use slice_core::QueryPhase;
    use slice_data::FetchError;

    struct StaticBackend;

    #[async_trait]
    impl CatalogBackend for StaticBackend {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch_facet_vocabulary(&self, city: &CityId) -> Result<FacetVocabulary, FetchError> {
            Ok(FacetVocabulary::new(
                city.clone(),
                [(
                    FacetKind::Shape,
                    FacetGroup::new().with_shape("round", "Round", ShapeKind::Circular),
                )],
                NumericBounds::default(),
            ))
        }

        async fn search_products(&self, criteria: &SearchCriteria) -> Result<Vec<Listing>, FetchError> {
            let name = criteria.term.clone().unwrap_or_else(|| "any".into());
            Ok(vec![Listing::new(
                "p1",
                name,
                "vendor",
                Money::new(3000, Default::default()),
            )])
        }
    }

    #[tokio::test]
    async fn test_session_dispatches_initial_query() {
        let session = SearchSession::start(
            Arc::new(StaticBackend),
            PinnedContext::city("krakow"),
            SearchConfig::default(),
        )
        .await
        .unwrap();

        let state = session.settled().await;
        assert_eq!(state.phase, QueryPhase::Settled);
        assert_eq!(state.results[0].listing.name, "any");
        assert_eq!(state.criteria.unwrap().city.as_str(), "krakow");
        assert!(session.controls().enabled);
    }

    #[tokio::test]
    async fn test_selection_changes_redispatch() {
        let mut session = SearchSession::start(
            Arc::new(StaticBackend),
            PinnedContext::city("krakow"),
            SearchConfig::default(),
        )
        .await
        .unwrap();

        let outcome = session.set_term("capricciosa").unwrap();
        assert!(outcome.is_dispatched());
        let state = session.settled().await;
        assert_eq!(state.results[0].listing.name, "capricciosa");

        // Same term again composes identical criteria.
        assert!(!session.set_term(" capricciosa ").unwrap().is_dispatched());

        session.select_shape(Some(FacetId::new("round"))).unwrap();
        assert_eq!(
            session.criteria().unwrap().shape,
            Some(FacetId::new("round"))
        );
        session.end();
    }

    #[tokio::test]
    async fn test_initial_selection_is_validated_against_vocabulary() {
        let mut selection = SelectionState::with_sort("price-asc");
        selection.select_shape(Some(FacetId::new("round")));
        selection.set_term("funghi");

        let session = SearchSession::start_with_selection(
            Arc::new(StaticBackend),
            PinnedContext::city("krakow"),
            SearchConfig::default(),
            StructuredLogger::new(SessionId::generate()),
            selection,
        )
        .await
        .unwrap();

        let state = session.settled().await;
        let criteria = state.criteria.unwrap();
        assert_eq!(criteria.shape, Some(FacetId::new("round")));
        assert_eq!(criteria.term.as_deref(), Some("funghi"));
        assert_eq!(criteria.sort.as_str(), "price");
        assert_eq!(session.counters().snapshot().dispatched, 1);
    }

    #[tokio::test]
    async fn test_missing_city_is_rejected() {
        let result = SearchSession::start(
            Arc::new(StaticBackend),
            PinnedContext::default(),
            SearchConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(SearchError::MissingContext)));
    }
}
