//! Query coordination.
//!
//! Every dispatch mints a new [`QueryToken`] and makes it current. A response
//! is published only if its token is still current when it arrives; the check
//! and the write happen together under the watch channel's lock, so a late
//! response can never overwrite a newer one. Aborting superseded tasks is
//! only resource hygiene.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::FutureExt;
use slice_catalog::listing::Listing;
use slice_catalog::metrics::{annotate_batch, geometry_issue};
use slice_catalog::search::SearchCriteria;
use slice_core::{QueryPhase, SearchConfig};
use slice_data::{with_timeout, CatalogBackend, DependencyTag, FetchError};
use slice_observability::{SearchCounters, StructuredLogger};
use tokio::sync::watch;
use tokio::task::AbortHandle;

use crate::error::SearchError;
use crate::state::{PublishOutcome, QueryToken, SearchState, SubmitOutcome};

/// Dispatches queries and publishes only the current one's results.
pub struct SearchCoordinator {
    backend: Arc<dyn CatalogBackend>,
    state: Arc<watch::Sender<SearchState>>,
    next_token: AtomicU64,
    inflight: Mutex<Option<(QueryToken, AbortHandle)>>,
    config: SearchConfig,
    counters: SearchCounters,
    logger: StructuredLogger,
}

impl SearchCoordinator {
    pub fn new(
        backend: Arc<dyn CatalogBackend>,
        config: SearchConfig,
        logger: StructuredLogger,
        counters: SearchCounters,
    ) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            backend,
            state: Arc::new(state),
            next_token: AtomicU64::new(0),
            inflight: Mutex::new(None),
            config,
            counters,
            logger,
        }
    }

    /// Submit criteria.
    ///
    /// Criteria equal to the current query's are not re-sent unless that
    /// query failed. Must be called within a Tokio runtime.
    pub fn submit(&self, criteria: SearchCriteria) -> SubmitOutcome {
        // Held for the whole submission so token order and abort order agree.
        let mut inflight = match self.inflight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let token = QueryToken::new(self.next_token.fetch_add(1, Ordering::SeqCst) + 1);
        let mut duplicate_of = None;
        self.state.send_if_modified(|s| {
            if let (Some(current), Some(active)) = (s.token, &s.criteria) {
                if *active == criteria && s.phase != QueryPhase::Failed {
                    duplicate_of = Some(current);
                    return false;
                }
            }

            s.token = Some(token);
            s.criteria = Some(criteria.clone());
            s.phase = QueryPhase::Pending;
            s.error = None;
            true
        });

        if let Some(current) = duplicate_of {
            self.counters.record_deduplicated();
            self.logger
                .debug_builder("query deduplicated")
                .field_u64("token", current.value())
                .emit();
            return SubmitOutcome::Deduplicated(current);
        }

        self.counters.record_dispatched();
        self.logger
            .info_builder("query dispatched")
            .field_u64("token", token.value())
            .field("sort", criteria.sort.as_str())
            .field_json("criteria", &criteria)
            .emit();

        let task = tokio::spawn(run_query(
            self.backend.clone(),
            self.state.clone(),
            token,
            criteria,
            self.config.clone(),
            self.counters.clone(),
            self.logger.clone(),
        ));

        if let Some((previous, handle)) = inflight.replace((token, task.abort_handle())) {
            self.supersede(previous, handle);
        }

        SubmitOutcome::Dispatched(token)
    }

    fn supersede(&self, previous: QueryToken, handle: AbortHandle) {
        if !self.config.cancel_superseded || handle.is_finished() {
            return;
        }
        handle.abort();
        self.counters.record_cancelled();
        self.logger
            .debug_builder("superseded query cancelled")
            .field_u64("token", previous.value())
            .emit();
    }

    /// Watch the published state.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Copy of the published state.
    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// The current token, if anything was dispatched.
    pub fn current_token(&self) -> Option<QueryToken> {
        self.state.borrow().token
    }

    /// Wait until `token` settles or fails.
    ///
    /// Returns `None` as soon as the token is superseded: nothing waits on a
    /// query that can no longer be published.
    pub async fn wait_until_settled(&self, token: QueryToken) -> Option<SearchState> {
        let mut rx = self.state.subscribe();
        loop {
            {
                let state = rx.borrow_and_update();
                if state.token != Some(token) {
                    return None;
                }
                if state.phase.is_terminal() {
                    return Some(state.clone());
                }
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }

    /// Wait until whatever query is current settles or fails.
    pub async fn wait_for_current(&self) -> SearchState {
        loop {
            let Some(token) = self.current_token() else {
                return self.state();
            };
            if let Some(state) = self.wait_until_settled(token).await {
                return state;
            }
        }
    }

    /// Publish a response for `token` if it is still current and unsettled.
    pub fn publish(
        &self,
        token: QueryToken,
        result: Result<Vec<Listing>, FetchError>,
    ) -> PublishOutcome {
        publish(&self.state, token, result)
    }

    pub fn counters(&self) -> &SearchCounters {
        &self.counters
    }

    /// Abort the in-flight query, if any.
    ///
    /// A pending current query is marked failed with
    /// [`SearchError::Cancelled`] so waiters return. Published results are
    /// kept.
    pub fn shutdown(&self) {
        let inflight = match self.inflight.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some((token, handle)) = inflight else {
            return;
        };
        handle.abort();

        let cancelled = self.state.send_if_modified(|s| {
            if s.token != Some(token) || s.phase.is_terminal() {
                return false;
            }
            s.phase = QueryPhase::Failed;
            s.error = Some(SearchError::Cancelled);
            true
        });
        if cancelled {
            self.counters.record_cancelled();
            self.logger
                .debug_builder("pending query cancelled on shutdown")
                .field_u64("token", token.value())
                .emit();
        }
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn publish(
    state: &watch::Sender<SearchState>,
    token: QueryToken,
    result: Result<Vec<Listing>, FetchError>,
) -> PublishOutcome {
    let result = result.map(annotate_batch);
    let mut outcome = PublishOutcome::StaleDiscard;

    state.send_if_modified(|s| {
        if s.token != Some(token) || s.phase.is_terminal() {
            return false;
        }
        match result {
            Ok(results) => {
                s.results = results;
                s.phase = QueryPhase::Settled;
                s.error = None;
                outcome = PublishOutcome::Published;
            }
            Err(err) => {
                s.results = Vec::new();
                s.phase = QueryPhase::Failed;
                s.error = Some(SearchError::SearchDispatchFailure(err));
                outcome = PublishOutcome::Failed;
            }
        }
        s.results_token = Some(token);
        s.published_sets += 1;
        true
    });

    outcome
}

async fn run_query(
    backend: Arc<dyn CatalogBackend>,
    state: Arc<watch::Sender<SearchState>>,
    token: QueryToken,
    criteria: SearchCriteria,
    config: SearchConfig,
    counters: SearchCounters,
    logger: StructuredLogger,
) {
    let started = Instant::now();
    let call = with_timeout(config.search_timeout(), backend.search_products(&criteria));
    let result = match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Request(format!(
            "{} backend panicked",
            backend.name()
        ))),
    };
    let elapsed = started.elapsed();

    if let Ok(listings) = &result {
        for listing in listings {
            if let Some(issue) = geometry_issue(listing) {
                logger
                    .debug_builder("malformed result geometry")
                    .field_u64("token", token.value())
                    .field("listing", listing.id.as_str())
                    .field("issue", issue.to_string())
                    .emit();
            }
        }
    }
    counters.record_dependency(DependencyTag::Search.name(), elapsed, result.is_ok());

    let count = result.as_ref().map(Vec::len).ok();
    let error = result.as_ref().err().cloned();

    match publish(&state, token, result) {
        PublishOutcome::Published => {
            counters.record_published();
            logger
                .info_builder("results published")
                .field_u64("token", token.value())
                .field_u64("count", count.unwrap_or(0) as u64)
                .duration_ms("latency_ms", elapsed)
                .emit();
        }
        PublishOutcome::Failed => {
            counters.record_failed();
            let mut entry = logger
                .error_builder("search failed")
                .field_u64("token", token.value())
                .duration_ms("latency_ms", elapsed);
            if let Some(error) = error {
                entry = entry.field("error", error.to_string());
            }
            entry.emit();
        }
        PublishOutcome::StaleDiscard => {
            counters.record_stale_discard();
            logger
                .debug_builder("stale response discarded")
                .field_u64("token", token.value())
                .duration_ms("latency_ms", elapsed)
                .emit();
        }
    }
}
