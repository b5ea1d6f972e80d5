//! Published search state.

use std::fmt;

use serde::{Serialize, Serializer};
use slice_catalog::metrics::AnnotatedListing;
use slice_catalog::search::SearchCriteria;
use slice_core::QueryPhase;

use crate::error::SearchError;

/// Handle of one dispatched query. Tokens increase with dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct QueryToken(u64);

impl QueryToken {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the presentation layer sees.
///
/// `token` is the current query; `results_token` is the query the visible
/// results belong to. While a newer query is pending the previous results
/// stay visible and `phase` is `Pending`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchState {
    pub token: Option<QueryToken>,
    pub phase: QueryPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<SearchCriteria>,
    pub results: Vec<AnnotatedListing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_token: Option<QueryToken>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<SearchError>,
    /// Number of result sets published so far.
    pub published_sets: u64,
}

fn serialize_error<S: Serializer>(error: &Option<SearchError>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => s.serialize_str(&error.to_string()),
        None => s.serialize_none(),
    }
}

impl SearchState {
    pub fn is_loading(&self) -> bool {
        self.phase == QueryPhase::Pending
    }

    /// Settled with zero results. Distinct from a failed query.
    pub fn is_no_match(&self) -> bool {
        self.phase == QueryPhase::Settled && self.results.is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of trying to publish a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The response became the visible result set.
    Published,
    /// The current query failed and the error state was published.
    Failed,
    /// The token was superseded; nothing changed.
    StaleDiscard,
}

/// Result of submitting criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A new query was dispatched under this token.
    Dispatched(QueryToken),
    /// The criteria equal the current query's; nothing was sent.
    Deduplicated(QueryToken),
}

impl SubmitOutcome {
    /// The token now current.
    pub fn token(&self) -> QueryToken {
        match self {
            SubmitOutcome::Dispatched(token) | SubmitOutcome::Deduplicated(token) => *token,
        }
    }

    pub fn is_dispatched(&self) -> bool {
        matches!(self, SubmitOutcome::Dispatched(_))
    }
}
