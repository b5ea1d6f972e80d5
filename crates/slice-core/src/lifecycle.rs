//! Query lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Lifecycle phase of the current query.
///
/// A logical query moves `Idle -> Pending -> Settled`, or ends in `Failed`
/// when its dispatch errors out while it is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryPhase {
    /// Nothing dispatched yet.
    #[default]
    Idle,
    /// The current query is in flight.
    Pending,
    /// The current query answered and its results are published.
    Settled,
    /// The current query failed; results are empty and an error is set.
    Failed,
}

impl QueryPhase {
    /// Whether the phase ends a query (no further transition for its token).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Settled => "settled",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for QueryPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing marks for a search session.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time from session start to a mark.
    pub fn offset_of(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }

    /// Time elapsed between two marks, if both were recorded in order.
    pub fn between(&self, from: &str, to: &str) -> Option<Duration> {
        let from = self.marks.get(from)?;
        let to = self.marks.get(to)?;
        to.checked_duration_since(*from)
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(!QueryPhase::Idle.is_terminal());
        assert!(!QueryPhase::Pending.is_terminal());
        assert!(QueryPhase::Settled.is_terminal());
        assert!(QueryPhase::Failed.is_terminal());
    }

    #[test]
    fn test_marks_in_order() {
        let mut timing = TimingContext::new();
        timing.mark("vocabulary_requested");
        timing.mark("vocabulary_ready");
        assert!(timing.between("vocabulary_requested", "vocabulary_ready").is_some());
        assert!(timing.offset_of("vocabulary_ready").is_some());
        assert!(timing.offset_of("missing").is_none());
    }
}
