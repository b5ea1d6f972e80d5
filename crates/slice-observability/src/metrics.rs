//! Search outcome counters and dependency timings.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timings for one remote dependency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyMetrics {
    /// Completed calls, successful or not.
    pub calls: u64,
    /// Calls that returned an error or timed out.
    pub failures: u64,
    /// Sum of call durations (microseconds).
    pub total_us: u64,
    /// Slowest call (microseconds).
    pub max_us: u64,
}

impl DependencyMetrics {
    /// Mean call duration, if any call completed.
    pub fn mean_us(&self) -> Option<u64> {
        (self.calls > 0).then(|| self.total_us / self.calls)
    }
}

#[derive(Debug, Default)]
struct Counters {
    dispatched: AtomicU64,
    deduplicated: AtomicU64,
    published: AtomicU64,
    stale_discarded: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    dependencies: Mutex<BTreeMap<String, DependencyMetrics>>,
}

/// Shared counters for one search coordinator.
///
/// Cloning is cheap; every clone updates the same counters.
#[derive(Debug, Clone, Default)]
pub struct SearchCounters {
    inner: Arc<Counters>,
}

impl SearchCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// A query was sent to the backend.
    pub fn record_dispatched(&self) {
        self.inner.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// A submission matched the active criteria and was not sent.
    pub fn record_deduplicated(&self) {
        self.inner.deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    /// A response became the visible result set.
    pub fn record_published(&self) {
        self.inner.published.fetch_add(1, Ordering::Relaxed);
    }

    /// A response arrived for a superseded query and was dropped.
    pub fn record_stale_discard(&self) {
        self.inner.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// The active query failed.
    pub fn record_failed(&self) {
        self.inner.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// An in-flight query was aborted because it was superseded.
    pub fn record_cancelled(&self) {
        self.inner.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed dependency call.
    pub fn record_dependency(&self, tag: &str, duration: Duration, success: bool) {
        let Ok(mut dependencies) = self.inner.dependencies.lock() else {
            return;
        };
        let entry = dependencies.entry(tag.to_string()).or_default();
        let micros = duration.as_micros() as u64;
        entry.calls += 1;
        entry.total_us += micros;
        entry.max_us = entry.max_us.max(micros);
        if !success {
            entry.failures += 1;
        }
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> CounterSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CounterSnapshot {
            dispatched: load(&self.inner.dispatched),
            deduplicated: load(&self.inner.deduplicated),
            published: load(&self.inner.published),
            stale_discarded: load(&self.inner.stale_discarded),
            failed: load(&self.inner.failed),
            cancelled: load(&self.inner.cancelled),
            dependencies: self
                .inner
                .dependencies
                .lock()
                .map(|d| d.clone())
                .unwrap_or_default(),
        }
    }
}

/// Serializable copy of [`SearchCounters`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub dispatched: u64,
    pub deduplicated: u64,
    pub published: u64,
    pub stale_discarded: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub dependencies: BTreeMap<String, DependencyMetrics>,
}

impl CounterSnapshot {
    /// Format as JSON (pretty printed).
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut lines = vec![
            format!("  Dispatched:      {}", self.dispatched),
            format!("  Deduplicated:    {}", self.deduplicated),
            format!("  Published:       {}", self.published),
            format!("  Stale discarded: {}", self.stale_discarded),
            format!("  Cancelled:       {}", self.cancelled),
            format!("  Failed:          {}", self.failed),
        ];

        if !self.dependencies.is_empty() {
            lines.push("  Dependencies:".to_string());
            for (tag, dep) in &self.dependencies {
                let mean = dep.mean_us().unwrap_or(0);
                lines.push(format!(
                    "    {}: {} calls, {} failed, mean {:.2}ms, max {:.2}ms",
                    tag,
                    dep.calls,
                    dep.failures,
                    mean as f64 / 1000.0,
                    dep.max_us as f64 / 1000.0
                ));
            }
        }

        lines.join("\n")
    }
}
