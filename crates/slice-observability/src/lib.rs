//! Observability for the slicefinder search engine.
//!
//! This crate provides:
//! - `StructuredLogger` - Structured logging with session context
//! - `SearchCounters` - Query outcome counters and dependency timings

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;

// Re-export SessionId and LogFormat from slice-core for convenience
pub use slice_core::{LogFormat, SessionId};
