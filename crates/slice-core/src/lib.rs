//! Core abstractions for the slicefinder search engine.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `SessionId` - Search session identifier used for log correlation
//! - `QueryPhase` / `TimingContext` - Query lifecycle tracking
//! - `SearchConfig` - Engine configuration (timeouts, cancellation, logging)

mod config;
mod context;
mod lifecycle;

pub use config::*;
pub use context::*;
pub use lifecycle::*;
