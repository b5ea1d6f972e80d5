//! Data access layer for the catalog backend.
//!
//! This crate provides:
//! - `CatalogBackend` - The two remote operations the search engine needs
//! - `HttpBackend` - JSON over HTTP implementation
//! - `FixtureBackend` - In-memory catalog loaded from a JSON file
//! - `DependencyTag` - Which remote operation a call belongs to
//! - `TimeoutConfig` - Per-dependency timeouts

mod backend;
mod client;
mod dependency;
mod fixture;
mod timeout;

pub use backend::*;
pub use client::*;
pub use dependency::*;
pub use fixture::*;
pub use timeout::*;
