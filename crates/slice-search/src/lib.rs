//! Search sessions and query coordination.
//!
//! This crate provides:
//! - `SearchSession` - One city's vocabulary, selection and published state
//! - `SearchCoordinator` - Token-based dispatch that never publishes a
//!   superseded query's results
//! - `SearchState` - The published view: phase, results and error flag

mod coordinator;
mod error;
mod session;
mod state;

pub use coordinator::*;
pub use error::*;
pub use session::*;
pub use state::*;
