//! Search module.
//!
//! Holds the user's selection, sort resolution and criteria composition.

mod criteria;
mod selection;
mod sort;

pub use criteria::{CriteriaComposer, PinnedContext, SearchCriteria};
pub use selection::SelectionState;
pub use sort::{SortCode, SortLabel, SortStrategy};
