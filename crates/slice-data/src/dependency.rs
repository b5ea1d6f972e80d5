//! Dependency tagging for remote calls.

use std::time::Duration;

/// The remote operations the search engine depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyTag {
    /// Facet vocabulary for a city.
    Facets,
    /// Product search.
    Search,
}

impl DependencyTag {
    /// Get the default timeout for this dependency.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Facets => Duration::from_millis(3000),
            Self::Search => Duration::from_millis(5000),
        }
    }

    /// Get the name of this dependency.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Facets => "facets",
            Self::Search => "search",
        }
    }
}

impl std::fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
