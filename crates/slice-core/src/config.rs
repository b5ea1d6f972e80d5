//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Output format for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for log aggregation).
    Json,
    /// Human-readable format (for development).
    #[default]
    Human,
}

/// Configuration for a search session and its coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Upper bound for one product search, in milliseconds.
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,

    /// Upper bound for the facet vocabulary fetch, in milliseconds.
    #[serde(default = "default_facets_timeout_ms")]
    pub facets_timeout_ms: u64,

    /// Abort the in-flight task of a superseded query.
    #[serde(default = "default_true")]
    pub cancel_superseded: bool,

    /// Sort label applied when a session starts.
    #[serde(default = "default_sort_label")]
    pub default_sort: String,

    /// Structured log format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_search_timeout_ms() -> u64 {
    5_000
}

fn default_facets_timeout_ms() -> u64 {
    3_000
}

fn default_true() -> bool {
    true
}

fn default_sort_label() -> String {
    "default".to_string()
}

impl SearchConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }

    pub fn facets_timeout(&self) -> Duration {
        Duration::from_millis(self.facets_timeout_ms)
    }

    /// Check the values a session cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("search_timeout_ms"));
        }
        if self.facets_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("facets_timeout_ms"));
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_timeout_ms: default_search_timeout_ms(),
            facets_timeout_ms: default_facets_timeout_ms(),
            cancel_superseded: true,
            default_sort: default_sort_label(),
            log_format: LogFormat::default(),
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: SearchConfig = serde_json::from_str(r#"{"search_timeout_ms": 750}"#).unwrap();
        assert_eq!(config.search_timeout(), Duration::from_millis(750));
        assert_eq!(config.facets_timeout(), Duration::from_millis(3_000));
        assert!(config.cancel_superseded);
        assert_eq!(config.default_sort, "default");
        assert_eq!(config.log_format, LogFormat::Human);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = SearchConfig {
            search_timeout_ms: 0,
            ..SearchConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroTimeout("search_timeout_ms"))
        );
        assert!(SearchConfig::default().validate().is_ok());
    }
}
