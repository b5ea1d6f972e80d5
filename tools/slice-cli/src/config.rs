//! CLI configuration.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use slice_catalog::money::Currency;
use slice_core::SearchConfig;

/// Config file names looked up from the working directory upwards.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["slicefinder.toml", ".slicefinder.toml", "slicefinder.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Where the catalog comes from.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Session and coordinator settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Defaults for command arguments.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Log filtering.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Get environment-specific config.
    pub fn for_environment(&self, env: &str) -> CliConfig {
        let mut config = self.clone();

        if let Some(env_config) = self.environments.get(env) {
            if let Some(ref backend) = env_config.backend {
                config.backend = backend.clone();
            }
            if let Some(ref search) = env_config.search {
                config.search = search.clone();
            }
        }

        config
    }

    /// Check the configuration, returning (errors, warnings).
    pub fn check(&self) -> (Vec<String>, Vec<String>) {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if let Err(e) = self.search.validate() {
            errors.push(format!("search.{}", e));
        }

        match self.backend.kind {
            BackendKind::Http => match self.backend.base_url.as_deref() {
                None | Some("") => errors.push("backend.base_url is required for http".to_string()),
                Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                    errors.push(format!("backend.base_url '{}' must be an http(s) URL", url))
                }
                Some(_) => {}
            },
            BackendKind::Fixture => {
                if self.backend.fixture_path.is_empty() {
                    errors.push("backend.fixture_path is required for fixture".to_string());
                }
            }
        }

        if self.search.search_timeout_ms > 30_000 {
            warnings.push(format!(
                "search.search_timeout_ms = {} keeps a stuck query pending for a long time",
                self.search.search_timeout_ms
            ));
        }

        if self.defaults.city.as_deref().map_or(true, |c| c.trim().is_empty()) {
            warnings.push("defaults.city is not set; pass --city to every search".to_string());
        }

        if slice_catalog::search::SortLabel::parse(&self.search.default_sort).is_none() {
            warnings.push(format!(
                "search.default_sort '{}' is not a known sort label; the default order is used",
                self.search.default_sort
            ));
        }

        (errors, warnings)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "json")
}

/// Catalog backend kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// JSON fixture file.
    #[default]
    Fixture,
    /// Remote HTTP catalog.
    Http,
}

/// Backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Fixture file, relative to the working directory.
    #[serde(default = "default_fixture_path")]
    pub fixture_path: String,

    /// Simulated fixture latency in milliseconds.
    #[serde(default)]
    pub fixture_latency_ms: u64,

    /// Base URL of the HTTP catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_fixture_path() -> String {
    "fixtures/catalog.json".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            fixture_path: default_fixture_path(),
            fixture_latency_ms: 0,
            base_url: None,
        }
    }
}

/// Defaults applied when arguments are omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// City searched when `--city` is omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// Currency of prices typed on the command line.
    #[serde(default)]
    pub currency: Currency,
}

/// Log filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `SLICE_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub backend: Option<BackendConfig>,
    #[serde(default)]
    pub search: Option<SearchConfig>,
}

/// Generate a default slicefinder.toml config file.
pub fn generate_default_config(city: &str) -> String {
    format!(
        r#"# slicefinder configuration

[backend]
kind = "fixture"
fixture_path = "fixtures/catalog.json"
fixture_latency_ms = 0
# kind = "http"
# base_url = "https://api.example.com/v1"

[search]
search_timeout_ms = 5000
facets_timeout_ms = 3000
cancel_superseded = true
default_sort = "default"
log_format = "human"

[defaults]
city = "{city}"
currency = "PLN"

[logging]
level = "warn"

[environments.slow]
[environments.slow.backend]
kind = "fixture"
fixture_path = "fixtures/catalog.json"
fixture_latency_ms = 800
"#,
        city = city
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_parses_and_validates() {
        let config: CliConfig = toml::from_str(&generate_default_config("krakow")).unwrap();
        assert_eq!(config.defaults.city.as_deref(), Some("krakow"));
        assert_eq!(config.backend.kind, BackendKind::Fixture);
        assert_eq!(config.search.search_timeout_ms, 5000);

        let (errors, warnings) = config.check();
        assert!(errors.is_empty(), "{errors:?}");
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_environment_override() {
        let config: CliConfig = toml::from_str(&generate_default_config("krakow")).unwrap();
        let slow = config.for_environment("slow");
        assert_eq!(slow.backend.fixture_latency_ms, 800);
        assert_eq!(config.for_environment("missing").backend.fixture_latency_ms, 0);
    }

    #[test]
    fn test_http_backend_requires_url() {
        let mut config = CliConfig::default();
        config.backend.kind = BackendKind::Http;
        let (errors, _) = config.check();
        assert_eq!(errors, ["backend.base_url is required for http"]);

        config.backend.base_url = Some("ftp://catalog".into());
        let (errors, _) = config.check();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_save_and_load_round_trip_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CliConfig::default();
        config.defaults.city = Some("gdansk".into());

        for name in ["slicefinder.toml", "slicefinder.json"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            let loaded = CliConfig::load(&path).unwrap();
            assert_eq!(loaded.defaults.city.as_deref(), Some("gdansk"));
        }
    }
}
