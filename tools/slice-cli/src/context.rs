//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use slice_catalog::search::PinnedContext;
use slice_data::{CatalogBackend, FixtureBackend, HttpBackend, TimeoutConfig};

use crate::config::{BackendKind, CliConfig, CONFIG_FILE_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration, with the selected environment applied.
    pub config: CliConfig,
    /// Where the config came from, if a file was found.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from a config file.
    pub fn load(config_path: Option<&str>, env: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = match config_path {
            Some(path) => (CliConfig::load(path)?, Some(PathBuf::from(path))),
            None => match find_config_file(&cwd) {
                Some(path) => (CliConfig::load(&path)?, Some(path)),
                None => (CliConfig::default(), None),
            },
        };

        let config = match env {
            Some(env) => {
                if !config.environments.contains_key(env) {
                    bail!("Unknown environment: {}", env);
                }
                config.for_environment(env)
            }
            None => config,
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Build the configured catalog backend.
    pub fn backend(&self) -> Result<Arc<dyn CatalogBackend>> {
        let backend = &self.config.backend;
        match backend.kind {
            BackendKind::Fixture => {
                let path = self.resolve_path(&backend.fixture_path);
                let mut fixture = FixtureBackend::load(&path)
                    .with_context(|| format!("Failed to load catalog fixture {}", path.display()))?;
                if backend.fixture_latency_ms > 0 {
                    fixture = fixture.with_latency(Duration::from_millis(backend.fixture_latency_ms));
                }
                self.output.debug(&format!("Using fixture catalog {}", path.display()));
                Ok(Arc::new(fixture))
            }
            BackendKind::Http => {
                let Some(base_url) = backend.base_url.as_deref() else {
                    bail!("backend.base_url is required for the http backend");
                };
                let timeouts = TimeoutConfig::from_total(self.config.search.search_timeout());
                let client = HttpBackend::new(base_url, timeouts)?;
                self.output.debug(&format!("Using HTTP catalog {}", client.base_url()));
                Ok(Arc::new(client))
            }
        }
    }

    /// Pin the city from the argument, falling back to the configured default.
    pub fn pinned(&self, city: Option<&str>) -> PinnedContext {
        let city = city.or(self.config.defaults.city.as_deref());
        PinnedContext {
            city: city.map(Into::into),
            previous_term: None,
        }
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}

/// Find a config file in the directory tree.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_FILE_NAMES {
            let candidate = current.join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}
