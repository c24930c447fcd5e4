use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::subject::Iteration;

/// Helper function for default true value
fn default_true() -> bool {
    true
}

fn default_filter() -> String {
    "info".to_string()
}

/// How subjects notify their listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Walk the live collection or a per-pass snapshot
    #[serde(default)]
    pub iteration: Iteration,

    /// Log a warning when a listener that does not observe the subject's
    /// companion type is attached
    #[serde(default = "default_true")]
    pub warn_on_foreign: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            iteration: Iteration::default(),
            warn_on_foreign: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is not set
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

impl Config {
    /// Default location of the config file, if a home directory can be found
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "metapatterns")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        info!(target: "config", "Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from [`config_path`](Self::config_path), falling back to the
    /// defaults when there is no file there
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }
}
