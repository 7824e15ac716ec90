//! Configuration for metricplan.
//!
//! TOML-based; every table is optional and falls back to built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MetricplanError, Result};
use crate::naming::NamingScheme;
use crate::specs::TimeGranularity;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricplanConfig {
    pub naming: NamingConfig,
    pub logging: LoggingConfig,
    pub models: ModelsConfig,
}

/// Column naming configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Granularity left off time-dimension column names (default: day).
    pub default_time_granularity: TimeGranularity,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: String,
}

/// Semantic model location.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory of semantic model YAML files.
    pub dir: Option<PathBuf>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            default_time_granularity: TimeGranularity::Day,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "metricplan=info".to_string(),
        }
    }
}

impl MetricplanConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| MetricplanError::Config(format!("failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| MetricplanError::Config(format!("failed to parse config: {e}")))
    }

    /// Load from default locations (env var, cwd, user config dir, or defaults).
    ///
    /// Search order:
    /// 1. `METRICPLAN_CONFIG` environment variable
    /// 2. `./metricplan.toml` (current directory)
    /// 3. `~/.config/metricplan/config.toml` (user config dir)
    /// 4. Built-in defaults
    pub fn load_default() -> Self {
        if let Ok(path) = std::env::var("METRICPLAN_CONFIG") {
            match Self::from_file(&path) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "loaded config from METRICPLAN_CONFIG");
                    return cfg;
                }
                Err(err) => tracing::warn!(path = %path, error = %err, "ignoring METRICPLAN_CONFIG"),
            }
        }

        if let Ok(cfg) = Self::from_file("metricplan.toml") {
            tracing::info!("loaded config from ./metricplan.toml");
            return cfg;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("metricplan").join("config.toml");
            if let Ok(cfg) = Self::from_file(&user_config) {
                tracing::info!(path = %user_config.display(), "loaded config from user config dir");
                return cfg;
            }
        }

        tracing::debug!("no config file found, using defaults");
        Self::default()
    }

    /// Naming scheme the column association resolver should use.
    pub fn naming_scheme(&self) -> NamingScheme {
        NamingScheme::new(self.naming.default_time_granularity)
    }
}
