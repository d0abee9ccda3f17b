//! Application configuration loaded from TOML.
//!
//! Lookup order: explicit path, then `REGISTRY_LOCK_CONFIG`, then
//! `<config dir>/registry-lock/config.toml`. Only an explicitly named file
//! has to exist; otherwise defaults are used.

use std::path::{Path, PathBuf};
use std::time::Duration;

use registry_lock_core::error::{CoreError, CoreResult};
use registry_lock_core::types::LockConfig;
use serde::{Deserialize, Serialize};

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "REGISTRY_LOCK_CONFIG";

const APP_DIR_NAME: &str = "registry-lock";

fn default_interval_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where outgoing email goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailBackend {
    /// Write to the log only
    #[default]
    Log,
    /// Queue in the database outbox
    Outbox,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelockWorkerConfig {
    /// Seconds between relock sweeps
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for RelockWorkerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl RelockWorkerConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub backend: EmailBackend,
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// `SQLite` database file; defaults to the platform data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub relock_worker: RelockWorkerConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

impl AppConfig {
    /// Load configuration, falling back to defaults when no file is found.
    ///
    /// # Errors
    /// `CoreError::ConfigError` when an explicit file is missing or any file
    /// fails to parse.
    pub fn load(explicit: Option<&Path>) -> CoreResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }

        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                log::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CoreError::ConfigError(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let config = Self::from_toml(&contents).map_err(|e| match e {
            CoreError::ConfigError(msg) => {
                CoreError::ConfigError(format!("{}: {msg}", path.display()))
            }
            other => other,
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> CoreResult<Self> {
        toml::from_str(contents)
            .map_err(|e| CoreError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Configured database path, or the platform default.
    #[must_use]
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// `<config dir>/registry-lock/config.toml`
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("config.toml"))
}

/// `<data dir>/registry-lock/registry-lock.db`, or the working directory
/// when the platform has no data directory.
#[must_use]
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join("registry-lock.db")
}
