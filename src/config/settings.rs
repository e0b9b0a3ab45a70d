//! Runtime settings and their error type.
//!
//! Settings are assembled from layered JSON files by
//! [`ConfigLoader`](super::ConfigLoader).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hint appended to errors about missing configuration.
pub const CONFIG_HELP: &str =
    "Run `sudo cp etc/config-dev.json /etc/labelsweep/config.json` and retry.";

/// Errors from loading or reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("LABELSWEEP_ENV must be one of dev, test, staging, prod (got {0:?})")]
    InvalidEnvironment(String),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(#[source] serde_json::Error),

    #[error("Missing config value for {key}. {help}")]
    Missing { key: &'static str, help: &'static str },
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log verbosity when `RUST_LOG` is unset.
    pub log_level: LogLevel,
    /// Mail store location.
    pub database: DatabaseSettings,
}

impl Settings {
    /// Path of the mail store.
    pub fn database_path(&self) -> Result<&Path, ConfigError> {
        self.database
            .path
            .as_deref()
            .ok_or(ConfigError::Missing {
                key: "database.path",
                help: CONFIG_HELP,
            })
    }
}

/// Mail store settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file holding the mail store.
    pub path: Option<PathBuf>,
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The level as an `EnvFilter` directive.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}
