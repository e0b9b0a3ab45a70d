//! Layered configuration loading.
//!
//! The config path is a list of JSON files. Files are applied right to left,
//! so a key in an earlier file overrides the same key in a later one. Nested
//! objects are merged key by key. Missing files are skipped.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::{Map, Value};

use super::settings::{ConfigError, Settings};

/// Selects the deployment environment.
pub const ENV_VAR: &str = "LABELSWEEP_ENV";
/// Extra config files, separated by the platform path separator.
pub const CFG_PATH_VAR: &str = "LABELSWEEP_CFG_PATH";

/// Deployment environment, which picks the base config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Test,
    Staging,
    #[default]
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Staging => "staging",
            Self::Prod => "prod",
        }
    }

    /// Config files that are always consulted, lowest precedence.
    pub fn base_paths(&self) -> Vec<PathBuf> {
        match self {
            Self::Prod | Self::Staging => vec![PathBuf::from("/etc/labelsweep/config.json")],
            Self::Dev | Self::Test => {
                vec![PathBuf::from(format!("etc/config-{}.json", self.as_str()))]
            }
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Self::Dev),
            "test" => Ok(Self::Test),
            "staging" => Ok(Self::Staging),
            "prod" => Ok(Self::Prod),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }
}

/// Builds [`Settings`] from an ordered list of config files.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    environment: Environment,
    paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Reads `LABELSWEEP_ENV` and `LABELSWEEP_CFG_PATH` from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = std::env::var(ENV_VAR).ok();
        let cfg_path = std::env::var_os(CFG_PATH_VAR);
        Self::from_vars(environment.as_deref(), cfg_path)
    }

    /// Like [`from_env`](Self::from_env), with the variables passed in.
    pub fn from_vars(environment: Option<&str>, cfg_path: Option<OsString>) -> Result<Self, ConfigError> {
        let environment = match environment {
            Some(name) => name.parse()?,
            None => Environment::default(),
        };

        let extra = cfg_path
            .map(|value| {
                std::env::split_paths(&value)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self::for_environment(environment, extra))
    }

    /// `extra` files take precedence over the environment's base files.
    pub fn for_environment(environment: Environment, extra: Vec<PathBuf>) -> Self {
        let mut paths = extra;
        paths.extend(environment.base_paths());
        Self { environment, paths }
    }

    /// Adds a file with the highest precedence.
    pub fn with_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(0, path.into());
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Config files in precedence order, highest first.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Reads and merges every existing file into [`Settings`].
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let mut merged = Value::Object(Map::new());

        for path in self.paths.iter().rev() {
            if let Some(layer) = read_layer(path)? {
                tracing::debug!(path = %path.display(), "Applying config file");
                merge(&mut merged, layer);
            }
        }

        serde_json::from_value(merged).map_err(ConfigError::Invalid)
    }
}

fn read_layer(path: &Path) -> Result<Option<Value>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Merges `overlay` into `base`. Objects merge recursively; anything else
/// replaces.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
