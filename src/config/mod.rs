//! Configuration and settings management.
//!
//! Settings are read from layered JSON files selected by the deployment
//! environment; see [`ConfigLoader`].

mod loader;
mod settings;

pub use loader::{ConfigLoader, Environment, CFG_PATH_VAR, ENV_VAR};
pub use settings::{ConfigError, DatabaseSettings, LogLevel, Settings, CONFIG_HELP};
