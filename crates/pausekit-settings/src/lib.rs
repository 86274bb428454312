//! pausekit Settings Crate
//!
//! Handles application configuration: pause options, machine capabilities
//! and logging preferences, persisted as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{Config, ConfigFormat, LoggingSettings, APP_DIR, CONFIG_FILE};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
