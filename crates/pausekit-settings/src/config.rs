//! Configuration management for pausekit
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats, selected by file extension.
//!
//! Configuration is organized into sections:
//! - Pause options (trigger, parking, retraction, feedback)
//! - Machine capabilities (firmware retract, temperature control)
//! - Logging preferences

use pausekit_gcode::pause::{MachineCapabilities, PauseAt, PauseOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Directory under the platform config dir holding pausekit files
pub const APP_DIR: &str = "pausekit";

/// Default config file name
pub const CONFIG_FILE: &str = "config.toml";

/// Config file encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a path's extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Logging preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Pause options
    pub pause: PauseOptions,
    /// Printer capabilities
    pub machine: MachineCapabilities,
    /// Logging preferences
    pub logging: LoggingSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform default location, `<config_dir>/pausekit/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load from `path`, or from the default location if it exists, or
    /// fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Save config to file (JSON or TOML)
    ///
    /// Missing parent directories are created.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(|e| {
            SettingsError::SaveError(format!("{}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let pause = &self.pause;

        require_finite("pause.pause_height", pause.pause_height)?;
        if pause.pause_at == PauseAt::Height && pause.pause_height < 0.0 {
            return Err(ConfigError::out_of_range(
                "pause.pause_height",
                pause.pause_height,
            ));
        }
        require_finite("pause.head_park_x", pause.head_park_x)?;
        require_finite("pause.head_park_y", pause.head_park_y)?;
        require_non_negative("pause.retraction_amount", pause.retraction_amount)?;
        require_positive("pause.retraction_speed", pause.retraction_speed)?;
        require_non_negative("pause.extrude_amount", pause.extrude_amount)?;
        require_positive("pause.extrude_speed", pause.extrude_speed)?;
        require_non_negative("pause.standby_temperature", pause.standby_temperature)?;

        if pause.display_text.contains(['\n', '\r']) {
            return Err(ConfigError::InvalidSetting {
                key: "pause.display_text".to_string(),
                reason: "must be a single line".to_string(),
            });
        }

        require_positive(
            "machine.initial_layer_height",
            self.machine.initial_layer_height,
        )?;

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "logging.level".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

fn require_finite(key: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(key, value))
    }
}

fn require_non_negative(key: &str, value: f64) -> ConfigResult<()> {
    require_finite(key, value)?;
    if value < 0.0 {
        return Err(ConfigError::out_of_range(key, value));
    }
    Ok(())
}

fn require_positive(key: &str, value: f64) -> ConfigResult<()> {
    require_finite(key, value)?;
    if value <= 0.0 {
        return Err(ConfigError::out_of_range(key, value));
    }
    Ok(())
}
