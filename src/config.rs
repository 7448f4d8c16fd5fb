//! Configuration file support.
//!
//! Every tunable of the engine (minimum drawing size, duplicate tolerance,
//! undo capacity, zoom bounds and step, keybindings) comes from here rather
//! than being hardcoded in the engine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_AUTOSAVE_DEBOUNCE_MS, zoom};
use crate::drawing::DrawingConfig;
use crate::keybindings::KeyBindings;
use crate::predictions::PredictionConfig;
use crate::undo::UndoConfig;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Zoom bounds and step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomConfig {
    #[serde(default = "default_zoom_min")]
    pub min: f64,
    #[serde(default = "default_zoom_max")]
    pub max: f64,
    #[serde(default = "default_zoom_step")]
    pub step: f64,
}

fn default_zoom_min() -> f64 {
    zoom::MIN
}

fn default_zoom_max() -> f64 {
    zoom::MAX
}

fn default_zoom_step() -> f64 {
    zoom::STEP
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: default_zoom_min(),
            max: default_zoom_max(),
            step: default_zoom_step(),
        }
    }
}

/// Autosave timing used by hosts that drive [`crate::auto_save::AutoSaveManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSaveConfig {
    #[serde(default = "default_autosave_enabled")]
    pub enabled: bool,
    /// Quiescence window after the last change, in milliseconds.
    #[serde(default = "default_autosave_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_autosave_enabled() -> bool {
    true
}

fn default_autosave_debounce_ms() -> u64 {
    DEFAULT_AUTOSAVE_DEBOUNCE_MS
}

impl AutoSaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: default_autosave_enabled(),
            debounce_ms: default_autosave_debounce_ms(),
        }
    }
}

/// Engine configuration that can be exported and imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub drawing: DrawingConfig,

    #[serde(default)]
    pub predictions: PredictionConfig,

    #[serde(default)]
    pub undo: UndoConfig,

    #[serde(default)]
    pub zoom: ZoomConfig,

    #[serde(default)]
    pub autosave: AutoSaveConfig,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Keybinding configuration
    #[serde(default)]
    pub keybindings: KeyBindings,
}

impl EngineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            drawing: DrawingConfig::default(),
            predictions: PredictionConfig::default(),
            undo: UndoConfig::default(),
            zoom: ZoomConfig::default(),
            autosave: AutoSaveConfig::default(),
            log_level: LogLevel::default(),
            keybindings: KeyBindings::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min_size = self.drawing.min_drawing_size_px;
        if !min_size.is_finite() || min_size < 0.0 {
            return Err(ConfigError::invalid(
                "drawing.min_drawing_size_px",
                format!("must be a non-negative number, got {min_size}"),
            ));
        }

        let tolerance = self.predictions.duplicate_tolerance;
        if !tolerance.is_finite() || !(0.0..=1.0).contains(&tolerance) {
            return Err(ConfigError::invalid(
                "predictions.duplicate_tolerance",
                format!("must be within [0, 1], got {tolerance}"),
            ));
        }

        let ZoomConfig { min, max, step } = self.zoom;
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(ConfigError::invalid(
                "zoom",
                format!("bounds must satisfy 0 < min <= max, got [{min}, {max}]"),
            ));
        }
        if !step.is_finite() || step <= 0.0 {
            return Err(ConfigError::invalid(
                "zoom.step",
                format!("must be positive, got {step}"),
            ));
        }

        Ok(())
    }

    /// Get the default filename for config export.
    pub fn default_filename() -> &'static str {
        "smoke-annotator-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("smoke-annotator").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("smoke-annotator")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load and validate a configuration file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from_path(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to_path(&path)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// A value is outside the range the engine accepts
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.drawing.min_drawing_size_px, 10.0);
        assert_eq!(config.predictions.duplicate_tolerance, 0.05);
        assert_eq!(config.undo.capacity, 50);
        assert_eq!(config.zoom, ZoomConfig { min: 1.0, max: 4.0, step: 0.2 });
        assert_eq!(config.autosave.debounce(), Duration::from_secs(2));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = EngineConfig::default();
        config.undo.capacity = 12;
        config.log_level = LogLevel::Debug;
        let json = config.to_json().unwrap();
        let back = EngineConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let config = EngineConfig::from_json(r#"{"version":1,"zoom":{"max":8.0}}"#).unwrap();
        assert_eq!(config.zoom.max, 8.0);
        assert_eq!(config.zoom.min, 1.0);
        assert_eq!(config.undo.capacity, 50);
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = EngineConfig::from_json(r#"{"version":99}"#).unwrap_err();
        assert!(matches!(err, ConfigError::VersionTooNew { file_version: 99, .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            r#"{"version":1,"zoom":{"min":3.0,"max":2.0}}"#,
            r#"{"version":1,"zoom":{"step":0.0}}"#,
            r#"{"version":1,"predictions":{"duplicate_tolerance":-0.1}}"#,
            r#"{"version":1,"drawing":{"min_drawing_size_px":-5.0}}"#,
        ];
        for json in cases {
            let err = EngineConfig::from_json(json).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }), "{json}");
        }
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = EngineConfig::default();
        config.predictions.duplicate_tolerance = 0.1;
        config.save_to_path(&path).unwrap();

        let loaded = EngineConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.predictions.duplicate_tolerance, 0.1);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load_from_path(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
        assert_eq!(LogLevel::default().name(), "Info");
    }
}
