//! Configuration file support.
//!
//! Overlay settings are stored as versioned JSON, by default under the
//! user's config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_OPACITY, DETECTIONS_SUFFIX, LIKELIHOOD_MAP_SUFFIX};
use crate::format::FormatRegistry;
use crate::projection::PolygonStyle;
use crate::registration::RegistrationPolicy;

/// Log level setting.
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

/// Overlay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Suffix locating a slide's likelihood map
    #[serde(default = "default_likelihood_suffix")]
    pub likelihood_suffix: String,

    /// Suffix locating a slide's detections
    #[serde(default = "default_detections_suffix")]
    pub detections_suffix: String,

    /// Foreground opacity at startup
    #[serde(default = "default_opacity")]
    pub default_opacity: f32,

    /// How strictly base/derived dimensions must agree
    #[serde(default)]
    pub registration_policy: RegistrationPolicy,

    /// Outline style for detections
    #[serde(default)]
    pub polygon_style: PolygonStyle,

    /// Repository format id for detection files
    #[serde(default = "default_annotation_format")]
    pub annotation_format: String,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_likelihood_suffix() -> String {
    LIKELIHOOD_MAP_SUFFIX.to_string()
}

fn default_detections_suffix() -> String {
    DETECTIONS_SUFFIX.to_string()
}

fn default_opacity() -> f32 {
    DEFAULT_OPACITY
}

fn default_annotation_format() -> String {
    FormatRegistry::NATIVE_ID.to_string()
}

impl OverlayConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            likelihood_suffix: default_likelihood_suffix(),
            detections_suffix: default_detections_suffix(),
            default_opacity: default_opacity(),
            registration_policy: RegistrationPolicy::default(),
            polygon_style: PolygonStyle::default(),
            annotation_format: default_annotation_format(),
            log_level: LogLevel::default(),
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
        if !(0.0..=1.0).contains(&config.default_opacity) {
            return Err(ConfigError::Invalid(format!(
                "default_opacity {} is outside [0, 1]",
                config.default_opacity
            )));
        }

        Ok(config)
    }

    /// Read configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Write configuration to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "pathoverlay.json"
    }

    /// Get the default config file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("pathoverlay").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("pathoverlay")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from the default path, falling back to defaults
    /// when the file is missing or unreadable.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}

impl Default for OverlayConfig {
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

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrip() {
        let config = OverlayConfig::new();
        let json = config.to_json().unwrap();
        let loaded = OverlayConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.likelihood_suffix, "_likelihood_map.tif");
        assert_eq!(loaded.detections_suffix, "_detections.xml");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config =
            OverlayConfig::from_json(r#"{"version": 1, "registration_policy": "exact_division"}"#)
                .unwrap();
        assert_eq!(config.registration_policy, RegistrationPolicy::ExactDivision);
        assert_eq!(config.default_opacity, 1.0);
        assert_eq!(config.annotation_format, "asap");
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_newer_version_rejected() {
        let result = OverlayConfig::from_json(r#"{"version": 99}"#);
        assert!(matches!(result, Err(ConfigError::VersionTooNew { .. })));
    }

    #[test]
    fn test_out_of_range_opacity_rejected() {
        let result = OverlayConfig::from_json(r#"{"version": 1, "default_opacity": 1.5}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(OverlayConfig::default_filename());

        let mut config = OverlayConfig::new();
        config.default_opacity = 0.4;
        config.log_level = LogLevel::Debug;
        config.save(&path).unwrap();

        assert_eq!(OverlayConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Info);
    }
}
