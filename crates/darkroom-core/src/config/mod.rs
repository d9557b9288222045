//! Configuration management for Darkroom.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default`, so a missing file or a
//! partial file both yield a complete configuration.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Darkroom.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Processing settings
    pub processing: ProcessingConfig,

    /// Encoded output settings
    pub output: OutputConfig,

    /// Capture-time settings
    pub metadata: MetadataConfig,

    /// Assets directory layout
    pub layout: LayoutConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Ordered variant table
    pub variants: Vec<VariantSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            processing: ProcessingConfig::default(),
            output: OutputConfig::default(),
            metadata: MetadataConfig::default(),
            layout: LayoutConfig::default(),
            limits: LimitsConfig::default(),
            logging: LoggingConfig::default(),
            variants: default_variants(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.darkroom.darkroom/config.toml
    /// - Linux: ~/.config/darkroom/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\darkroom\config\config.toml
    ///
    /// Falls back to ~/.darkroom/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "darkroom", "darkroom")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".darkroom").join("config.toml")
            })
    }

    /// The offset attached to zone-less EXIF timestamps.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_utc_offset(&self.metadata.default_utc_offset)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Parse a `+HH:MM` / `-HH:MM` offset.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    value.trim().parse::<FixedOffset>().map_err(|e| {
        ConfigError::ValidationError(format!(
            "metadata.default_utc_offset {value:?} is not a +HH:MM offset: {e}"
        ))
    })
}

/// Resolved locations for one assets directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    /// Directory enumerated for source photos
    pub source_dir: PathBuf,
    /// Root of the variant tree
    pub generated_dir: PathBuf,
    /// Manifest file
    pub manifest_path: PathBuf,
}

impl AssetLayout {
    /// Resolve the layout names in `config` against an assets directory.
    pub fn resolve(assets_dir: &Path, config: &LayoutConfig) -> Self {
        let generated_dir = assets_dir.join(&config.generated_dir);
        Self {
            source_dir: assets_dir.join(&config.source_dir),
            manifest_path: generated_dir.join(&config.manifest_name),
            generated_dir,
        }
    }
}
