//! # Configuration Management
//!
//! This module handles loading and validating configuration from the
//! beach-profile.toml file. The configuration is read once at startup and
//! passed explicitly to the collaborators that need it: the object store gets
//! [`StorageConfig`], the renderer [`RenderConfig`], the service
//! [`BatchConfig`]. Nothing reads the environment behind the caller's back.
//!
//! The Miche breaking index is a constant in [`crate::wave_break`], not a
//! setting.

use crate::planner::BatchPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "beach-profile.toml";

/// Bounds on each side of a rendered image, in pixels.
pub const MIN_RENDER_SIDE: u32 = 100;
pub const MAX_RENDER_SIDE: u32 = 10_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config format: {0}")]
    Format(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A required setting is empty or out of range
    #[error("{field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Application configuration loaded from beach-profile.toml
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Object store location
    pub storage: StorageConfig,
    /// Image output settings
    pub render: RenderConfig,
    /// Batch execution settings
    pub batch: BatchConfig,
}

/// Directory-backed object store settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory that holds the buckets
    pub root: PathBuf,
    /// Bucket holding survey inputs and rendered outputs
    pub bucket: String,
    /// Key prefix for rendered profile images
    pub output_prefix: String,
}

/// PNG output settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

/// Batch execution settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// What to do with the remaining units after one fails
    pub policy: BatchPolicy,
    /// Evaluate units on the rayon pool
    pub parallel: bool,
    /// Name of the wave-height column in wave data files
    pub wave_height_column: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            root: PathBuf::from("./storage"),
            bucket: "beach-profiles".to_string(),
            output_prefix: "outputs/images".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        // 10 x 5 inch figure at 100 dpi
        RenderConfig {
            width: 1000,
            height: 500,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            policy: BatchPolicy::Abort,
            parallel: true,
            wave_height_column: "height".to_string(),
        }
    }
}

impl StorageConfig {
    /// Build a validated storage configuration.
    pub fn new(
        root: impl Into<PathBuf>,
        bucket: impl Into<String>,
        output_prefix: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = StorageConfig {
            root: root.into(),
            bucket: bucket.into(),
            output_prefix: output_prefix.into(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(invalid("storage.root", "must not be empty"));
        }
        if self.bucket.trim().is_empty() {
            return Err(invalid("storage.bucket", "must not be empty"));
        }
        let separator = |c: char| c == '/' || c == '\\';
        if self.bucket.contains(separator) || self.bucket == "." || self.bucket == ".." {
            return Err(invalid(
                "storage.bucket",
                format!("'{}' is not a valid bucket name", self.bucket),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from beach-profile.toml
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to the default configuration if the file doesn't exist;
    /// a file that exists but does not parse or validate is an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match fs::read_to_string(path) {
            Ok(contents) => {
                let config = toml::from_str::<Config>(&contents)?;
                info!(path = %path.display(), bucket = %config.storage.bucket, "loaded configuration");
                config
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every required field once, at construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()?;
        let (width, height) = (self.render.width, self.render.height);
        if !(MIN_RENDER_SIDE..=MAX_RENDER_SIDE).contains(&width)
            || !(MIN_RENDER_SIDE..=MAX_RENDER_SIDE).contains(&height)
        {
            return Err(invalid(
                "render",
                format!(
                    "{width}x{height} is out of range \
                     ({MIN_RENDER_SIDE}..={MAX_RENDER_SIDE} pixels per side)"
                ),
            ));
        }
        if self.batch.wave_height_column.trim().is_empty() {
            return Err(invalid("batch.wave_height_column", "must not be empty"));
        }
        Ok(())
    }

    /// Save current configuration
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
