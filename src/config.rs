//! # Configuration Management Module
//!
//! Persistent measurement settings stored in platform-appropriate locations.
//! Handles loading, saving, and providing defaults for configuration options.
//!
//! ## Settings
//! - `buffer_capacity`: Samples kept per session (sliding window)
//! - `quality_window`: Samples used for each quality variance
//! - `realtime_window`: Samples analysed by each periodic update
//! - `update_interval_ms`: Period of the real-time estimate
//! - `continuous_mode`: Keep measuring once the buffer is full
//! - `recording_dir`: Where CSV recordings go (defaults to Documents)
//!
//! ## Storage Location
//! - macOS: ~/Library/Application Support/ppg-pulse/config.toml
//! - Linux: ~/.config/ppg-pulse/config.toml
//! - Windows: %APPDATA%\ppg-pulse\config.toml

use crate::error::ConfigError;
use crate::quality::DEFAULT_QUALITY_WINDOW;
use crate::timeseries::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub buffer_capacity: usize,
    pub quality_window: usize,
    pub realtime_window: usize,
    pub update_interval_ms: u64,
    pub continuous_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            quality_window: DEFAULT_QUALITY_WINDOW,
            realtime_window: 120,
            update_interval_ms: 500,
            continuous_mode: true,
            recording_dir: None,
        }
    }
}

/// The subset of settings the measurement core runs on
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub capacity: usize,
    pub quality_window: usize,
    pub realtime_window: usize,
    pub update_interval: Duration,
    pub continuous_mode: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Config::default().session()
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ppg-pulse")
            .join("config.toml")
    }

    /// Load config from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing defaults there if the file is missing
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config = toml::from_str(&contents).map_err(ConfigError::ParseFailed)?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.save_to(path)?;
                Ok(config)
            }
            Err(e) => Err(ConfigError::ReadFailed(e)),
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::WriteFailed)?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(ConfigError::SerializeFailed)?;
        fs::write(path, toml_string).map_err(ConfigError::WriteFailed)?;

        Ok(())
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            capacity: self.buffer_capacity.max(1),
            quality_window: self.quality_window.max(1),
            realtime_window: self.realtime_window.max(1),
            update_interval: Duration::from_millis(self.update_interval_ms.max(1)),
            continuous_mode: self.continuous_mode,
        }
    }

    /// Directory for new recordings
    pub fn recording_dir(&self) -> PathBuf {
        self.recording_dir
            .clone()
            .or_else(dirs::document_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
