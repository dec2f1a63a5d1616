//! # Error Types Module
//!
//! Centralized error handling for the fallible edges of the crate.
//! The signal-processing core never errors: insufficient or implausible data
//! resolves to an undetermined estimate instead.
//!
//! ## Error Types
//! - `ConfigError`: Configuration file I/O and parsing errors
//! - `RecorderError`: CSV recording and replay file errors
//! - `SessionError`: Session lifecycle misuse (double start, stop when idle)
//!
//! ## Usage Examples
//! ```rust,ignore
//! // Config module uses ConfigError
//! pub fn load() -> Result<Config, ConfigError> { ... }
//!
//! // Recorder uses RecorderError
//! pub fn start_recording(&self, dir: &Path) -> Result<PathBuf, RecorderError> { ... }
//!
//! // Session uses SessionError
//! pub fn stop(&self) -> Result<FinalEstimate, SessionError> { ... }
//! ```

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read config file
    ReadFailed(std::io::Error),
    /// Failed to write config file
    WriteFailed(std::io::Error),
    /// Failed to parse config file
    ParseFailed(toml::de::Error),
    /// Failed to serialize config
    SerializeFailed(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadFailed(e) => {
                write!(f, "Failed to read config file: {}", e)
            }
            ConfigError::WriteFailed(e) => {
                write!(f, "Failed to write config file: {}", e)
            }
            ConfigError::ParseFailed(e) => {
                write!(f, "Failed to parse config file: {}", e)
            }
            ConfigError::SerializeFailed(e) => {
                write!(f, "Failed to serialize config: {}", e)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadFailed(e) => Some(e),
            ConfigError::WriteFailed(e) => Some(e),
            ConfigError::ParseFailed(e) => Some(e),
            ConfigError::SerializeFailed(e) => Some(e),
        }
    }
}

/// Errors that can occur while recording or reading back sample data
#[derive(Debug)]
pub enum RecorderError {
    /// A recording is already open
    AlreadyRecording,
    /// Output directory could not be created
    CreateDir { path: PathBuf, source: std::io::Error },
    /// File-level I/O failure
    Io(std::io::Error),
    /// CSV encoding or decoding failure
    Csv(csv::Error),
    /// Writer thread is no longer running
    WriterGone,
}

impl fmt::Display for RecorderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecorderError::AlreadyRecording => {
                write!(f, "Recording already in progress")
            }
            RecorderError::CreateDir { path, source } => {
                write!(f, "Failed to create output directory {}: {}", path.display(), source)
            }
            RecorderError::Io(e) => {
                write!(f, "Recording I/O failed: {}", e)
            }
            RecorderError::Csv(e) => {
                write!(f, "Invalid recording data: {}", e)
            }
            RecorderError::WriterGone => {
                write!(f, "Recording writer thread has stopped")
            }
        }
    }
}

impl std::error::Error for RecorderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecorderError::CreateDir { source, .. } => Some(source),
            RecorderError::Io(e) => Some(e),
            RecorderError::Csv(e) => Some(e),
            RecorderError::AlreadyRecording | RecorderError::WriterGone => None,
        }
    }
}

impl From<std::io::Error> for RecorderError {
    fn from(e: std::io::Error) -> Self {
        RecorderError::Io(e)
    }
}

impl From<csv::Error> for RecorderError {
    fn from(e: csv::Error) -> Self {
        RecorderError::Csv(e)
    }
}

/// Errors from driving a measurement session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// `start` called on a running session
    AlreadyRunning,
    /// `stop` called on an idle session
    NotRunning,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::AlreadyRunning => {
                write!(f, "Measurement session is already running")
            }
            SessionError::NotRunning => {
                write!(f, "No measurement session is running")
            }
        }
    }
}

impl std::error::Error for SessionError {}
