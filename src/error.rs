//! # Error Types
//!
//! Custom error types for the housekeeping core using `thiserror`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for housekeeping operations
#[derive(Debug, Error)]
pub enum HousekeepingError {
    /// A value does not fit its declared byte width
    #[error("Encoding error: {field} value {value} does not fit in {width} byte(s)")]
    Encoding {
        field: &'static str,
        value: u64,
        width: usize,
    },

    /// Persisted sequence index is unreadable or not a number
    #[error("Sequence index corrupt at {}: {reason}", path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    /// Storage medium unavailable or a write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Downlink frame could not be handed to the transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// None of the configured radio ports could be opened
    #[error("Radio not found (tried: {0})")]
    RadioNotFound(String),

    /// Malformed downlink frame or framing parameters
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Status rendering errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HousekeepingError {
    /// Wrap an I/O failure on `path` as a storage error
    pub fn storage(action: &str, path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Storage(format!("{} {}: {}", action, path.display(), err))
    }
}

/// Result type alias for housekeeping operations
pub type Result<T> = std::result::Result<T, HousekeepingError>;
