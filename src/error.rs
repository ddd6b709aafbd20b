//! # Error Types
//!
//! Custom error types for Tilt Input using `thiserror`.

use thiserror::Error;

/// Main error type for Tilt Input
#[derive(Debug, Error)]
pub enum TiltError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Motion sensor device errors
    #[error("Motion sensor error: {0}")]
    Sensor(String),

    /// No DualSense motion sensor device was found
    #[error("No DualSense motion sensor device found")]
    SensorNotFound,

    /// Malformed line in a recorded trace
    #[error("Replay trace error at line {line}: {source}")]
    Replay {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Telemetry serialization errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] serde_json::Error),
}

/// Result type alias for Tilt Input
pub type Result<T> = std::result::Result<T, TiltError>;
