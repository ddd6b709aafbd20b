//! # Telemetry Module
//!
//! Records per-frame tilt telemetry to JSONL files with rotation.
//!
//! This module handles:
//! - Capturing each frame's reading, down-vector and output
//! - Formatting as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Managing file rotation (max N records per file)
//! - Retaining only last M files

pub mod logger;
pub mod types;

pub use logger::TelemetryLogger;
pub use types::TiltRecord;
