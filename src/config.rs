//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! The tilt tuning constants are compile-time constants in
//! [`crate::controller::tilt`] and [`crate::controller::calibration`]; this
//! file only configures the host: where readings come from, how fast frames
//! run, and where logs and telemetry go.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::{Result, TiltError};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where accelerometer readings come from
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SensorSource {
    /// DualSense motion sensors via evdev
    #[default]
    Dualsense,
    /// Recorded JSONL trace
    Replay,
}

/// Sensor configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SensorConfig {
    #[serde(default)]
    pub source: SensorSource,

    /// evdev path; empty means auto-detect
    #[serde(default)]
    pub device_path: String,

    #[serde(default)]
    pub replay_path: String,

    #[serde(default)]
    pub replay_loop: bool,
}

/// Frame loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FrameConfig {
    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,

    #[serde(default = "default_log_interval_frames")]
    pub log_interval_frames: u64,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Diagnostic logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files; empty means stdout only
    #[serde(default)]
    pub file_dir: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
            log_interval_frames: default_log_interval_frames(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            format: default_log_format(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_dir: String::new(),
        }
    }
}

// Default value functions
fn default_rate_hz() -> u32 { 60 }
fn default_log_interval_frames() -> u64 { 300 }

fn default_telemetry_enabled() -> bool { false }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_format() -> String { "jsonl".to_string() }

fn default_log_level() -> String { "info".to_string() }

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tilt_input::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.sensor.source == SensorSource::Replay && self.sensor.replay_path.is_empty() {
            return Err(invalid("replay_path cannot be empty when source is 'replay'"));
        }

        if self.frame.rate_hz == 0 || self.frame.rate_hz > 1000 {
            return Err(invalid("rate_hz must be between 1 and 1000"));
        }

        if self.frame.log_interval_frames == 0 {
            return Err(invalid("log_interval_frames must be greater than 0"));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "logging level must be one of: {}",
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> TiltError {
    TiltError::Config(toml::de::Error::custom(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sensor.source, SensorSource::Dualsense);
        assert_eq!(config.frame.rate_hz, 60);
        assert!(!config.telemetry.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.frame.rate_hz, default_rate_hz());
        assert_eq!(config.telemetry.log_dir, default_log_dir());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[sensor]
source = "replay"
replay_path = "traces/tilt_left.jsonl"
replay_loop = true

[frame]
rate_hz = 120

[telemetry]
enabled = true

[logging]
level = "debug"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.sensor.source, SensorSource::Replay);
        assert!(config.sensor.replay_loop);
        assert_eq!(config.frame.rate_hz, 120);
        assert!(config.telemetry.enabled);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/tilt.toml");
        assert!(matches!(result, Err(TiltError::Io(_))));
    }

    #[test]
    fn test_unknown_source_rejected() {
        let result = Config::from_toml("[sensor]\nsource = \"joystick\"\n");
        assert!(matches!(result, Err(TiltError::Config(_))));
    }

    #[test]
    fn test_replay_without_path() {
        let mut config = Config::default();
        config.sensor.source = SensorSource::Replay;
        assert!(config.validate().is_err());

        config.sensor.replay_path = "trace.jsonl".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rate_hz_zero() {
        let mut config = Config::default();
        config.frame.rate_hz = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_hz_too_high() {
        let mut config = Config::default();
        config.frame.rate_hz = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_interval_frames_zero() {
        let mut config = Config::default();
        config.frame.log_interval_frames = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_enabled() {
        let mut config = Config::default();
        config.telemetry.enabled = true;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_disabled() {
        let mut config = Config::default();
        config.telemetry.enabled = false;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_records_per_file_zero() {
        let mut config = Config::default();
        config.telemetry.max_records_per_file = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_files_to_keep_zero() {
        let mut config = Config::default();
        config.telemetry.max_files_to_keep = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.telemetry.format = "csv".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_log_levels() {
        for level in LOG_LEVELS {
            let mut config = Config::default();
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "level {} should be valid", level);
        }
    }
}
