//! # Tilt Input
//!
//! Turn accelerometer tilt into a 2D movement vector for tilt-controlled games.
//!
//! This application reads a DualSense controller's motion sensors (or a
//! recorded trace), runs the tilt controller once per frame, and logs the
//! resulting movement vectors.

use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec3;
use tokio::sync::watch;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use tilt_input::config::{Config, LoggingConfig, SensorSource};
use tilt_input::controller::motion::MotionSensor;
use tilt_input::controller::replay::ReplayTrace;
use tilt_input::controller::scheduler::FrameScheduler;
use tilt_input::controller::sensor::{SensorInput, SensorState};
use tilt_input::controller::tilt::TiltController;
use tilt_input::telemetry::{TelemetryLogger, TiltRecord};

/// Config file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// How long to wait for the first live reading before seeding from zero
const FIRST_READING_TIMEOUT: Duration = Duration::from_secs(2);

/// Where this run's accelerometer readings come from
enum FrameSource {
    Live(watch::Receiver<Vec3>),
    Replay(ReplayTrace),
}

impl FrameSource {
    fn open(config: &Config) -> Result<Self> {
        match config.sensor.source {
            SensorSource::Dualsense => {
                let sensor = if config.sensor.device_path.is_empty() {
                    MotionSensor::open()?
                } else {
                    MotionSensor::open_path(&config.sensor.device_path)?
                };
                info!("Reading motion sensors from {}", sensor.device_path());
                Ok(Self::Live(sensor.spawn()))
            }
            SensorSource::Replay => {
                let trace = ReplayTrace::load(&config.sensor.replay_path, config.sensor.replay_loop)?;
                Ok(Self::Replay(trace))
            }
        }
    }

    /// Waits for the reading used to seed the controller.
    async fn first_reading(&mut self) -> Option<Vec3> {
        match self {
            Self::Live(rx) => {
                if tokio::time::timeout(FIRST_READING_TIMEOUT, rx.changed()).await.is_err() {
                    warn!("No motion data within {:?}, seeding from the current value", FIRST_READING_TIMEOUT);
                }
                Some(*rx.borrow())
            }
            Self::Replay(trace) => trace.next_sample().map(|sample| sample.accel),
        }
    }

    /// Returns this frame's reading and, for traces, the recorded frame time.
    ///
    /// `None` means the source is exhausted.
    fn next_reading(&mut self) -> Option<(Vec3, Option<f32>)> {
        match self {
            Self::Live(rx) => {
                if rx.has_changed().is_err() {
                    return None;
                }
                Some((*rx.borrow_and_update(), None))
            }
            Self::Replay(trace) => trace.next_sample().map(|sample| (sample.accel, sample.dt)),
        }
    }
}

/// Main entry point for Tilt Input application
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first CLI argument, or `config/default.toml`)
///    - Set up logging with tracing subscriber
///    - Open the sensor source and seed the tilt controller
///
/// 2. **Main Loop**
///    - Read acceleration and compute the movement vector every frame
///    - Resume the gyro calibration ramp after the controller has run
///    - Write telemetry and log status every `log_interval_frames`
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if the configuration is invalid or the sensor source cannot
/// be opened.
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path)?;
    let _log_guard = init_logging(&config.logging)?;

    info!("Tilt Input v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut source = FrameSource::open(&config)?;
    let mut telemetry = TelemetryLogger::new(&config.telemetry)?;

    let seed = source.first_reading().await.unwrap_or(Vec3::NEG_Y);
    let mut sensors = SensorState::new(seed);
    let mut scheduler = FrameScheduler::new();
    let mut tilt = TiltController::new(&mut sensors, Some(&mut scheduler));
    info!("Tilt controller ready (gyro enabled: {})", sensors.gyro_enabled());

    let mut frame_interval = interval(frame_period(config.frame.rate_hz));
    frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Starting frame loop at {}Hz", config.frame.rate_hz);
    info!("Press Ctrl+C to exit");

    let mut frame: u64 = 0;
    let mut last_frame = Instant::now();

    loop {
        tokio::select! {
            _ = frame_interval.tick() => {
                let now = Instant::now();
                let measured = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;

                let Some((reading, recorded_dt)) = source.next_reading() else {
                    info!("Sensor source finished after {} frames", frame);
                    break;
                };
                let delta_time = recorded_dt.unwrap_or(measured);

                sensors.set_acceleration(reading);
                let output = tilt.input_vector(&sensors, delta_time);
                scheduler.tick(delta_time);

                let record = TiltRecord::now(frame, reading, tilt.down_vector(), output, tilt.is_calibrating());
                if let Err(e) = telemetry.log(&record) {
                    warn!("Failed to write telemetry: {}", e);
                }

                frame += 1;
                if frame % config.frame.log_interval_frames == 0 {
                    info!(
                        "Frame {}: movement ({:.2}, {:.2}), down ({:.2}, {:.2}, {:.2}){}",
                        frame,
                        output.x,
                        output.y,
                        record.down.x,
                        record.down.y,
                        record.down.z,
                        if record.calibrating { " [calibrating]" } else { "" }
                    );
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    telemetry.flush()?;
    info!("Total frames processed: {}", frame);
    Ok(())
}

/// Loads the config file, falling back to defaults when it does not exist.
fn load_config(path: &str) -> Result<Config> {
    if !Path::new(path).exists() {
        eprintln!("Config file {} not found, using defaults", path);
        return Ok(Config::default());
    }
    Config::load(path).with_context(|| format!("Failed to load config from {}", path))
}

/// Installs the tracing subscriber: stdout plus an optional daily log file.
///
/// The returned guard must be held for the life of the program so buffered
/// file output is flushed.
fn init_logging(config: &LoggingConfig) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Invalid log filter")?;

    let (file_layer, guard) = if config.file_dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&config.file_dir, "tilt-input.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Frame period for the given rate.
fn frame_period(rate_hz: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / u64::from(rate_hz.max(1)))
}
