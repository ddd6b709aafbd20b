//! # DualSense Motion Sensor Module
//!
//! Reads accelerometer data from a PS5 DualSense controller using the Linux
//! evdev interface.
//!
//! ## Device Detection
//!
//! The kernel's `hid-playstation` driver exposes the DualSense IMU as its own
//! input device, separate from the sticks and buttons. It is identified by:
//! - Vendor ID: 0x054c (Sony)
//! - Product ID: 0x0ce6 (DualSense, both wired and Bluetooth)
//! - Device name ending in "Motion Sensors"
//!
//! ## Input Axes
//!
//! - Accelerometer: ABS_X, ABS_Y, ABS_Z (8192 counts per g)
//! - Gyroscope: ABS_RX, ABS_RY, ABS_RZ (ignored here)

use std::path::Path;

use evdev::{AbsoluteAxisType, Device, InputEvent, InputEventKind};
use glam::Vec3;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{Result, TiltError};

/// PS5 DualSense vendor ID (Sony)
const DUALSENSE_VENDOR_ID: u16 = 0x054c;

/// PS5 DualSense product ID (wired and Bluetooth)
const DUALSENSE_PRODUCT_ID: u16 = 0x0ce6;

/// Suffix of the motion sensor device name
const MOTION_SENSORS_SUFFIX: &str = "Motion Sensors";

/// Accelerometer resolution reported by `hid-playstation`
pub const ACCEL_COUNTS_PER_G: f32 = 8192.0;

/// Accumulates accelerometer axis events into a reading in g.
///
/// Axis events arrive one at a time; a full reading is only meaningful after
/// the sync event that closes the report.
///
/// # Examples
///
/// ```
/// use evdev::{AbsoluteAxisType, EventType, InputEvent};
/// use tilt_input::controller::motion::AccelAccumulator;
///
/// let mut accel = AccelAccumulator::new();
/// accel.process_event(&InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_Y.0, -8192));
/// assert_eq!(accel.acceleration().y, -1.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccelAccumulator {
    raw: [i32; 3],
}

impl AccelAccumulator {
    /// Creates an accumulator with all axes at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes one evdev event.
    ///
    /// # Returns
    ///
    /// `true` if the event closed a report (SYN_REPORT), `false` otherwise.
    pub fn process_event(&mut self, event: &InputEvent) -> bool {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                let index = match axis {
                    AbsoluteAxisType::ABS_X => 0,
                    AbsoluteAxisType::ABS_Y => 1,
                    AbsoluteAxisType::ABS_Z => 2,
                    // Gyro axes
                    _ => return false,
                };
                self.raw[index] = event.value();
                false
            }
            InputEventKind::Synchronization(_) => true,
            _ => false,
        }
    }

    /// Current reading in g.
    #[must_use]
    pub fn acceleration(&self) -> Vec3 {
        Vec3::new(
            self.raw[0] as f32,
            self.raw[1] as f32,
            self.raw[2] as f32,
        ) / ACCEL_COUNTS_PER_G
    }
}

/// DualSense motion sensor handle
///
/// Represents an open evdev connection to the DualSense IMU device.
pub struct MotionSensor {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for MotionSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionSensor")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl MotionSensor {
    /// Detect and open the first available DualSense motion sensor device
    ///
    /// Scans all `/dev/input/event*` devices in sorted order.
    ///
    /// # Errors
    ///
    /// - `SensorNotFound`: No DualSense motion sensor device found
    /// - `Sensor`: `/dev/input` missing or unreadable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tilt_input::controller::motion::MotionSensor;
    ///
    /// let sensor = MotionSensor::open()?;
    /// println!("Reading motion from: {}", sensor.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open() -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(TiltError::Sensor("/dev/input directory not found".to_string()));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| TiltError::Sensor(format!("Failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TiltError::Sensor(format!("Failed to read directory entry: {}", e)))?;

        // Deterministic selection when several controllers are connected
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("event"))
                .unwrap_or(false);
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    let id = device.input_id();
                    debug!(
                        "Found input device: {} (vendor: 0x{:04x}, product: 0x{:04x}, name: {:?})",
                        path.display(),
                        id.vendor(),
                        id.product(),
                        device.name()
                    );

                    if is_motion_sensor(id.vendor(), id.product(), device.name()) {
                        let device_path = path.to_string_lossy().to_string();
                        info!("Found DualSense motion sensors at: {}", device_path);
                        return Ok(Self { device, device_path });
                    }
                }
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(TiltError::SensorNotFound)
    }

    /// Open a specific evdev device path
    ///
    /// # Errors
    ///
    /// Returns `Sensor` if the device cannot be opened.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let device = Device::open(path)
            .map_err(|e| TiltError::Sensor(format!("Failed to open {}: {}", path.display(), e)))?;
        let device_path = path.to_string_lossy().to_string();
        info!("Opened motion sensor device at: {}", device_path);
        Ok(Self { device, device_path })
    }

    /// Get the device path of this sensor
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Get the device name from evdev
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Start reading events on a blocking task.
    ///
    /// The returned receiver always holds the latest complete accelerometer
    /// reading. When the device disconnects the reader stops and the sender
    /// is dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(mut self) -> watch::Receiver<Vec3> {
        let (tx, rx) = watch::channel(Vec3::ZERO);

        tokio::task::spawn_blocking(move || {
            let mut accel = AccelAccumulator::new();
            loop {
                let events = match self.device.fetch_events() {
                    Ok(events) => events,
                    Err(e) => {
                        warn!("Motion sensor {} stopped: {}", self.device_path, e);
                        break;
                    }
                };

                for event in events {
                    if accel.process_event(&event) && tx.send(accel.acceleration()).is_err() {
                        debug!("Motion sensor receiver dropped, stopping reader");
                        return;
                    }
                }
            }
        });

        rx
    }
}

/// Returns `true` if the identifiers belong to a DualSense IMU device.
fn is_motion_sensor(vendor: u16, product: u16, name: Option<&str>) -> bool {
    vendor == DUALSENSE_VENDOR_ID
        && product == DUALSENSE_PRODUCT_ID
        && name.is_some_and(|n| n.ends_with(MOTION_SENSORS_SUFFIX))
}
