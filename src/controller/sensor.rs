//! # Sensor Input Module
//!
//! Abstraction over the host's motion sensor state.
//!
//! The tilt controller never talks to hardware directly. The host loop keeps a
//! [`SensorInput`] up to date (from evdev, a recorded trace, or a test double)
//! and hands it to the controller once per frame.

use glam::Vec3;

/// Read access to accelerometer state plus the gyro enable switch.
#[cfg_attr(test, mockall::automock)]
pub trait SensorInput {
    /// Latest acceleration reading in g, in device space.
    fn acceleration(&self) -> Vec3;

    /// Whether the gyroscope is currently enabled.
    fn gyro_enabled(&self) -> bool;

    /// Enable or disable the gyroscope.
    fn set_gyro_enabled(&mut self, enabled: bool);
}

/// In-memory sensor state updated by the host loop.
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use tilt_input::controller::sensor::{SensorInput, SensorState};
///
/// let mut sensors = SensorState::new(Vec3::new(0.0, -1.0, 0.0));
/// assert!(!sensors.gyro_enabled());
///
/// sensors.set_acceleration(Vec3::new(0.0, -0.7, -0.7));
/// assert_eq!(sensors.acceleration(), Vec3::new(0.0, -0.7, -0.7));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorState {
    acceleration: Vec3,
    gyro_enabled: bool,
}

impl SensorState {
    /// Creates a sensor state with the given reading and the gyro disabled.
    #[must_use]
    pub fn new(acceleration: Vec3) -> Self {
        Self {
            acceleration,
            gyro_enabled: false,
        }
    }

    /// Replaces the current acceleration reading.
    pub fn set_acceleration(&mut self, acceleration: Vec3) {
        self.acceleration = acceleration;
    }
}

impl SensorInput for SensorState {
    fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    fn gyro_enabled(&self) -> bool {
        self.gyro_enabled
    }

    fn set_gyro_enabled(&mut self, enabled: bool) {
        self.gyro_enabled = enabled;
    }
}
