//! # Controller Module
//!
//! Player input controllers and the sensor plumbing behind them.
//!
//! This module handles:
//! - Abstracting accelerometer/gyro state behind [`sensor::SensorInput`]
//! - Running per-frame routines on a cooperative [`scheduler::FrameScheduler`]
//! - Easing gyro sensitivity in after enabling it ([`calibration`])
//! - Mapping device tilt to a movement vector ([`tilt`])
//! - Reading DualSense motion sensors via evdev ([`motion`])
//! - Replaying recorded accelerometer traces ([`replay`])

use glam::Vec2;

pub mod calibration;
pub mod motion;
pub mod replay;
pub mod scheduler;
pub mod sensor;
pub mod tilt;

/// A source of per-frame player movement.
pub trait InputController<S: ?Sized> {
    /// Returns the player's movement vector for this frame.
    ///
    /// # Arguments
    ///
    /// * `sensors` - Current input state
    /// * `delta_time` - Time elapsed since the previous frame, in seconds
    fn input_vector(&mut self, sensors: &S, delta_time: f32) -> Vec2;
}
