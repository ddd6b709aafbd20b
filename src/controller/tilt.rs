//! # Tilt Controller Module
//!
//! Converts accelerometer readings into a 2D player movement vector.
//!
//! ## Down-Vector
//!
//! The controller keeps a smoothed estimate of "down" in device space. Each
//! frame the live reading is rotated into the frame where that estimate points
//! straight down (`-Y`), so holding the device in its resting pose produces no
//! movement no matter how it is angled.
//!
//! Only the Y and Z axes take part in the down-vector. The device is assumed
//! to be held with its face perpendicular to the player, so X never drifts.
//!
//! ## Recentering
//!
//! When the live reading drifts too far from the down-vector, the down-vector
//! follows it:
//!
//! - deviation test: `|new × down|² > max_angle_sin_squared`
//! - inversion test: `new · down < 0`
//!
//! If either holds, `down` blends toward the live reading at
//! `recenter_speed * delta_time` and is renormalized.
//!
//! ## Usage
//!
//! ```
//! use glam::Vec3;
//! use tilt_input::controller::scheduler::FrameScheduler;
//! use tilt_input::controller::sensor::SensorState;
//! use tilt_input::controller::tilt::TiltController;
//!
//! let mut sensors = SensorState::new(Vec3::NEG_Y);
//! let mut scheduler = FrameScheduler::new();
//! let mut tilt = TiltController::new(&mut sensors, Some(&mut scheduler));
//!
//! // Resting pose: no movement
//! let movement = tilt.input_vector(&sensors, 1.0 / 60.0);
//! assert!(movement.length() < 1e-4);
//! ```

use std::cell::Cell;
use std::rc::Rc;

use glam::{Quat, Vec2, Vec3};
use tracing::{debug, warn};

use crate::controller::calibration::{Sensitivity, SensitivityRamp};
use crate::controller::scheduler::FrameScheduler;
use crate::controller::sensor::SensorInput;
use crate::controller::InputController;

/// Scales the rotated X/Z acceleration into player velocity.
pub const TILT_VELOCITY: f32 = 16.0;

/// Accelerometer-driven movement controller.
///
/// # Thread Safety
///
/// `TiltController` shares its [`Sensitivity`] with a calibration ramp through
/// an `Rc<Cell<_>>` and is not `Send`. Use from the frame loop only.
#[derive(Debug)]
pub struct TiltController {
    down: Vec3,
    sensitivity: Rc<Cell<Sensitivity>>,
}

impl TiltController {
    /// Creates a controller seeded from the current accelerometer reading.
    ///
    /// If the gyro is off it is switched on and a [`SensitivityRamp`] is
    /// started on `context` to ease recentering in while it settles. Without a
    /// context the ramp is skipped and a warning is logged.
    ///
    /// # Arguments
    ///
    /// * `sensors` - Current sensor state
    /// * `context` - Scheduler that will run the calibration ramp, if any
    ///
    /// # Examples
    ///
    /// ```
    /// use glam::Vec3;
    /// use tilt_input::controller::sensor::{SensorInput, SensorState};
    /// use tilt_input::controller::tilt::TiltController;
    ///
    /// let mut sensors = SensorState::new(Vec3::new(0.5, -0.5, -0.5));
    /// let tilt = TiltController::new(&mut sensors, None);
    ///
    /// assert_eq!(tilt.down_vector().x, 0.0);
    /// assert!(!sensors.gyro_enabled());
    /// ```
    pub fn new<S>(sensors: &mut S, context: Option<&mut FrameScheduler>) -> Self
    where
        S: SensorInput + ?Sized,
    {
        let controller = Self {
            down: seed_down_vector(sensors.acceleration()),
            sensitivity: Rc::new(Cell::new(Sensitivity::default())),
        };
        debug!(down = ?controller.down, "Seeded tilt down-vector");

        if !sensors.gyro_enabled() {
            match context {
                Some(scheduler) => {
                    sensors.set_gyro_enabled(true);
                    scheduler.start(Box::new(SensitivityRamp::new(controller.sensitivity.clone())));
                }
                None => {
                    warn!("A frame scheduler is required to ease in gyro controls; skipping calibration");
                }
            }
        }

        controller
    }

    /// Reads the accelerometer and returns this frame's movement vector.
    ///
    /// Also recenters the down-vector when the reading has drifted past the
    /// current [`Sensitivity`].
    ///
    /// # Arguments
    ///
    /// * `sensors` - Current sensor state
    /// * `delta_time` - Time elapsed since the previous frame, in seconds
    ///
    /// # Returns
    ///
    /// Movement vector whose components lie within `±TILT_VELOCITY`.
    pub fn input_vector<S>(&mut self, sensors: &S, delta_time: f32) -> Vec2
    where
        S: SensorInput + ?Sized,
    {
        let input = sensors.acceleration().normalize_or_zero();
        let new_down = Vec3::new(0.0, input.y, input.z);

        let from_down_to_world = Quat::from_rotation_arc(self.down, Vec3::NEG_Y);
        let translated = from_down_to_world * input;

        let sensitivity = self.sensitivity.get();
        if needs_recenter(new_down, self.down, sensitivity.max_angle_sin_squared) {
            let t = (sensitivity.recenter_speed * delta_time).clamp(0.0, 1.0);
            self.down = self.down.lerp(new_down, t).try_normalize().unwrap_or(self.down);
        }

        let tilt = translated * TILT_VELOCITY;
        Vec2::new(tilt.x, -tilt.z)
    }

    /// Current smoothed down-vector.
    #[must_use]
    pub fn down_vector(&self) -> Vec3 {
        self.down
    }

    /// Current recentering sensitivity.
    #[must_use]
    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity.get()
    }

    /// Whether a calibration ramp still holds a handle to this controller.
    #[must_use]
    pub fn is_calibrating(&self) -> bool {
        Rc::strong_count(&self.sensitivity) > 1
    }
}

impl<S: SensorInput + ?Sized> InputController<S> for TiltController {
    fn input_vector(&mut self, sensors: &S, delta_time: f32) -> Vec2 {
        TiltController::input_vector(self, sensors, delta_time)
    }
}

/// Seeds the down-vector from a raw reading, dropping the X axis.
///
/// A reading with no Y/Z component falls back to `-Y`.
#[must_use]
pub fn seed_down_vector(acceleration: Vec3) -> Vec3 {
    let mut down = acceleration.normalize_or_zero();
    down.x = 0.0;
    down.try_normalize().unwrap_or(Vec3::NEG_Y)
}

/// Returns `true` when `new_down` has drifted far enough from `down` to recenter.
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use tilt_input::controller::tilt::needs_recenter;
///
/// // Identical: no recenter
/// assert!(!needs_recenter(Vec3::NEG_Y, Vec3::NEG_Y, 0.25));
/// // 90 degrees apart: recenter
/// assert!(needs_recenter(Vec3::NEG_Z, Vec3::NEG_Y, 0.25));
/// // Upside down: recenter
/// assert!(needs_recenter(Vec3::Y, Vec3::NEG_Y, 0.25));
/// ```
#[must_use]
pub fn needs_recenter(new_down: Vec3, down: Vec3, max_angle_sin_squared: f32) -> bool {
    new_down.cross(down).length_squared() > max_angle_sin_squared || new_down.dot(down) < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::scheduler::FrameScheduler;
    use crate::controller::sensor::{MockSensorInput, SensorState};

    const FRAME: f32 = 1.0 / 60.0;

    fn tilted(degrees: f32) -> Vec3 {
        // Rotate "down" about the X axis, towards -Z
        let r = degrees.to_radians();
        Vec3::new(0.0, -r.cos(), -r.sin())
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_zeroes_x_axis() {
        let mut sensors = SensorState::new(Vec3::new(0.8, -0.4, 0.2));
        let tilt = TiltController::new(&mut sensors, None);

        let down = tilt.down_vector();
        assert_eq!(down.x, 0.0);
        assert!((down.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_new_degenerate_reading_falls_back_to_negative_y() {
        let mut sensors = SensorState::new(Vec3::new(1.0, 0.0, 0.0));
        let tilt = TiltController::new(&mut sensors, None);
        assert_eq!(tilt.down_vector(), Vec3::NEG_Y);

        let mut sensors = SensorState::new(Vec3::ZERO);
        let tilt = TiltController::new(&mut sensors, None);
        assert_eq!(tilt.down_vector(), Vec3::NEG_Y);
    }

    #[test]
    fn test_new_enables_gyro_and_starts_ramp() {
        let mut sensors = SensorState::new(Vec3::NEG_Y);
        let mut scheduler = FrameScheduler::new();

        let tilt = TiltController::new(&mut sensors, Some(&mut scheduler));

        assert!(sensors.gyro_enabled());
        assert_eq!(scheduler.active_tasks(), 1);
        assert!(tilt.is_calibrating());
        assert_eq!(tilt.sensitivity(), Sensitivity::loose());
    }

    #[test]
    fn test_new_without_context_skips_ramp() {
        let mut sensors = MockSensorInput::new();
        sensors.expect_acceleration().return_const(Vec3::NEG_Y);
        sensors.expect_gyro_enabled().return_const(false);
        sensors.expect_set_gyro_enabled().never();

        let tilt = TiltController::new(&mut sensors, None);

        assert!(!tilt.is_calibrating());
        assert_eq!(tilt.sensitivity(), Sensitivity::default());
    }

    #[test]
    fn test_new_with_gyro_already_enabled_skips_ramp() {
        let mut sensors = MockSensorInput::new();
        sensors.expect_acceleration().return_const(Vec3::NEG_Y);
        sensors.expect_gyro_enabled().return_const(true);
        sensors.expect_set_gyro_enabled().never();
        let mut scheduler = FrameScheduler::new();

        let tilt = TiltController::new(&mut sensors, Some(&mut scheduler));

        assert_eq!(scheduler.active_tasks(), 0);
        assert!(!tilt.is_calibrating());
    }

    #[test]
    fn test_new_enables_gyro_exactly_once() {
        let mut sensors = MockSensorInput::new();
        sensors.expect_acceleration().return_const(Vec3::NEG_Y);
        sensors.expect_gyro_enabled().return_const(false);
        sensors
            .expect_set_gyro_enabled()
            .withf(|enabled| *enabled)
            .times(1)
            .return_const(());
        let mut scheduler = FrameScheduler::new();

        let _tilt = TiltController::new(&mut sensors, Some(&mut scheduler));
    }

    // ==================== Input Vector Tests ====================

    #[test]
    fn test_resting_pose_produces_no_movement() {
        let mut sensors = SensorState::new(tilted(40.0));
        let mut tilt = TiltController::new(&mut sensors, None);

        let movement = tilt.input_vector(&sensors, FRAME);
        assert!(movement.length() < 1e-4, "got {movement:?}");
    }

    #[test]
    fn test_sideways_tilt_moves_along_x() {
        let mut sensors = SensorState::new(Vec3::NEG_Y);
        let mut tilt = TiltController::new(&mut sensors, None);

        sensors.set_acceleration(Vec3::new(1.0, -1.0, 0.0));
        let movement = tilt.input_vector(&sensors, FRAME);

        let expected = TILT_VELOCITY * std::f32::consts::FRAC_1_SQRT_2;
        assert!((movement.x - expected).abs() < 1e-3);
        assert!(movement.y.abs() < 1e-3);
    }

    #[test]
    fn test_forward_tilt_moves_along_y() {
        let mut sensors = SensorState::new(Vec3::NEG_Y);
        let mut tilt = TiltController::new(&mut sensors, None);

        // Small forward tilt stays inside the 30 degree tolerance
        sensors.set_acceleration(tilted(20.0));
        let movement = tilt.input_vector(&sensors, FRAME);

        let expected = TILT_VELOCITY * 20f32.to_radians().sin();
        assert!(movement.x.abs() < 1e-3);
        assert!((movement.y - expected).abs() < 1e-3);
    }

    #[test]
    fn test_zero_reading_produces_zero_output() {
        let mut sensors = SensorState::new(Vec3::NEG_Y);
        let mut tilt = TiltController::new(&mut sensors, None);
        let before = tilt.down_vector();

        sensors.set_acceleration(Vec3::ZERO);
        let movement = tilt.input_vector(&sensors, FRAME);

        assert_eq!(movement, Vec2::ZERO);
        assert_eq!(tilt.down_vector(), before);
    }

    #[test]
    fn test_output_bounded_by_tilt_velocity() {
        let mut sensors = SensorState::new(Vec3::NEG_Y);
        let mut tilt = TiltController::new(&mut sensors, None);

        for reading in [
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(-2.0, 5.0, 1.0),
            Vec3::new(0.0, 0.0, -9.0),
            Vec3::new(1.0, 1.0, 1.0),
        ] {
            sensors.set_acceleration(reading);
            let movement = tilt.input_vector(&sensors, FRAME);
            assert!(movement.x.abs() <= TILT_VELOCITY + 1e-4);
            assert!(movement.y.abs() <= TILT_VELOCITY + 1e-4);
        }
    }

    // ==================== Recentering Tests ====================

    #[test]
    fn test_small_deviation_does_not_recenter() {
        let mut sensors = SensorState::new(Vec3::NEG_Y);
        let mut tilt = TiltController::new(&mut sensors, None);
        let before = tilt.down_vector();

        sensors.set_acceleration(tilted(20.0));
        tilt.input_vector(&sensors, FRAME);

        assert_eq!(tilt.down_vector(), before);
    }

    #[test]
    fn test_large_deviation_recenters_toward_reading() {
        let mut sensors = SensorState::new(Vec3::NEG_Y);
        let mut tilt = TiltController::new(&mut sensors, None);
        let target = tilted(60.0);

        sensors.set_acceleration(target);
        tilt.input_vector(&sensors, FRAME);

        let down = tilt.down_vector();
        assert_ne!(down, Vec3::NEG_Y);
        assert_eq!(down.x, 0.0);
        assert!((down.length() - 1.0).abs() < 1e-5);
        assert!(down.dot(target) > Vec3::NEG_Y.dot(target));
    }

    #[test]
    fn test_recentering_converges_to_tolerance() {
        let mut sensors = SensorState::new(Vec3::NEG_Y);
        let mut tilt = TiltController::new(&mut sensors, None);
        let target = tilted(60.0);

        sensors.set_acceleration(target);
        for _ in 0..600 {
            tilt.input_vector(&sensors, FRAME);
        }

        // Stops once within 30 degrees of the reading
        let angle = tilt.down_vector().angle_between(target).to_degrees();
        assert!(angle <= 30.0 + 1e-2, "angle was {angle}");
        assert!(angle > 25.0, "angle was {angle}");
    }

    #[test]
    fn test_inverted_reading_recenters() {
        let mut sensors = SensorState::new(Vec3::NEG_Y);
        let mut tilt = TiltController::new(&mut sensors, None);

        // Slightly off upside-down so the blend never passes through zero
        sensors.set_acceleration(Vec3::new(0.0, 1.0, 0.05));
        tilt.input_vector(&sensors, FRAME);

        assert_ne!(tilt.down_vector(), Vec3::NEG_Y);
    }

    #[test]
    fn test_zero_delta_time_keeps_down_vector() {
        let mut sensors = SensorState::new(Vec3::NEG_Y);
        let mut tilt = TiltController::new(&mut sensors, None);

        sensors.set_acceleration(tilted(80.0));
        tilt.input_vector(&sensors, 0.0);

        assert!((tilt.down_vector() - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn test_calibration_recenters_on_any_deviation() {
        let mut sensors = SensorState::new(Vec3::NEG_Y);
        let mut scheduler = FrameScheduler::new();
        let mut tilt = TiltController::new(&mut sensors, Some(&mut scheduler));

        // 10 degrees would be tolerated normally, not while calibrating
        sensors.set_acceleration(tilted(10.0));
        tilt.input_vector(&sensors, FRAME);

        assert_ne!(tilt.down_vector(), Vec3::NEG_Y);
    }

    #[test]
    fn test_calibration_finishes_and_restores_sensitivity() {
        let mut sensors = SensorState::new(Vec3::NEG_Y);
        let mut scheduler = FrameScheduler::new();
        let mut tilt = TiltController::new(&mut sensors, Some(&mut scheduler));

        for _ in 0..400 {
            scheduler.tick(FRAME);
            tilt.input_vector(&sensors, FRAME);
        }

        assert_eq!(scheduler.active_tasks(), 0);
        assert!(!tilt.is_calibrating());
        assert_eq!(tilt.sensitivity(), Sensitivity::default());
    }

    #[test]
    fn test_input_controller_trait_dispatch() {
        let mut sensors = SensorState::new(Vec3::NEG_Y);
        let mut tilt = TiltController::new(&mut sensors, None);
        let controller: &mut dyn InputController<SensorState> = &mut tilt;

        sensors.set_acceleration(Vec3::new(1.0, -1.0, 0.0));
        let movement = controller.input_vector(&sensors, FRAME);
        assert!(movement.x > 0.0);
    }
}
