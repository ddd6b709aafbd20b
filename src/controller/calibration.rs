//! # Calibration Module
//!
//! Eases tilt sensitivity in while the gyroscope settles after being enabled.
//!
//! ## Sensitivity
//!
//! Two parameters control how eagerly the tilt controller recenters its
//! down-vector:
//!
//! - `max_angle_sin_squared`: squared sine of the largest deviation tolerated
//!   before recentering starts. `0.0` recenters on any deviation.
//! - `recenter_speed`: blend rate toward the live reading, per second.
//!
//! ## Ramp Curve
//!
//! Right after the gyro is switched on the readings are unreliable, so the
//! ramp starts fully permissive (recenter on everything, fast) and moves back
//! to the original values over [`GYRO_CALIBRATION_DURATION_SECONDS`]:
//!
//! `value = lerp(loose, original, (elapsed / duration)²)`
//!
//! The squared progress keeps the controller loose for most of the first
//! second and tightens it quickly towards the end.
//!
//! ## Usage
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tilt_input::controller::calibration::{Sensitivity, SensitivityRamp};
//! use tilt_input::controller::scheduler::{FrameTask, TaskStatus};
//!
//! let shared = Rc::new(Cell::new(Sensitivity::default()));
//! let mut ramp = SensitivityRamp::new(shared.clone());
//!
//! // First step switches to the loose values
//! assert_eq!(ramp.resume(1.0), TaskStatus::Pending);
//! assert_eq!(shared.get().max_angle_sin_squared, 0.0);
//!
//! ramp.resume(1.0);
//! ramp.resume(1.0);
//! assert_eq!(ramp.resume(1.0), TaskStatus::Complete);
//! assert_eq!(shared.get(), Sensitivity::default());
//! ```

use std::cell::Cell;
use std::f32::consts::PI;
use std::rc::Rc;

use tracing::{debug, info};

use crate::controller::scheduler::{FrameTask, TaskStatus};

/// How fast the down-vector moves while recentering, per second.
pub const RECENTER_SPEED: f32 = 0.9;

/// How far the down-vector may drift from the input before recentering (30 degrees).
pub const MAX_ANGLE_DIFFERENCE: f32 = PI / 6.0;

/// How long the sensitivity ramp lasts after enabling the gyro.
pub const GYRO_CALIBRATION_DURATION_SECONDS: f32 = 3.0;

/// `max_angle_sin_squared` at the start of the ramp.
pub const LOOSE_MAX_ANGLE_SIN_SQUARED: f32 = 0.0;

/// `recenter_speed` at the start of the ramp.
pub const LOOSE_RECENTER_SPEED: f32 = 10.0;

/// Recentering sensitivity shared between the tilt controller and a running ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensitivity {
    /// Squared sine of the tolerated deviation angle.
    pub max_angle_sin_squared: f32,
    /// Blend rate toward the live reading, per second.
    pub recenter_speed: f32,
}

impl Default for Sensitivity {
    fn default() -> Self {
        let sin = MAX_ANGLE_DIFFERENCE.sin();
        Self {
            max_angle_sin_squared: sin * sin,
            recenter_speed: RECENTER_SPEED,
        }
    }
}

impl Sensitivity {
    /// The permissive values the ramp starts from.
    #[must_use]
    pub fn loose() -> Self {
        Self {
            max_angle_sin_squared: LOOSE_MAX_ANGLE_SIN_SQUARED,
            recenter_speed: LOOSE_RECENTER_SPEED,
        }
    }

    /// Interpolates every field between `self` and `target`.
    #[must_use]
    pub fn lerp(self, target: Self, t: f32) -> Self {
        Self {
            max_angle_sin_squared: lerp(self.max_angle_sin_squared, target.max_angle_sin_squared, t),
            recenter_speed: lerp(self.recenter_speed, target.recenter_speed, t),
        }
    }
}

/// Linear interpolation with `t` clamped to `0.0..=1.0`.
///
/// # Examples
///
/// ```
/// use tilt_input::controller::calibration::lerp;
///
/// assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
/// assert_eq!(lerp(0.0, 10.0, 2.0), 10.0);
/// assert_eq!(lerp(0.0, 10.0, -1.0), 0.0);
/// ```
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}

/// Frame task that ramps [`Sensitivity`] from loose back to its original values.
///
/// The values present when the ramp is created are captured as the restore
/// target and written back exactly once the ramp completes.
#[derive(Debug)]
pub struct SensitivityRamp {
    sensitivity: Rc<Cell<Sensitivity>>,
    initial: Sensitivity,
    duration: f32,
    elapsed: f32,
    progress: f32,
}

impl SensitivityRamp {
    /// Creates a ramp over [`GYRO_CALIBRATION_DURATION_SECONDS`].
    #[must_use]
    pub fn new(sensitivity: Rc<Cell<Sensitivity>>) -> Self {
        Self::with_duration(sensitivity, GYRO_CALIBRATION_DURATION_SECONDS)
    }

    /// Creates a ramp with a custom duration in seconds.
    #[must_use]
    pub fn with_duration(sensitivity: Rc<Cell<Sensitivity>>, duration: f32) -> Self {
        let initial = sensitivity.get();
        Self {
            sensitivity,
            initial,
            duration,
            elapsed: 0.0,
            progress: 0.0,
        }
    }

    /// Values the ramp restores on completion.
    #[must_use]
    pub fn initial(&self) -> Sensitivity {
        self.initial
    }

    /// Frame time accumulated so far, in seconds.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl FrameTask for SensitivityRamp {
    fn resume(&mut self, delta_time: f32) -> TaskStatus {
        if self.elapsed < self.duration {
            let eased = Sensitivity::loose().lerp(self.initial, self.progress);
            self.sensitivity.set(eased);

            self.elapsed += delta_time.max(0.0);
            let fraction = self.elapsed / self.duration;
            self.progress = fraction * fraction;

            debug!(
                elapsed = self.elapsed,
                max_angle_sin_squared = eased.max_angle_sin_squared,
                recenter_speed = eased.recenter_speed,
                "Gyro calibration step"
            );
            return TaskStatus::Pending;
        }

        self.sensitivity.set(self.initial);
        info!("Gyro calibration finished after {:.2}s", self.elapsed);
        TaskStatus::Complete
    }

    fn name(&self) -> &str {
        "gyro calibration ramp"
    }
}
