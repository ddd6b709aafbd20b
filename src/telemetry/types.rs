//! Telemetry record types.

use chrono::{DateTime, Utc};
use glam::{Vec2, Vec3};
use serde::Serialize;

/// One frame of tilt controller telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TiltRecord {
    /// Wall-clock time the frame was processed.
    pub timestamp: DateTime<Utc>,
    /// Frame counter since startup.
    pub frame: u64,
    /// Raw acceleration in g.
    pub acceleration: Vec3,
    /// Smoothed down-vector after this frame.
    pub down: Vec3,
    /// Movement vector returned to the player.
    pub output: Vec2,
    /// Whether the gyro calibration ramp was still running.
    pub calibrating: bool,
}

impl TiltRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn now(frame: u64, acceleration: Vec3, down: Vec3, output: Vec2, calibrating: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            frame,
            acceleration,
            down,
            output,
            calibrating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_as_json_object() {
        let record = TiltRecord::now(7, Vec3::new(0.0, -1.0, 0.0), Vec3::NEG_Y, Vec2::new(1.5, -2.0), true);
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();

        assert_eq!(json["frame"], 7);
        assert_eq!(json["down"], serde_json::json!([0.0, -1.0, 0.0]));
        assert_eq!(json["output"], serde_json::json!([1.5, -2.0]));
        assert_eq!(json["calibrating"], true);
        assert!(json["timestamp"].is_string());
    }
}
