//! # Tilt Input Library
//!
//! Turn accelerometer tilt into a 2D movement vector for tilt-controlled games.
//!
//! This library provides the tilt controller itself (a smoothed down-vector
//! plus a per-frame transform), the gyro calibration ramp that eases
//! sensitivity in after the gyro is switched on, and the host plumbing used
//! to drive it from a DualSense motion sensor or a recorded trace.

pub mod config;
pub mod error;
pub mod controller;
pub mod telemetry;
