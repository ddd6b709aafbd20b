//! # Replay Module
//!
//! Plays back recorded accelerometer traces in place of a live sensor.
//!
//! ## Trace Format
//!
//! JSON Lines, one sample per line:
//!
//! ```text
//! {"accel":[0.0,-0.98,-0.17]}
//! {"accel":[0.02,-0.97,-0.21],"dt":0.016}
//! ```
//!
//! - `accel`: acceleration in g, device space
//! - `dt`: optional frame time in seconds; used instead of the wall clock when present
//!
//! Blank lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use glam::Vec3;
use serde::Deserialize;
use tracing::info;

use crate::error::{Result, TiltError};

/// One recorded accelerometer reading.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TraceSample {
    /// Acceleration in g.
    pub accel: Vec3,
    /// Recorded frame time in seconds, if any.
    #[serde(default)]
    pub dt: Option<f32>,
}

/// A loaded trace and a cursor into it.
#[derive(Debug, Clone)]
pub struct ReplayTrace {
    samples: Vec<TraceSample>,
    cursor: usize,
    looped: bool,
}

impl ReplayTrace {
    /// Load a trace from a JSONL file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, or `Replay` naming the first
    /// malformed line.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tilt_input::controller::replay::ReplayTrace;
    ///
    /// let trace = ReplayTrace::load("traces/tilt_left.jsonl", false)?;
    /// println!("{} samples", trace.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P, looped: bool) -> Result<Self> {
        let path = path.as_ref();
        let trace = Self::from_reader(BufReader::new(File::open(path)?), looped)?;
        info!("Loaded {} trace samples from {}", trace.len(), path.display());
        Ok(trace)
    }

    /// Parse a trace from any buffered reader.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilt_input::controller::replay::ReplayTrace;
    ///
    /// let data = "{\"accel\":[0.0,-1.0,0.0]}\n\n{\"accel\":[0.0,-0.7,-0.7],\"dt\":0.02}\n";
    /// let mut trace = ReplayTrace::from_reader(data.as_bytes(), false)?;
    /// assert_eq!(trace.len(), 2);
    /// assert_eq!(trace.next_sample().unwrap().dt, None);
    /// assert_eq!(trace.next_sample().unwrap().dt, Some(0.02));
    /// assert!(trace.next_sample().is_none());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_reader<R: BufRead>(reader: R, looped: bool) -> Result<Self> {
        let mut samples = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let sample = serde_json::from_str(&line)
                .map_err(|source| TiltError::Replay { line: index + 1, source })?;
            samples.push(sample);
        }

        Ok(Self {
            samples,
            cursor: 0,
            looped,
        })
    }

    /// Returns the next sample, or `None` once a non-looping trace is exhausted.
    pub fn next_sample(&mut self) -> Option<TraceSample> {
        if self.cursor >= self.samples.len() {
            if !self.looped || self.samples.is_empty() {
                return None;
            }
            self.cursor = 0;
        }
        let sample = self.samples[self.cursor];
        self.cursor += 1;
        Some(sample)
    }

    /// Number of samples in the trace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the trace holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
