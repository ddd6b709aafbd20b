//! JSONL telemetry writer with file rotation.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::telemetry::types::TiltRecord;

const FILE_PREFIX: &str = "tilt_";
const FILE_EXTENSION: &str = "jsonl";

/// Writes [`TiltRecord`]s as JSON Lines, rotating files as they fill up.
///
/// Files are named `tilt_<UTC timestamp>_<sequence>.jsonl` so that a plain
/// name sort is also oldest-first.
#[derive(Debug)]
pub struct TelemetryLogger {
    enabled: bool,
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    sequence: u32,
}

impl TelemetryLogger {
    /// Creates a logger from config, creating the log directory if enabled.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the log directory cannot be created.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let log_dir = PathBuf::from(&config.log_dir);
        if config.enabled {
            fs::create_dir_all(&log_dir)?;
            info!("Telemetry logging to {}", log_dir.display());
        }

        Ok(Self {
            enabled: config.enabled,
            log_dir,
            max_records_per_file: config.max_records_per_file.max(1),
            max_files_to_keep: config.max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            sequence: 0,
        })
    }

    /// Whether records are written at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Appends one record, rotating first if the current file is full.
    ///
    /// # Errors
    ///
    /// Returns `Io` on write failures or `Telemetry` if serialization fails.
    pub fn log(&mut self, record: &TiltRecord) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            self.records_in_file += 1;
        }
        Ok(())
    }

    /// Flushes buffered records to disk.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        self.flush()?;

        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%dT%H%M%S"),
            self.sequence,
            FILE_EXTENSION
        );
        self.sequence += 1;
        let path = self.log_dir.join(name);
        debug!("Opening telemetry file {}", path.display());

        self.writer = Some(BufWriter::new(File::create(&path)?));
        self.records_in_file = 0;

        self.prune()
    }

    /// Deletes the oldest telemetry files beyond `max_files_to_keep`.
    fn prune(&self) -> Result<()> {
        let mut files = telemetry_files(&self.log_dir)?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed old telemetry file {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        Ok(())
    }
}

/// Lists telemetry files in `dir`.
fn telemetry_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_telemetry = path
            .file_name()
            .map(|name| name.to_string_lossy().starts_with(FILE_PREFIX))
            .unwrap_or(false)
            && path.extension().is_some_and(|ext| ext == FILE_EXTENSION);
        if is_telemetry {
            files.push(path);
        }
    }
    Ok(files)
}
