//! Destinations for generated reports.
//!
//! A sink receives a finished payload and persists it somewhere: a file,
//! standard output, or memory. Generation never depends on the sink, so a
//! failed save can simply be retried from scratch.

use super::generator::{
    report_filename, serialize_with, ReportFormat, SerializeError, TabularOptions,
};
use crate::models::ReportEnvelope;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors reported by a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write report to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("report sink is unavailable")]
    Unavailable,
}

/// Errors from a generate-and-save run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Where a saved report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub filename: String,
    pub format: ReportFormat,
    pub bytes: usize,
    /// Filesystem location, for sinks that write files.
    pub path: Option<PathBuf>,
}

/// Capability that persists a report payload.
pub trait ReportSink {
    fn save(
        &self,
        payload: &str,
        filename: &str,
        format: ReportFormat,
    ) -> Result<SavedReport, SinkError>;
}

/// Writes reports into a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReportSink for FileSink {
    fn save(
        &self,
        payload: &str,
        filename: &str,
        format: ReportFormat,
    ) -> Result<SavedReport, SinkError> {
        let path = self.dir.join(filename);
        let io_err = |source| SinkError::Io {
            path: path.display().to_string(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut file = std::fs::File::create(&path).map_err(io_err)?;
        file.write_all(payload.as_bytes()).map_err(io_err)?;

        debug!("Wrote {} bytes ({})", payload.len(), format.mime_type());

        Ok(SavedReport {
            filename: filename.to_string(),
            format,
            bytes: payload.len(),
            path: Some(path),
        })
    }
}

/// Prints reports to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn save(
        &self,
        payload: &str,
        filename: &str,
        format: ReportFormat,
    ) -> Result<SavedReport, SinkError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let bytes = write_payload(&mut handle, payload).map_err(|source| SinkError::Io {
            path: "<stdout>".to_string(),
            source,
        })?;

        Ok(SavedReport {
            filename: filename.to_string(),
            format,
            bytes,
            path: None,
        })
    }
}

/// Writes the payload byte for byte, with no trailing newline, and flushes.
fn write_payload<W: Write>(writer: &mut W, payload: &str) -> std::io::Result<usize> {
    writer.write_all(payload.as_bytes())?;
    writer.flush()?;
    Ok(payload.len())
}

/// A payload captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedReport {
    pub filename: String,
    pub format: ReportFormat,
    pub payload: String,
}

/// Keeps reports in memory. Can be switched to fail every save.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<CapturedReport>>,
    failing: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every save reports [`SinkError::Unavailable`].
    pub fn failing() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    /// Everything saved so far, oldest first.
    pub fn reports(&self) -> Vec<CapturedReport> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }
}

impl ReportSink for MemorySink {
    fn save(
        &self,
        payload: &str,
        filename: &str,
        format: ReportFormat,
    ) -> Result<SavedReport, SinkError> {
        if self.failing {
            return Err(SinkError::Unavailable);
        }

        let mut reports = self.reports.lock().map_err(|_| SinkError::Unavailable)?;
        reports.push(CapturedReport {
            filename: filename.to_string(),
            format,
            payload: payload.to_string(),
        });

        Ok(SavedReport {
            filename: filename.to_string(),
            format,
            bytes: payload.len(),
            path: None,
        })
    }
}

/// Render `envelope` and hand it to `sink` under the conventional filename.
pub fn export_report(
    envelope: &ReportEnvelope,
    format: ReportFormat,
    options: &TabularOptions,
    sink: &dyn ReportSink,
) -> Result<SavedReport, ExportError> {
    let payload = serialize_with(envelope, format, options)?;
    let filename = report_filename(envelope.report_date, format);

    match sink.save(&payload, &filename, format) {
        Ok(saved) => {
            info!("Saved {} report as {}", format, saved.filename);
            Ok(saved)
        }
        Err(e) => {
            warn!("Failed to save {}: {}", filename, e);
            Err(e.into())
        }
    }
}
