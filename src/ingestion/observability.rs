//! Observer hooks for ingestion runs.
//!
//! [`crate::pipeline::analyze_path`] reports each run's outcome to the configured
//! [`IngestionObserver`]; the chunked reader additionally reports encoding fallbacks.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::IngestionError;

use super::unified::IngestionFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (run failed).
    Error,
    /// Critical error (missing input, I/O failure, missing capability).
    Critical,
}

impl IngestionSeverity {
    /// Severity of a failed run, by error kind.
    pub fn for_error(e: &IngestionError) -> Self {
        match e {
            IngestionError::NotFound { .. } => Self::Critical,
            IngestionError::Io(_) => Self::Critical,
            IngestionError::Dependency { .. } => Self::Critical,
            IngestionError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => Self::Critical,
                _ => Self::Error,
            },
            IngestionError::Format { .. } => Self::Error,
            IngestionError::InvalidOptions { .. } => Self::Error,
        }
    }
}

/// Context about an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// The input path.
    pub path: PathBuf,
    /// Format used (or inferred) for the input, if it could be determined.
    pub format: Option<IngestionFormat>,
}

/// Stats reported on a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Data rows read (header excluded).
    pub rows: usize,
    /// Batches emitted.
    pub batches: usize,
    /// Columns in the final snapshot.
    pub columns: usize,
    /// Whether the reader restarted under the fallback encoding.
    pub fell_back: bool,
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when a run completes.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when a run fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when a run failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }

    /// Called when the reader abandons a pass and restarts under `encoding`.
    fn on_encoding_fallback(&self, _ctx: &IngestionContext, _encoding: &'static str, _row: usize) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_encoding_fallback(&self, ctx: &IngestionContext, encoding: &'static str, row: usize) {
        for o in &self.observers {
            o.on_encoding_fallback(ctx, encoding, row);
        }
    }
}

/// Forwards ingestion events to `tracing`.
///
/// Encoding fallbacks are not repeated here; the reader logs those itself.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        tracing::info!(
            format = ?ctx.format,
            path = %ctx.path.display(),
            rows = stats.rows,
            batches = stats.batches,
            columns = stats.columns,
            fell_back = stats.fell_back,
            "ingest ok"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::error!(
            ?severity,
            format = ?ctx.format,
            path = %ctx.path.display(),
            %error,
            "ingest failed"
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::error!(
            ?severity,
            format = ?ctx.format,
            path = %ctx.path.display(),
            %error,
            "ALERT: ingest failed"
        );
    }
}

/// Appends ingestion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append_line(&format!(
            "{} ok format={:?} path={} rows={} batches={} columns={}",
            unix_ts(),
            ctx.format,
            ctx.path.display(),
            stats.rows,
            stats.batches,
            stats.columns
        ));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} fail severity={:?} format={:?} path={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.path.display(),
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} format={:?} path={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.path.display(),
            error
        ));
    }

    fn on_encoding_fallback(&self, ctx: &IngestionContext, encoding: &'static str, row: usize) {
        self.append_line(&format!(
            "{} fallback encoding={} path={} row={}",
            unix_ts(),
            encoding,
            ctx.path.display(),
            row
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
