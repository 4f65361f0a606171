//! Unified ingestion entrypoint.
//!
//! Most callers should use [`load`], which validates the input path, picks the format from the
//! file extension (or [`IngestionOptions::format`]) and returns a lazy
//! [`ChunkedReader`](super::chunked::ChunkedReader) over the file's row batches.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use encoding_rs::Encoding;

use crate::error::{IngestionError, IngestionResult};

use super::chunked::ChunkedReader;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity};

/// Default number of rows per batch.
pub const DEFAULT_CHUNK_SIZE: usize = 500_000;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Comma-separated values.
    Csv,
    /// Tab-separated values.
    Tsv,
    /// Spreadsheet/workbook formats (normalized to CSV before streaming).
    Excel,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Field delimiter of the delimited text that gets streamed for this format.
    ///
    /// Workbooks are normalized to comma-separated text.
    pub fn delimiter(self) -> u8 {
        match self {
            Self::Csv | Self::Excel => b',',
            Self::Tsv => b'\t',
        }
    }

    /// Returns `true` for formats that need normalization before streaming.
    pub fn is_spreadsheet(self) -> bool {
        matches!(self, Self::Excel)
    }
}

/// Options controlling the chunked reader.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Maximum rows per batch. Must be > 0.
    pub chunk_size: usize,
    /// Encoding tried first for delimited text.
    pub encoding: &'static Encoding,
    /// Single-byte encoding used for one full restart when `encoding` fails to decode.
    ///
    /// `None` disables the fallback; the first decode failure is then a format error.
    pub fallback_encoding: Option<&'static Encoding>,
    /// Directory for transient files created by workbook normalization.
    ///
    /// `None` uses the OS temp dir.
    pub transient_dir: Option<PathBuf>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("chunk_size", &self.chunk_size)
            .field("encoding", &self.encoding.name())
            .field("fallback_encoding", &self.fallback_encoding.map(Encoding::name))
            .field("transient_dir", &self.transient_dir)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            encoding: encoding_rs::UTF_8,
            fallback_encoding: Some(encoding_rs::WINDOWS_1252),
            transient_dir: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl IngestionOptions {
    /// Shorthand for default options with a different chunk size.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> IngestionResult<()> {
        if self.chunk_size == 0 {
            return Err(IngestionError::InvalidOptions {
                message: "chunk_size must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Open `path` for batched reading.
///
/// Pre-checks, in order:
///
/// - [`IngestionError::NotFound`] if `path` is not an existing regular file (nothing is parsed)
/// - [`IngestionError::Format`] if the format cannot be inferred from the extension
/// - [`IngestionError::Dependency`] for a workbook when the `excel` feature is disabled
///
/// Workbooks are normalized to a transient CSV here; the returned reader owns that file and
/// deletes it on exhaustion, on error, or when dropped.
///
/// # Examples
///
/// ```no_run
/// use tabular_stats::analysis::StatsEngine;
/// use tabular_stats::ingestion::{load, IngestionOptions};
///
/// # fn main() -> Result<(), tabular_stats::IngestionError> {
/// let reader = load("measurements.csv", &IngestionOptions::with_chunk_size(10_000))?;
/// let mut engine = StatsEngine::new();
/// engine.declare_columns(reader.headers().iter());
/// for batch in reader {
///     engine.process(&batch?);
/// }
/// let snapshot = engine.finalize();
/// println!("{:?}", snapshot.mean);
/// # Ok(())
/// # }
/// ```
pub fn load(path: impl AsRef<Path>, options: &IngestionOptions) -> IngestionResult<ChunkedReader> {
    let path = path.as_ref();
    let format = resolve_format(path, options)?;
    ChunkedReader::open(path, format, options)
}

/// Validate the input path and determine its format.
pub fn resolve_format(path: &Path, options: &IngestionOptions) -> IngestionResult<IngestionFormat> {
    options.validate()?;
    ensure_regular_file(path)?;
    match options.format {
        Some(f) => Ok(f),
        None => infer_format_from_path(path),
    }
}

pub(crate) fn context_for(path: &Path, options: &IngestionOptions) -> IngestionContext {
    IngestionContext {
        path: path.to_path_buf(),
        format: options.format.or_else(|| {
            path.extension()
                .and_then(|s| s.to_str())
                .and_then(IngestionFormat::from_extension)
        }),
    }
}

fn ensure_regular_file(path: &Path) -> IngestionResult<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(IngestionError::NotFound {
            path: path.to_path_buf(),
        }),
    }
}

fn infer_format_from_path(path: &Path) -> IngestionResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IngestionError::format(path, "cannot infer format: path has no extension"))?;

    IngestionFormat::from_extension(ext).ok_or_else(|| {
        IngestionError::format(path, format!("unsupported file extension '{ext}'"))
    })
}
