//! Single-file pipeline: chunked reader → statistics engine → report.
//!
//! [`analyze_path`] streams one file through a fresh [`StatsEngine`] and reports the outcome to
//! [`IngestionOptions::observer`]:
//!
//! - `on_success` with row/batch/column counts
//! - `on_failure` with a severity computed from the error
//! - `on_alert` when that severity is >= [`IngestionOptions::alert_at_or_above`]

use std::path::{Path, PathBuf};

use crate::analysis::{StatsEngine, StatsSnapshot};
use crate::error::IngestionResult;
use crate::ingestion::unified::context_for;
use crate::ingestion::{load, IngestionOptions, IngestionSeverity, IngestionStats};
use crate::report::{Report, ReportAggregator};

/// Report name used when a single input is analyzed.
pub const DEFAULT_REPORT_NAME: &str = "basic_stats";

/// Result of analyzing one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAnalysis {
    /// The input path.
    pub path: PathBuf,
    /// Finalized statistics.
    pub snapshot: StatsSnapshot,
    /// Row/batch counters from the reader.
    pub stats: IngestionStats,
}

/// Stream `path` in batches and compute its per-column statistics.
///
/// # Examples
///
/// ```no_run
/// use tabular_stats::ingestion::IngestionOptions;
/// use tabular_stats::pipeline::analyze_path;
///
/// # fn main() -> Result<(), tabular_stats::IngestionError> {
/// let analysis = analyze_path("measurements.csv", &IngestionOptions::default())?;
/// for column in analysis.snapshot.columns() {
///     println!("{column}: mean={}", analysis.snapshot.mean[column]);
/// }
/// # Ok(())
/// # }
/// ```
pub fn analyze_path(path: impl AsRef<Path>, options: &IngestionOptions) -> IngestionResult<FileAnalysis> {
    let path = path.as_ref();
    let result = analyze_inner(path, options);

    if let Some(obs) = options.observer.as_ref() {
        let ctx = context_for(path, options);
        match &result {
            Ok(analysis) => obs.on_success(&ctx, analysis.stats),
            Err(e) => {
                let sev = IngestionSeverity::for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

/// Analyze `path` and return a report holding its snapshot under `name`.
pub fn run(path: impl AsRef<Path>, name: &str, options: &IngestionOptions) -> IngestionResult<Report> {
    let analysis = analyze_path(path, options)?;
    let mut aggregator = ReportAggregator::new();
    aggregator.add(name, analysis.snapshot);
    Ok(aggregator.consolidate())
}

fn analyze_inner(path: &Path, options: &IngestionOptions) -> IngestionResult<FileAnalysis> {
    let mut reader = load(path, options)?;
    let mut engine = StatsEngine::new();
    engine.declare_columns(reader.headers().iter());

    for batch in reader.by_ref() {
        engine.process(&batch?);
    }

    let snapshot = engine.finalize();
    let stats = IngestionStats {
        rows: reader.rows_emitted(),
        batches: reader.batches_emitted(),
        columns: snapshot.column_count(),
        fell_back: reader.fell_back(),
    };
    tracing::info!(
        path = %path.display(),
        rows = stats.rows,
        batches = stats.batches,
        columns = stats.columns,
        "analysis complete"
    );

    Ok(FileAnalysis {
        path: path.to_path_buf(),
        snapshot,
        stats,
    })
}
