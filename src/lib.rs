//! `tabular-stats` streams large delimited or spreadsheet files in fixed-size row batches and
//! computes running per-column statistics (count, mean, min, max) without loading the file into
//! memory.
//!
//! The primary entrypoint is [`ingestion::load`], which returns a lazy
//! [`ingestion::ChunkedReader`]. Feed each batch to an [`analysis::StatsEngine`], finalize it, and
//! register the snapshot with a [`report::ReportAggregator`]. [`pipeline::analyze_path`] does all
//! of that for one file; [`execution::ExecutionEngine`] does it for many files in parallel.
//!
//! ## What you can ingest
//!
//! **File formats (auto-detected by extension):**
//!
//! - **CSV**: `.csv` (header line, RFC 4180 quoting)
//! - **TSV**: `.tsv`, `.tab`
//! - **Excel/workbooks** (Cargo feature `excel`, on by default): `.xlsx`, `.xls`, `.xlsm`, `.xlsb`,
//!   `.ods`. The first worksheet is rewritten as a transient CSV that the reader deletes when it
//!   is done with it.
//!
//! Text is decoded as UTF-8; if that fails anywhere in the file, the whole file is re-read as
//! windows-1252.
//!
//! **Statistics:** a cell counts towards its column if it parses as a finite `f64`. Blank cells,
//! text, `NaN` and infinities are skipped. Columns with no numeric cells report `count = 0` and
//! `0.0` for mean/min/max.
//!
//! ## Quick example
//!
//! ```no_run
//! use tabular_stats::analysis::StatsEngine;
//! use tabular_stats::ingestion::{load, IngestionOptions};
//! use tabular_stats::report::ReportAggregator;
//!
//! # fn main() -> Result<(), tabular_stats::IngestionError> {
//! let reader = load("data.csv", &IngestionOptions::default())?;
//! let mut engine = StatsEngine::new();
//! engine.declare_columns(reader.headers().iter());
//! for batch in reader {
//!     engine.process(&batch?);
//! }
//!
//! let mut aggregator = ReportAggregator::new();
//! aggregator.add("basic_stats", engine.finalize());
//! let report = aggregator.consolidate();
//! println!("{}", serde_json::to_string_pretty(&report).unwrap());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: format detection, workbook normalization, the chunked reader, observers
//! - [`analysis`]: incremental statistics
//! - [`report`]: named result aggregation
//! - [`pipeline`]: reader → engine → report for one file
//! - [`execution`]: bounded parallel runs over many files
//! - [`types`]: rows and batches
//! - [`error`]: the crate-wide error type
//! - [`cli`]: the `tabular-stats` command-line front end

pub mod analysis;
pub mod cli;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod pipeline;
pub mod report;
pub mod types;

pub use error::{IngestionError, IngestionResult};
