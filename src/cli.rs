//! Command-line front end.
//!
//! Expands inputs (files, directories, glob patterns), runs the pipeline for a single file or
//! the execution engine for several, and renders the consolidated report as JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use walkdir::WalkDir;

use crate::execution::{ExecutionEngine, ExecutionOptions, TracingExecutionObserver};
use crate::ingestion::{
    CompositeObserver, FileObserver, IngestionFormat, IngestionObserver, IngestionOptions, TracingObserver,
    DEFAULT_CHUNK_SIZE,
};
use crate::pipeline::{self, DEFAULT_REPORT_NAME};
use crate::report::Report;
use crate::IngestionError;

/// Compute count/mean/min/max for every numeric column of large CSV or Excel files.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tabular-stats",
    version,
    about = "Stream CSV/Excel files in bounded batches and report per-column statistics as JSON"
)]
pub struct Args {
    /// Input files, directories (searched recursively) or glob patterns
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Rows per batch
    #[arg(short = 'c', long, default_value_t = DEFAULT_CHUNK_SIZE, value_parser = parse_chunk_size)]
    pub chunk_size: usize,

    /// Report name used when a single file is analyzed
    #[arg(short = 'n', long, default_value = DEFAULT_REPORT_NAME)]
    pub name: String,

    /// Worker threads for multi-file runs (defaults to available parallelism)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Maximum files read concurrently in multi-file runs
    #[arg(long, value_name = "N")]
    pub max_in_flight: Option<usize>,

    /// Append ingestion events to this file
    #[arg(long, value_name = "PATH")]
    pub event_log: Option<PathBuf>,

    /// Fail on undecodable text instead of re-reading it as windows-1252
    #[arg(long)]
    pub no_fallback: bool,

    /// Print the report on a single line
    #[arg(long)]
    pub compact: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Log level implied by `-v`/`-q`.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Ingestion options implied by the flags.
    pub fn ingestion_options(&self) -> IngestionOptions {
        let mut observers: Vec<Arc<dyn IngestionObserver>> = vec![Arc::new(TracingObserver)];
        if let Some(path) = &self.event_log {
            observers.push(Arc::new(FileObserver::new(path)));
        }

        let mut opts = IngestionOptions::with_chunk_size(self.chunk_size);
        if self.no_fallback {
            opts.fallback_encoding = None;
        }
        opts.observer = Some(Arc::new(CompositeObserver::new(observers)));
        opts
    }

    /// Execution options implied by the flags.
    pub fn execution_options(&self) -> ExecutionOptions {
        let defaults = ExecutionOptions::default();
        ExecutionOptions {
            num_threads: self.threads.or(defaults.num_threads),
            max_in_flight_files: self.max_in_flight.unwrap_or(defaults.max_in_flight_files),
        }
    }
}

fn parse_chunk_size(s: &str) -> std::result::Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("invalid chunk size '{s}': {e}"))?;
    if n == 0 {
        return Err("chunk size must be > 0".to_string());
    }
    Ok(n)
}

/// Result of a CLI run.
#[derive(Debug)]
pub struct CliOutcome {
    /// Consolidated report of everything that succeeded.
    pub report: Report,
    /// Inputs that failed.
    pub failures: Vec<(PathBuf, IngestionError)>,
}

/// Set up structured logging to stderr.
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tabular_stats={log_level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .context("failed to initialize logging")?;

    tracing::debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Expand CLI inputs into concrete file paths.
///
/// - existing directories are walked recursively for files with a supported extension
/// - arguments containing `*`, `?` or `[` are treated as glob patterns
/// - anything else is passed through unchanged, so a missing file surfaces as a not-found error
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_supported(e.path()))
                .map(|e| e.into_path())
                .collect();
            found.sort();
            out.extend(found);
        } else if input.contains(['*', '?', '[']) {
            let entries = glob::glob(input).with_context(|| format!("invalid glob pattern '{input}'"))?;
            for entry in entries {
                let p = entry.with_context(|| format!("cannot read match for '{input}'"))?;
                if p.is_file() {
                    out.push(p);
                }
            }
        } else {
            out.push(path.to_path_buf());
        }
    }
    Ok(out)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .and_then(IngestionFormat::from_extension)
        .is_some()
}

/// Run the analysis described by `args`.
///
/// A single plain file goes through [`pipeline::run`] and is reported under `args.name`; any
/// other input set runs on the [`ExecutionEngine`] with one entry per file.
pub fn run(args: &Args) -> Result<CliOutcome> {
    let options = args.ingestion_options();
    let paths = expand_inputs(&args.inputs)?;
    if paths.is_empty() {
        bail!("no input files matched {:?}", args.inputs);
    }

    let single = args.inputs.len() == 1 && paths.len() == 1 && Path::new(&args.inputs[0]) == paths[0];
    if single {
        let report = pipeline::run(&paths[0], &args.name, &options)
            .with_context(|| format!("failed to analyze {}", paths[0].display()))?;
        return Ok(CliOutcome {
            report,
            failures: Vec::new(),
        });
    }

    let engine = ExecutionEngine::new(args.execution_options())?
        .with_observer(Arc::new(TracingExecutionObserver));
    let outcome = engine.analyze_files(&paths, &options);
    if outcome.report.is_empty() && !outcome.failures.is_empty() {
        bail!("all {} inputs failed", outcome.failures.len());
    }
    Ok(CliOutcome {
        report: outcome.report,
        failures: outcome.failures,
    })
}

/// Render a report as JSON.
pub fn render(report: &Report, compact: bool) -> Result<String> {
    let s = if compact {
        serde_json::to_string(report)?
    } else {
        serde_json::to_string_pretty(report)?
    };
    Ok(s)
}
