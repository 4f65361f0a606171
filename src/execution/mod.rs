//! Parallel analysis of independent files.
//!
//! This module sits "above" [`crate::pipeline`] and provides:
//!
//! - A worker pool that runs one reader + engine pair per file (batches within a file stay
//!   sequential)
//! - A bound on files in flight, which bounds memory to roughly
//!   `max_in_flight_files × chunk_size` rows
//! - Real-time metrics + observer hooks for monitoring

mod observer;
mod semaphore;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::error::{IngestionError, IngestionResult};
use crate::ingestion::IngestionOptions;
use crate::pipeline::{analyze_path, FileAnalysis};
use crate::report::{Report, ReportAggregator};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, TracingExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Upper bound on files being read concurrently.
    ///
    /// This is an additional throttle on top of `num_threads`.
    pub max_in_flight_files: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            max_in_flight_files: n.max(1),
        }
    }
}

/// Outcome of analyzing a set of files.
#[derive(Debug)]
pub struct ExecutionOutcome {
    /// One entry per successfully analyzed file, keyed by the path as given.
    pub report: Report,
    /// Files that failed, with their errors, in input order.
    pub failures: Vec<(PathBuf, IngestionError)>,
}

/// Runs independent file analyses on a bounded worker pool.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails with [`IngestionError::InvalidOptions`] if `max_in_flight_files == 0`,
    /// `num_threads == Some(0)`, or the thread pool cannot be built.
    pub fn new(opts: ExecutionOptions) -> IngestionResult<Self> {
        if opts.max_in_flight_files == 0 {
            return Err(IngestionError::InvalidOptions {
                message: "max_in_flight_files must be > 0".to_string(),
            });
        }
        if opts.num_threads == Some(0) {
            return Err(IngestionError::InvalidOptions {
                message: "num_threads must be > 0 when set".to_string(),
            });
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .map_err(|e| IngestionError::InvalidOptions {
                message: format!("failed to build thread pool: {e}"),
            })?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Analyze every path in parallel, each with its own reader and statistics engine.
    ///
    /// A failing file does not stop the others; its error is returned in
    /// [`ExecutionOutcome::failures`].
    pub fn analyze_files(&self, paths: &[PathBuf], options: &IngestionOptions) -> ExecutionOutcome {
        self.pool.install(|| self.analyze_files_impl(paths, options))
    }

    fn analyze_files_impl(&self, paths: &[PathBuf], options: &IngestionOptions) -> ExecutionOutcome {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted { files: paths.len() });

        let sem = Semaphore::new(self.opts.max_in_flight_files);

        let results: Vec<(PathBuf, IngestionResult<FileAnalysis>)> = paths
            .par_iter()
            .map(|path| {
                let waited = sem.acquire();
                if waited > Duration::ZERO {
                    self.metrics.on_throttle_wait(waited);
                    self.emit(ExecutionEvent::ThrottleWaited { duration: waited });
                }

                self.metrics.on_file_start();
                self.emit(ExecutionEvent::FileStarted { path: path.clone() });

                let result = analyze_path(path, options);
                match &result {
                    Ok(a) => {
                        self.emit(ExecutionEvent::FileFinished {
                            path: path.clone(),
                            rows: a.stats.rows,
                            batches: a.stats.batches,
                        });
                        self.metrics.on_file_end(Some((a.stats.rows, a.stats.batches)));
                    }
                    Err(e) => {
                        self.emit(ExecutionEvent::FileFailed {
                            path: path.clone(),
                            error: e.to_string(),
                        });
                        self.metrics.on_file_end(None);
                    }
                }
                sem.release();
                (path.clone(), result)
            })
            .collect();

        let mut aggregator = ReportAggregator::new();
        let mut failures = Vec::new();
        for (path, result) in results {
            match result {
                Ok(analysis) => aggregator.add(report_name(&path), analysis.snapshot),
                Err(e) => failures.push((path, e)),
            }
        }

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });

        ExecutionOutcome {
            report: aggregator.into_report(),
            failures,
        }
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// Report name used for `path` in a multi-file run.
pub fn report_name(path: &Path) -> String {
    path.display().to_string()
}
