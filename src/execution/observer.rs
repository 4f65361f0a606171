use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Execution events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { files: usize },
    /// A worker waited for a free file slot.
    ThrottleWaited { duration: Duration },
    FileStarted { path: PathBuf },
    FileFinished { path: PathBuf, rows: usize, batches: usize },
    /// The file failed; `error` is the rendered [`crate::IngestionError`].
    FileFailed { path: PathBuf, error: String },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    /// Called for every event, possibly from several worker threads at once.
    fn on_event(&self, event: &ExecutionEvent);
}

/// Logs execution events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingExecutionObserver;

impl ExecutionObserver for TracingExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RunFinished { metrics, .. } => tracing::info!(%metrics, "run finished"),
            ExecutionEvent::FileFailed { path, error } => {
                tracing::warn!(path = %path.display(), %error, "file failed")
            }
            other => tracing::debug!(event = ?other, "execution event"),
        }
    }
}

/// Real-time metrics for an execution run.
///
/// The engine updates these counters during execution; callers can snapshot them at any time.
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    files_started: AtomicU64,
    files_finished: AtomicU64,
    files_failed: AtomicU64,
    rows_processed: AtomicU64,
    batches_processed: AtomicU64,
    throttle_wait_ns: AtomicU64,

    active_files: AtomicUsize,
    max_active_files: AtomicUsize,
}

impl ExecutionMetrics {
    /// Zeroed counters.
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            files_started: AtomicU64::new(0),
            files_finished: AtomicU64::new(0),
            files_failed: AtomicU64::new(0),
            rows_processed: AtomicU64::new(0),
            batches_processed: AtomicU64::new(0),
            throttle_wait_ns: AtomicU64::new(0),
            active_files: AtomicUsize::new(0),
            max_active_files: AtomicUsize::new(0),
        }
    }

    /// Start a new run: bump the run id and reset every counter.
    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);

        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.files_started.store(0, Ordering::SeqCst);
        self.files_finished.store(0, Ordering::SeqCst);
        self.files_failed.store(0, Ordering::SeqCst);
        self.rows_processed.store(0, Ordering::SeqCst);
        self.batches_processed.store(0, Ordering::SeqCst);
        self.throttle_wait_ns.store(0, Ordering::SeqCst);
        self.active_files.store(0, Ordering::SeqCst);
        self.max_active_files.store(0, Ordering::SeqCst);
    }

    /// Record the wall-clock duration of the run.
    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    /// Count a file entering the worker pool.
    pub fn on_file_start(&self) {
        let _ = self.files_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_files.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_files, now);
    }

    /// Count a file leaving the pool; `Some((rows, batches))` on success, `None` on failure.
    pub fn on_file_end(&self, outcome: Option<(usize, usize)>) {
        match outcome {
            Some((rows, batches)) => {
                let _ = self.files_finished.fetch_add(1, Ordering::SeqCst);
                let _ = self.rows_processed.fetch_add(rows as u64, Ordering::SeqCst);
                let _ = self.batches_processed.fetch_add(batches as u64, Ordering::SeqCst);
            }
            None => {
                let _ = self.files_failed.fetch_add(1, Ordering::SeqCst);
            }
        }
        let _ = self.active_files.fetch_sub(1, Ordering::SeqCst);
    }

    /// Add time a worker spent waiting for a file slot.
    pub fn on_throttle_wait(&self, d: Duration) {
        let add = d.as_nanos().min(u64::MAX as u128) as u64;
        let _ = self.throttle_wait_ns.fetch_add(add, Ordering::SeqCst);
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = if elapsed_ns > 0 {
            Some(Duration::from_nanos(elapsed_ns))
        } else {
            None
        };

        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            files_started: self.files_started.load(Ordering::SeqCst),
            files_finished: self.files_finished.load(Ordering::SeqCst),
            files_failed: self.files_failed.load(Ordering::SeqCst),
            rows_processed: self.rows_processed.load(Ordering::SeqCst),
            batches_processed: self.batches_processed.load(Ordering::SeqCst),
            throttle_wait: Duration::from_nanos(self.throttle_wait_ns.load(Ordering::SeqCst)),
            max_active_files: self.max_active_files.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    loop {
        let cur = dst.load(Ordering::SeqCst);
        if now <= cur {
            break;
        }
        if dst.compare_exchange(cur, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            break;
        }
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    /// Incremented by every [`ExecutionMetrics::begin_run`].
    pub run_id: u64,
    /// `None` until the run finishes.
    pub elapsed: Option<Duration>,
    pub files_started: u64,
    pub files_finished: u64,
    pub files_failed: u64,
    pub rows_processed: u64,
    pub batches_processed: u64,
    /// Total time workers spent waiting for a file slot.
    pub throttle_wait: Duration,
    /// Peak number of files read at once.
    pub max_active_files: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, files={}/{} (failed={}), rows={}, batches={}, max_active_files={}, throttle_wait={:?}, elapsed={:?}",
            self.run_id,
            self.files_finished,
            self.files_started,
            self.files_failed,
            self.rows_processed,
            self.batches_processed,
            self.max_active_files,
            self.throttle_wait,
            self.elapsed
        )
    }
}
