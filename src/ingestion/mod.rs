//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`load`] (from [`unified`]) which:
//!
//! - checks that the input exists and has a supported extension (or a forced [`IngestionFormat`])
//! - normalizes workbooks into a transient CSV ([`excel`], feature `excel`)
//! - returns a lazy [`ChunkedReader`] yielding bounded row batches

pub mod chunked;
#[cfg(feature = "excel")]
pub mod excel;
pub mod observability;
pub mod transient;
pub mod unified;

pub use chunked::ChunkedReader;
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    TracingObserver,
};
pub use transient::TransientFile;
pub use unified::{load, resolve_format, IngestionFormat, IngestionOptions, DEFAULT_CHUNK_SIZE};
