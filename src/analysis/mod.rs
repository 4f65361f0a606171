//! Statistics over streamed batches.
//!
//! Currently implemented:
//!
//! - [`StatsEngine`]: running count/sum/min/max per column, finalized into a [`StatsSnapshot`]
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tabular_stats::analysis::StatsEngine;
//! use tabular_stats::types::{Batch, Row};
//!
//! let headers: Arc<[String]> = Arc::from(vec!["a".to_string(), "b".to_string()]);
//! let rows = vec![
//!     Row::new(headers.clone(), vec!["1".into(), "x".into()]),
//!     Row::new(headers.clone(), vec!["2".into(), "y".into()]),
//!     Row::new(headers.clone(), vec!["3".into(), "".into()]),
//! ];
//!
//! let mut engine = StatsEngine::new();
//! engine.process(&Batch::new(0, 0, rows));
//! let snapshot = engine.finalize();
//!
//! assert_eq!(snapshot.count["a"], 3);
//! assert_eq!(snapshot.count["b"], 0);
//! assert_eq!(snapshot.mean["a"], 2.0);
//! ```

pub mod stats;

pub use stats::{parse_cell, ColumnAccumulator, StatsEngine, StatsSnapshot};
