//! Named collection of analysis results.
//!
//! A [`ReportAggregator`] is the sole writer of a [`Report`]. Adding a name twice replaces the
//! earlier entry. [`ReportAggregator::consolidate`] always returns the current state.
//!
//! A [`Report`] serializes to the nested mapping consumed by presentation layers:
//!
//! ```json
//! { "basic_stats": { "count": {"a": 3}, "mean": {"a": 2.0}, "min": {"a": 1.0}, "max": {"a": 3.0} } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::StatsSnapshot;

/// A single named result held in a [`Report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportEntry {
    /// Per-column count/mean/min/max.
    Stats(StatsSnapshot),
}

impl ReportEntry {
    /// The statistics snapshot, if this entry holds one.
    pub fn as_stats(&self) -> Option<&StatsSnapshot> {
        match self {
            Self::Stats(s) => Some(s),
        }
    }
}

impl From<StatsSnapshot> for ReportEntry {
    fn from(s: StatsSnapshot) -> Self {
        Self::Stats(s)
    }
}

/// Consolidated mapping from report name to result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    pub entries: BTreeMap<String, ReportEntry>,
}

impl Report {
    /// Entry for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&ReportEntry> {
        self.entries.get(name)
    }

    /// Statistics snapshot for `name`, if present.
    pub fn stats(&self, name: &str) -> Option<&StatsSnapshot> {
        self.get(name).and_then(ReportEntry::as_stats)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the report has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Collects named results from one or more analyzers.
#[derive(Debug, Default)]
pub struct ReportAggregator {
    report: Report,
}

impl ReportAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entry` under `name`, replacing any previous entry with that name.
    pub fn add(&mut self, name: impl Into<String>, entry: impl Into<ReportEntry>) {
        let name = name.into();
        if self.report.entries.insert(name.clone(), entry.into()).is_some() {
            tracing::debug!(name = %name, "replaced report entry");
        }
    }

    /// Entry for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&ReportEntry> {
        self.report.get(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.report.len()
    }

    /// Returns `true` if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.report.is_empty()
    }

    /// The full current mapping.
    pub fn consolidate(&self) -> Report {
        self.report.clone()
    }

    /// Consume the aggregator, returning its report without copying.
    pub fn into_report(self) -> Report {
        self.report
    }
}
