//! Incremental per-column statistics.
//!
//! [`StatsEngine`] consumes batches one at a time and keeps a running [`ColumnAccumulator`] per
//! column. Only `sum`, `count`, `min` and `max` are updated per value; the mean is derived when
//! [`StatsEngine::finalize`] builds a [`StatsSnapshot`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{Batch, Headers, Row};

/// Running aggregate for one column.
///
/// `min` and `max` are only meaningful when `count > 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnAccumulator {
    pub sum: f64,
    pub count: u64,
    pub min: f64,
    pub max: f64,
}

impl ColumnAccumulator {
    /// Fold one finite value into the aggregate.
    pub fn push(&mut self, v: f64) {
        if self.count == 0 {
            self.min = v;
            self.max = v;
        } else {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
        self.sum += v;
        self.count += 1;
    }

    /// `sum / count`, or `None` when no value has been seen.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Parse a raw cell as a finite `f64`.
///
/// Surrounding whitespace is ignored. Blank cells, non-numeric text, `NaN` and infinities all
/// yield `None`.
pub fn parse_cell(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Finalized, read-only statistics for one analysis run.
///
/// Every map is keyed by the union of all columns the engine observed. Columns without any
/// valid value report `count = 0` and `0.0` for mean/min/max, and are listed in
/// [`StatsSnapshot::empty_columns`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub count: BTreeMap<String, u64>,
    pub mean: BTreeMap<String, f64>,
    pub min: BTreeMap<String, f64>,
    pub max: BTreeMap<String, f64>,
    /// Columns whose mean was defaulted because no valid value was seen.
    #[serde(skip)]
    pub empty_columns: Vec<String>,
}

impl StatsSnapshot {
    /// Column names, sorted.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.count.keys().map(String::as_str)
    }

    /// Number of columns in the snapshot.
    pub fn column_count(&self) -> usize {
        self.count.len()
    }
}

/// Owned, single-caller accumulator state for one analysis run.
///
/// Not meant to be shared between threads; run one engine per input.
#[derive(Debug, Default)]
pub struct StatsEngine {
    columns: Vec<(String, ColumnAccumulator)>,
    index: HashMap<String, usize>,
    /// Slot per header position for the most recently seen header set.
    /// `None` marks a column shadowed by a later column of the same name.
    layout: Option<(Headers, Vec<Option<usize>>)>,
    rows_seen: u64,
}

impl StatsEngine {
    /// Create an engine with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register columns up front so they appear in the snapshot even if no row carries them.
    pub fn declare_columns<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for c in columns {
            self.slot_for(c.as_ref());
        }
    }

    /// Fold every cell of every row in `batch` into the running aggregates.
    pub fn process(&mut self, batch: &Batch) {
        for row in &batch.rows {
            self.process_row(row);
        }
    }

    /// Fold one row into the running aggregates.
    pub fn process_row(&mut self, row: &Row) {
        let stale = match &self.layout {
            Some((headers, _)) => !Arc::ptr_eq(headers, row.headers()),
            None => true,
        };
        if stale {
            let slots = self.layout_for(row.headers());
            self.layout = Some((Arc::clone(row.headers()), slots));
        }
        self.rows_seen += 1;

        let Some((_, slots)) = &self.layout else {
            return;
        };
        for (slot, raw) in slots.iter().zip(row.values()) {
            let Some(slot) = slot else {
                continue;
            };
            if let Some(v) = parse_cell(raw) {
                self.columns[*slot].1.push(v);
            }
        }
    }

    /// Accumulator for `column`, if the column has been observed.
    pub fn accumulator(&self, column: &str) -> Option<&ColumnAccumulator> {
        self.index.get(column).map(|&i| &self.columns[i].1)
    }

    /// Rows folded so far.
    pub fn rows_seen(&self) -> u64 {
        self.rows_seen
    }

    /// Number of distinct columns observed.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Build a snapshot of the current aggregates. Does not modify the engine.
    pub fn finalize(&self) -> StatsSnapshot {
        let mut snapshot = StatsSnapshot::default();
        for (name, acc) in &self.columns {
            let mean = match acc.mean() {
                Some(m) => m,
                None => {
                    snapshot.empty_columns.push(name.clone());
                    0.0
                }
            };
            let (min, max) = if acc.count > 0 { (acc.min, acc.max) } else { (0.0, 0.0) };
            snapshot.count.insert(name.clone(), acc.count);
            snapshot.mean.insert(name.clone(), mean);
            snapshot.min.insert(name.clone(), min);
            snapshot.max.insert(name.clone(), max);
        }
        snapshot.empty_columns.sort();
        if !snapshot.empty_columns.is_empty() {
            tracing::debug!(columns = ?snapshot.empty_columns, "no numeric values; mean defaulted to 0");
        }
        snapshot
    }

    fn slot_for(&mut self, column: &str) -> usize {
        if let Some(&i) = self.index.get(column) {
            return i;
        }
        let i = self.columns.len();
        self.columns.push((column.to_string(), ColumnAccumulator::default()));
        self.index.insert(column.to_string(), i);
        i
    }

    fn layout_for(&mut self, headers: &Headers) -> Vec<Option<usize>> {
        let mut slots: Vec<Option<usize>> = headers.iter().map(|h| Some(self.slot_for(h))).collect();
        // A repeated header maps to one column; the last occurrence wins.
        for i in 0..slots.len() {
            if headers[i + 1..].contains(&headers[i]) {
                slots[i] = None;
            }
        }
        slots
    }
}
