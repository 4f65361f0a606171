//! Core data model for streamed ingestion.
//!
//! A file is read as a sequence of [`Batch`]es, each holding up to `chunk_size` [`Row`]s. All rows
//! of a file share one [`Headers`] instance, so a row only stores its own cell text.

use std::sync::Arc;

/// Column names of a file, in header order. Shared by every row read from that file.
pub type Headers = Arc<[String]>;

/// A single data row: an ordered mapping from column name to raw cell text.
///
/// Short rows have no entry for their trailing columns; cells beyond the header width have no
/// column and are not visible through the mapping API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    headers: Headers,
    values: Vec<String>,
}

impl Row {
    /// Create a row from shared headers and the row's cells (in file order).
    pub fn new(headers: Headers, values: Vec<String>) -> Self {
        Self { headers, values }
    }

    /// Column names of the file this row was read from.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Raw cells in file order, including cells beyond the header width.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Number of columns present in this row.
    pub fn len(&self) -> usize {
        self.values.len().min(self.headers.len())
    }

    /// Returns `true` if no column is present in this row.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the raw cell for `column`, or `None` if the column is absent from this row.
    ///
    /// If the header repeats a name, the last such column wins.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self.headers.iter().rposition(|h| h == column)?;
        self.values.get(idx).map(String::as_str)
    }

    /// Iterate `(column, cell)` pairs in header order, skipping absent columns.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .zip(self.values.iter())
            .map(|(h, v)| (h.as_str(), v.as_str()))
    }
}

/// A bounded, ordered group of rows emitted together by the chunked reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 0-based position of this batch in the file's batch sequence.
    pub index: usize,
    /// 0-based index (among data rows, header excluded) of the first row in this batch.
    pub first_row: usize,
    /// Rows in file order.
    pub rows: Vec<Row>,
}

impl Batch {
    /// Create a batch.
    pub fn new(index: usize, first_row: usize, rows: Vec<Row>) -> Self {
        Self {
            index,
            first_row,
            rows,
        }
    }

    /// Number of rows in the batch.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the batch holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names of the rows in this batch, or `None` for an empty batch.
    pub fn headers(&self) -> Option<&Headers> {
        self.rows.first().map(Row::headers)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Batch, Headers, Row};

    fn headers() -> Headers {
        Arc::from(vec!["a".to_string(), "b".to_string(), "c".to_string()])
    }

    #[test]
    fn row_lookup_by_column() {
        let row = Row::new(headers(), vec!["1".into(), "x".into(), "".into()]);
        assert_eq!(row.get("a"), Some("1"));
        assert_eq!(row.get("c"), Some(""));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn short_row_treats_trailing_columns_as_absent() {
        let row = Row::new(headers(), vec!["1".into()]);
        assert_eq!(row.get("a"), Some("1"));
        assert_eq!(row.get("b"), None);
        assert_eq!(row.iter().collect::<Vec<_>>(), vec![("a", "1")]);
    }

    #[test]
    fn long_row_ignores_extra_cells_in_mapping() {
        let row = Row::new(
            headers(),
            vec!["1".into(), "2".into(), "3".into(), "extra".into()],
        );
        assert_eq!(row.len(), 3);
        assert_eq!(row.iter().count(), 3);
        assert_eq!(row.values().len(), 4);
    }

    #[test]
    fn batch_exposes_shared_headers() {
        let h = headers();
        let batch = Batch::new(
            0,
            0,
            vec![
                Row::new(h.clone(), vec!["1".into()]),
                Row::new(h.clone(), vec!["2".into()]),
            ],
        );
        assert_eq!(batch.len(), 2);
        assert!(Arc::ptr_eq(batch.headers().unwrap(), &h));
        assert!(Batch::new(1, 2, Vec::new()).headers().is_none());
    }
}
