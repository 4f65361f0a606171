//! Lazy, bounded-memory batch reader over delimited text.
//!
//! A [`ChunkedReader`] holds at most one batch of rows in memory at a time. Workbook inputs are
//! normalized into a transient CSV first; the reader owns that file and deletes it when the
//! sequence ends, when a read fails, or when the reader is dropped.
//!
//! Text is decoded per field under [`IngestionOptions::encoding`]. If a field fails to decode,
//! the current pass is abandoned and the file is re-read from the start under
//! [`IngestionOptions::fallback_encoding`]. Rows already handed out in earlier batches are
//! skipped on the second pass, so the batch sequence is the same as a clean read would give.
//! The header decoded on the first pass keeps naming the columns after a restart.

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::ByteRecord;
use encoding_rs::Encoding;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{Batch, Headers, Row};

use super::observability::{IngestionContext, IngestionObserver};
use super::transient::TransientFile;
use super::unified::{context_for, IngestionFormat, IngestionOptions};

/// Upper bound on the row capacity reserved up front for a batch.
const ROW_PREALLOC: usize = 4_096;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Outcome of filling one batch during a pass.
enum Fill {
    Rows(Vec<Row>),
    DecodeFailed { row: usize },
}

/// Iterator over the row batches of one file.
///
/// Yields `Ok(batch)` for each non-empty batch in file order and at most one `Err`; after
/// the first `None` or `Err` it is exhausted and its resources are released.
pub struct ChunkedReader {
    ctx: IngestionContext,
    format: IngestionFormat,
    read_path: PathBuf,
    chunk_size: usize,
    encoding: &'static Encoding,
    fallback_encoding: Option<&'static Encoding>,
    fell_back: bool,
    headers: Headers,
    headers_fixed: bool,
    pass: Option<csv::Reader<File>>,
    rows_emitted: usize,
    batches_emitted: usize,
    transient: Option<TransientFile>,
    observer: Option<Arc<dyn IngestionObserver>>,
    done: bool,
}

impl ChunkedReader {
    /// Open `path` as `format`. Callers normally go through [`super::load`], which also performs
    /// the path and extension checks.
    pub fn open(path: &Path, format: IngestionFormat, options: &IngestionOptions) -> IngestionResult<Self> {
        options.validate()?;

        let transient = if format.is_spreadsheet() {
            Some(normalize(path, options)?)
        } else {
            None
        };
        let read_path = match &transient {
            Some(t) => t.path().to_path_buf(),
            None => path.to_path_buf(),
        };

        let mut ctx = context_for(path, options);
        ctx.format = Some(format);

        let mut reader = Self {
            ctx,
            format,
            read_path,
            chunk_size: options.chunk_size,
            encoding: options.encoding,
            fallback_encoding: options.fallback_encoding,
            fell_back: false,
            headers: Arc::from(Vec::<String>::new()),
            headers_fixed: false,
            pass: None,
            rows_emitted: 0,
            batches_emitted: 0,
            transient,
            observer: options.observer.clone(),
            done: false,
        };
        // On failure `reader` is dropped, which removes any transient file.
        reader.start_pass()?;
        Ok(reader)
    }

    /// Column names from the header row, in file order.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Format the input was opened as.
    pub fn format(&self) -> IngestionFormat {
        self.format
    }

    /// The input path as given by the caller.
    pub fn source_path(&self) -> &Path {
        &self.ctx.path
    }

    /// Path of the transient CSV while it exists (workbook inputs only).
    pub fn transient_path(&self) -> Option<&Path> {
        self.transient.as_ref().filter(|t| t.is_live()).map(TransientFile::path)
    }

    /// Name of the encoding currently used to decode text.
    pub fn encoding(&self) -> &'static str {
        self.encoding.name()
    }

    /// Whether the reader restarted under the fallback encoding.
    pub fn fell_back(&self) -> bool {
        self.fell_back
    }

    /// Data rows emitted so far.
    pub fn rows_emitted(&self) -> usize {
        self.rows_emitted
    }

    /// Batches emitted so far.
    pub fn batches_emitted(&self) -> usize {
        self.batches_emitted
    }

    /// Opens the file, decodes the header and skips rows already emitted by an earlier pass.
    fn start_pass(&mut self) -> IngestionResult<()> {
        loop {
            let file = File::open(&self.read_path)?;
            let mut rdr = csv::ReaderBuilder::new()
                .has_headers(true)
                .flexible(true)
                .delimiter(self.format.delimiter())
                .from_reader(file);

            let raw = rdr.byte_headers()?.clone();
            // The column set is fixed by the first successful header decode. A later restart
            // only steps past the header record so earlier and later rows share one `Headers`.
            if !self.headers_fixed {
                let Some(names) = decode_header(self.encoding, &raw) else {
                    self.fall_back(0)?;
                    continue;
                };
                self.headers = Arc::from(names);
                self.headers_fixed = true;
            }

            let mut record = ByteRecord::new();
            for _ in 0..self.rows_emitted {
                if !rdr.read_byte_record(&mut record)? {
                    break;
                }
            }

            self.pass = Some(rdr);
            return Ok(());
        }
    }

    /// Switch to the fallback encoding, or fail if it is unavailable or already in use.
    fn fall_back(&mut self, row: usize) -> IngestionResult<()> {
        let failed = self.encoding.name();
        let next = match self.fallback_encoding {
            Some(enc) if !self.fell_back => enc,
            _ => {
                return Err(IngestionError::format(
                    &self.ctx.path,
                    format!("cannot decode data row {row} as {failed}"),
                ));
            }
        };

        tracing::warn!(
            path = %self.ctx.path.display(),
            row,
            from = failed,
            to = next.name(),
            "decode failure, restarting read with fallback encoding"
        );
        if let Some(obs) = self.observer.as_ref() {
            obs.on_encoding_fallback(&self.ctx, next.name(), row);
        }

        self.encoding = next;
        self.fell_back = true;
        self.pass = None;
        Ok(())
    }

    fn fill(&mut self) -> IngestionResult<Fill> {
        let Some(rdr) = self.pass.as_mut() else {
            return Ok(Fill::Rows(Vec::new()));
        };

        let mut rows = Vec::with_capacity(self.chunk_size.min(ROW_PREALLOC));
        let mut record = ByteRecord::new();
        while rows.len() < self.chunk_size {
            if !rdr.read_byte_record(&mut record)? {
                break;
            }
            match decode_record(self.encoding, &record) {
                Some(values) => rows.push(Row::new(Arc::clone(&self.headers), values)),
                None => {
                    return Ok(Fill::DecodeFailed {
                        row: self.rows_emitted + rows.len(),
                    });
                }
            }
        }
        Ok(Fill::Rows(rows))
    }

    fn read_batch(&mut self) -> IngestionResult<Option<Batch>> {
        loop {
            match self.fill()? {
                Fill::Rows(rows) if rows.is_empty() => return Ok(None),
                Fill::Rows(rows) => {
                    let batch = Batch::new(self.batches_emitted, self.rows_emitted, rows);
                    self.batches_emitted += 1;
                    self.rows_emitted += batch.len();
                    tracing::debug!(
                        path = %self.ctx.path.display(),
                        batch = batch.index,
                        rows = batch.len(),
                        "read batch"
                    );
                    return Ok(Some(batch));
                }
                Fill::DecodeFailed { row } => {
                    self.fall_back(row)?;
                    self.start_pass()?;
                }
            }
        }
    }

    /// Release the file handle and the transient file. Idempotent.
    fn close(&mut self) {
        self.done = true;
        self.pass = None;
        if let Some(mut transient) = self.transient.take() {
            transient.remove();
        }
    }
}

impl Iterator for ChunkedReader {
    type Item = IngestionResult<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => {
                self.close();
                None
            }
            Err(e) => {
                self.close();
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for ChunkedReader {}

impl Drop for ChunkedReader {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for ChunkedReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedReader")
            .field("path", &self.ctx.path)
            .field("format", &self.format)
            .field("chunk_size", &self.chunk_size)
            .field("encoding", &self.encoding.name())
            .field("fell_back", &self.fell_back)
            .field("rows_emitted", &self.rows_emitted)
            .field("batches_emitted", &self.batches_emitted)
            .field("transient", &self.transient)
            .field("done", &self.done)
            .finish()
    }
}

/// Decode the header record, dropping a leading UTF-8 byte order mark.
fn decode_header(encoding: &'static Encoding, record: &ByteRecord) -> Option<Vec<String>> {
    record
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let field = match i {
                0 => field.strip_prefix(UTF8_BOM).unwrap_or(field),
                _ => field,
            };
            encoding
                .decode_without_bom_handling_and_without_replacement(field)
                .map(Cow::into_owned)
        })
        .collect()
}

fn decode_record(encoding: &'static Encoding, record: &ByteRecord) -> Option<Vec<String>> {
    record
        .iter()
        .map(|field| {
            encoding
                .decode_without_bom_handling_and_without_replacement(field)
                .map(Cow::into_owned)
        })
        .collect()
}

#[cfg(feature = "excel")]
fn normalize(path: &Path, options: &IngestionOptions) -> IngestionResult<TransientFile> {
    super::excel::normalize_workbook(path, options.transient_dir.as_deref())
}

#[cfg(not(feature = "excel"))]
fn normalize(_path: &Path, _options: &IngestionOptions) -> IngestionResult<TransientFile> {
    Err(IngestionError::Dependency {
        capability: "spreadsheet parsing",
        feature: "excel",
    })
}
