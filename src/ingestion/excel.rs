#![cfg(feature = "excel")]

//! Workbook → CSV normalization.
//!
//! The chunked reader only streams delimited text, so a workbook is first rewritten as a
//! transient CSV with the same header row and the cells' display text.

use std::io::{BufWriter, Write};
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tempfile::NamedTempFile;

use crate::error::{IngestionError, IngestionResult};

use super::transient::TransientFile;

/// Rewrite the first worksheet of the workbook at `path` as a transient CSV file.
///
/// Behavior:
/// - Only the first worksheet is read (the active sheet of a workbook as saved).
/// - The first non-empty row is the header; every later row of the used range becomes one
///   CSV record of display text (empty cells stay empty).
/// - The transient file is created in `dir`, or the OS temp dir when `dir` is `None`, with a
///   unique name, and only after the worksheet has been validated.
///
/// Fails with [`IngestionError::Format`] if the workbook cannot be read, has no worksheet, or
/// the worksheet has no rows. A partially written file is removed before the error returns.
pub fn normalize_workbook(path: &Path, dir: Option<&Path>) -> IngestionResult<TransientFile> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| IngestionError::format_with_source(path, "cannot open workbook", e))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => {
            return Err(IngestionError::format_with_source(
                path,
                "cannot read first worksheet",
                e,
            ));
        }
        None => return Err(IngestionError::format(path, "workbook has no worksheet")),
    };

    let header_row_idx = first_non_empty_row(&range)
        .ok_or_else(|| IngestionError::format(path, "active worksheet has no rows (no header row found)"))?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("workbook");
    let prefix = format!(".{stem}-");
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".csv");
    let file = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| IngestionError::format_with_source(path, "cannot create transient csv", e))?;

    let written = write_range_as_csv(&range, header_row_idx, file.as_file());
    let transient = persist(path, file, written)?;

    let records = range.height().saturating_sub(header_row_idx);
    tracing::debug!(
        source = %path.display(),
        transient = %transient.path().display(),
        records,
        "normalized worksheet to csv"
    );
    Ok(transient)
}

fn first_non_empty_row(range: &Range<Data>) -> Option<usize> {
    range
        .rows()
        .position(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
}

/// Hand `file` over to a [`TransientFile`] guard, or drop it (removing the partial output) if
/// writing failed.
fn persist(path: &Path, file: NamedTempFile, written: Result<(), csv::Error>) -> IngestionResult<TransientFile> {
    written.map_err(|e| IngestionError::format_with_source(path, "cannot write transient csv", e))?;
    Ok(TransientFile::new(file.into_temp_path()))
}

fn write_range_as_csv<W: Write>(range: &Range<Data>, header_row_idx: usize, out: W) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(out));

    for row in range.rows().skip(header_row_idx) {
        wtr.write_record(row.iter().map(cell_to_string))?;
    }

    wtr.flush()?;
    Ok(())
}

fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        _ => c.to_string(),
    }
}
