#![cfg(feature = "excel_test_writer")]

use std::path::{Path, PathBuf};

use tabular_stats::ingestion::{load, IngestionFormat, IngestionOptions};
use tabular_stats::pipeline::analyze_path;

fn write_people_xlsx(path: &Path) {
    use rust_xlsxwriter::Workbook;

    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("People").unwrap();

    // header
    ws.write_string(0, 0, "id").unwrap();
    ws.write_string(0, 1, "name").unwrap();
    ws.write_string(0, 2, "score").unwrap();

    ws.write_number(1, 0, 1).unwrap();
    ws.write_string(1, 1, "Ada, Countess").unwrap();
    ws.write_number(1, 2, 98.5).unwrap();

    ws.write_number(2, 0, 2).unwrap();
    ws.write_string(2, 1, "Grace").unwrap();
    // score left blank

    ws.write_number(3, 0, 3).unwrap();
    ws.write_string(3, 1, "Linus").unwrap();
    ws.write_number(3, 2, 77.5).unwrap();

    // later sheets are ignored
    let ws2 = wb.add_worksheet();
    ws2.set_name("Other").unwrap();
    ws2.write_string(0, 0, "unrelated").unwrap();

    wb.save(path).unwrap();
}

fn write_empty_xlsx(path: &Path) {
    let mut wb = rust_xlsxwriter::Workbook::new();
    wb.add_worksheet();
    wb.save(path).unwrap();
}

fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

#[test]
fn first_sheet_is_streamed_as_rows() {
    let src = tempfile::tempdir().unwrap();
    let path = src.path().join("people.xlsx");
    write_people_xlsx(&path);

    let reader = load(&path, &IngestionOptions::with_chunk_size(2)).unwrap();
    assert_eq!(reader.format(), IngestionFormat::Excel);
    assert_eq!(reader.headers().to_vec(), vec!["id", "name", "score"]);

    let batches: Vec<_> = reader.map(|b| b.unwrap()).collect();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].rows[0].get("name"), Some("Ada, Countess"));
    assert_eq!(batches[0].rows[0].get("score"), Some("98.5"));
    assert_eq!(batches[0].rows[1].get("score"), Some(""));
    assert_eq!(batches[1].rows[0].get("id"), Some("3"));
}

#[test]
fn workbook_statistics() {
    let src = tempfile::tempdir().unwrap();
    let path = src.path().join("people.xlsx");
    write_people_xlsx(&path);

    let snap = analyze_path(&path, &IngestionOptions::default()).unwrap().snapshot;
    assert_eq!(snap.count["id"], 3);
    assert_eq!(snap.mean["id"], 2.0);
    assert_eq!(snap.count["score"], 2);
    assert_eq!(snap.mean["score"], 88.0);
    assert_eq!(snap.min["score"], 77.5);
    assert_eq!(snap.max["score"], 98.5);
    assert_eq!(snap.count["name"], 0);
}

#[test]
fn transient_file_is_removed_after_exhaustion() {
    let src = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let path = src.path().join("people.xlsx");
    write_people_xlsx(&path);

    let opts = IngestionOptions {
        chunk_size: 1,
        transient_dir: Some(scratch.path().to_path_buf()),
        ..Default::default()
    };
    let mut reader = load(&path, &opts).unwrap();

    let transient = reader.transient_path().unwrap().to_path_buf();
    assert!(transient.starts_with(scratch.path()));
    assert!(transient.exists());
    assert_eq!(transient.extension().and_then(|e| e.to_str()), Some("csv"));

    let mut n = 0;
    for batch in reader.by_ref() {
        batch.unwrap();
        n += 1;
    }
    assert_eq!(n, 3);
    assert!(reader.transient_path().is_none());
    assert!(!transient.exists());
    assert!(dir_entries(scratch.path()).is_empty());
}

#[test]
fn transient_file_is_removed_when_reader_is_dropped_early() {
    let src = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let path = src.path().join("people.xlsx");
    write_people_xlsx(&path);

    let opts = IngestionOptions {
        chunk_size: 1,
        transient_dir: Some(scratch.path().to_path_buf()),
        ..Default::default()
    };
    let mut reader = load(&path, &opts).unwrap();
    reader.next().unwrap().unwrap();
    assert_eq!(dir_entries(scratch.path()).len(), 1);

    drop(reader);
    assert!(dir_entries(scratch.path()).is_empty());
}

#[test]
fn empty_sheet_is_format_error_without_leftovers() {
    let src = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let path = src.path().join("empty.xlsx");
    write_empty_xlsx(&path);

    let opts = IngestionOptions {
        transient_dir: Some(scratch.path().to_path_buf()),
        ..Default::default()
    };
    let err = load(&path, &opts).unwrap_err();
    assert!(err.is_format());
    assert!(dir_entries(scratch.path()).is_empty());
}

#[test]
fn corrupt_workbook_is_format_error() {
    let src = tempfile::tempdir().unwrap();
    let path = src.path().join("broken.xlsx");
    std::fs::write(&path, b"this is not a zip archive").unwrap();

    let err = load(&path, &IngestionOptions::default()).unwrap_err();
    assert!(err.is_format());
}

#[test]
fn macro_enabled_extension_is_read_as_workbook() {
    let src = tempfile::tempdir().unwrap();
    let xlsx = src.path().join("people.xlsx");
    write_people_xlsx(&xlsx);
    let xlsm = src.path().join("PEOPLE.XLSM");
    std::fs::copy(&xlsx, &xlsm).unwrap();

    let analysis = analyze_path(&xlsm, &IngestionOptions::default()).unwrap();
    assert_eq!(analysis.stats.rows, 3);
}
