#![cfg(not(feature = "excel"))]

use tabular_stats::ingestion::{load, IngestionOptions};
use tabular_stats::IngestionError;

#[test]
fn workbook_input_needs_the_excel_feature() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");
    std::fs::write(&path, b"PK").unwrap();

    let err = load(&path, &IngestionOptions::default()).unwrap_err();
    assert!(err.is_dependency());
    match err {
        IngestionError::Dependency { feature, .. } => assert_eq!(feature, "excel"),
        other => panic!("unexpected error: {other}"),
    }
}
