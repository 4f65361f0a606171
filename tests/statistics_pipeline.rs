use std::path::{Path, PathBuf};

use tabular_stats::analysis::{StatsEngine, StatsSnapshot};
use tabular_stats::ingestion::{load, IngestionOptions};
use tabular_stats::pipeline::{analyze_path, run, DEFAULT_REPORT_NAME};
use tabular_stats::report::ReportAggregator;

const FIXTURE: &str = "tests/fixtures/measurements.csv";

fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn stats_with_chunk(path: &Path, chunk_size: usize) -> StatsSnapshot {
    analyze_path(path, &IngestionOptions::with_chunk_size(chunk_size))
        .unwrap()
        .snapshot
}

#[test]
fn mixed_numeric_and_text_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "a.csv", "a,b\n1,x\n2,y\n3,\n");

    let snap = analyze_path(&path, &IngestionOptions::default()).unwrap().snapshot;
    assert_eq!(snap.count["a"], 3);
    assert_eq!(snap.count["b"], 0);
    assert_eq!(snap.mean["a"], 2.0);
    assert_eq!(snap.mean["b"], 0.0);
    assert_eq!(snap.min["a"], 1.0);
    assert_eq!(snap.max["a"], 3.0);
    assert_eq!(snap.empty_columns, vec!["b".to_string()]);
}

#[test]
fn header_only_input_reports_every_column_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "b.csv", "a,b\n");

    let analysis = analyze_path(&path, &IngestionOptions::default()).unwrap();
    let snap = &analysis.snapshot;
    assert_eq!(snap.columns().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(snap.count["a"], 0);
    assert_eq!(snap.count["b"], 0);
    assert_eq!(snap.mean["a"], 0.0);
    assert_eq!(snap.mean["b"], 0.0);
    assert_eq!(analysis.stats.rows, 0);
    assert_eq!(analysis.stats.batches, 0);
}

#[test]
fn nan_cell_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "e.csv", "x,y\n1,10\nNaN,20\n3,30\n");

    let snap = analyze_path(&path, &IngestionOptions::default()).unwrap().snapshot;
    assert_eq!(snap.count["x"], 2);
    assert_eq!(snap.mean["x"], 2.0);
    assert_eq!(snap.count["y"], 3);
}

#[test]
fn fixture_statistics() {
    let analysis = analyze_path(FIXTURE, &IngestionOptions::default()).unwrap();
    let snap = &analysis.snapshot;

    assert_eq!(analysis.stats.rows, 5);
    assert_eq!(analysis.stats.columns, 4);
    assert!(!analysis.stats.fell_back);

    assert_eq!(snap.count["temperature"], 4);
    assert_eq!(snap.mean["temperature"], 5.0);
    assert_eq!(snap.min["temperature"], -2.5);
    assert_eq!(snap.max["temperature"], 11.0);

    assert_eq!(snap.count["humidity"], 4);
    assert_eq!(snap.mean["humidity"], 83.5);
    assert_eq!(snap.min["humidity"], 70.0);
    assert_eq!(snap.max["humidity"], 95.0);

    assert_eq!(snap.count["station"], 0);
    assert_eq!(snap.count["note"], 0);
    assert_eq!(snap.empty_columns, vec!["note".to_string(), "station".to_string()]);
}

#[test]
fn mean_lies_between_min_and_max() {
    let snap = analyze_path(FIXTURE, &IngestionOptions::default()).unwrap().snapshot;
    for column in snap.columns() {
        if snap.count[column] > 0 {
            assert!(snap.min[column] <= snap.mean[column], "{column}");
            assert!(snap.mean[column] <= snap.max[column], "{column}");
        }
    }
}

#[test]
fn results_do_not_depend_on_chunk_size() {
    let dir = tempfile::tempdir().unwrap();
    let mut body = String::from("k,v,w\n");
    for i in 0..97 {
        body.push_str(&format!("{i},{},{}\n", (i % 13) as f64 * 0.25, if i % 5 == 0 { "-" } else { "7" }));
    }
    let path = write_csv(dir.path(), "big.csv", &body);

    let whole = stats_with_chunk(&path, 97);
    for chunk_size in [1, 4, 10, 96, 1_000] {
        assert_eq!(stats_with_chunk(&path, chunk_size), whole, "chunk_size={chunk_size}");
    }
    assert_eq!(whole.count["w"], 77);
}

#[test]
fn manual_pipeline_matches_analyze_path() {
    let reader = load(FIXTURE, &IngestionOptions::with_chunk_size(2)).unwrap();
    let mut engine = StatsEngine::new();
    engine.declare_columns(reader.headers().iter());
    for batch in reader {
        engine.process(&batch.unwrap());
    }
    assert_eq!(engine.rows_seen(), 5);

    let mut aggregator = ReportAggregator::new();
    aggregator.add("manual", engine.finalize());
    let report = aggregator.consolidate();

    let expected = analyze_path(FIXTURE, &IngestionOptions::default()).unwrap().snapshot;
    assert_eq!(report.stats("manual"), Some(&expected));
}

#[test]
fn run_reports_under_the_given_name() {
    let report = run(FIXTURE, DEFAULT_REPORT_NAME, &IngestionOptions::default()).unwrap();
    assert_eq!(report.names().collect::<Vec<_>>(), vec!["basic_stats"]);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["basic_stats"]["count"]["temperature"], 4);
    assert_eq!(json["basic_stats"]["mean"]["humidity"], 83.5);
    assert_eq!(json["basic_stats"]["max"]["station"], 0.0);
    assert!(json["basic_stats"].get("empty_columns").is_none());
}

#[test]
fn run_propagates_not_found() {
    let err = run("tests/fixtures/nope.csv", "x", &IngestionOptions::default()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn latin1_file_is_analyzed_after_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latin1.csv");
    std::fs::write(&path, b"ville,temp\xe9rature\nS\xe8te,12.5\nN\xeemes,15.5\n").unwrap();

    let analysis = analyze_path(&path, &IngestionOptions::default()).unwrap();
    assert!(analysis.stats.fell_back);
    assert_eq!(analysis.snapshot.count["température"], 2);
    assert_eq!(analysis.snapshot.mean["température"], 14.0);
}

#[test]
fn fallback_after_first_batch_keeps_one_column_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.csv");
    std::fs::write(&path, b"temp\xc3\xa9rature,ville\n1,a\n3,N\xeemes\n").unwrap();

    let analysis = analyze_path(&path, &IngestionOptions::with_chunk_size(1)).unwrap();
    let snap = &analysis.snapshot;
    assert!(analysis.stats.fell_back);
    assert_eq!(snap.column_count(), 2);
    assert_eq!(snap.count["température"], 2);
    assert_eq!(snap.mean["température"], 2.0);
    assert_eq!(snap.count["ville"], 0);
}
