use std::hint::black_box;
use std::path::Path;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tabular_stats::ingestion::{IngestionOptions, load};
use tabular_stats::pipeline::analyze_path;

const ROWS: usize = 200_000;

fn write_synthetic_csv(path: &Path, rows: usize) {
    let mut body = String::with_capacity(rows * 32);
    body.push_str("id,value,category,ratio\n");
    for i in 0..rows {
        body.push_str(&format!("{i},{},cat{},{}\n", (i % 1_000) as f64 * 0.5, i % 7, i as f64 / 3.0));
    }
    std::fs::write(path, body).unwrap();
}

fn ingestion(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("synthetic.csv");
    write_synthetic_csv(&path, ROWS);

    let mut group = c.benchmark_group("ingestion");
    group.sample_size(10);
    group.throughput(Throughput::Elements(ROWS as u64));

    for chunk_size in [1_000, 50_000, 500_000] {
        group.bench_with_input(BenchmarkId::new("read_batches", chunk_size), &chunk_size, |b, &n| {
            b.iter(|| {
                let reader = load(&path, &IngestionOptions::with_chunk_size(n)).unwrap();
                let rows: usize = reader.map(|batch| batch.unwrap().len()).sum();
                black_box(rows)
            })
        });
    }

    group.bench_function("analyze_path", |b| {
        b.iter(|| {
            let analysis = analyze_path(&path, &IngestionOptions::with_chunk_size(50_000)).unwrap();
            black_box(analysis.snapshot)
        })
    });

    group.finish();
}

criterion_group!(benches, ingestion);
criterion_main!(benches);
