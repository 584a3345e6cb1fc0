//! Benchmarks for the interval-set algebra and aggregate merging.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chronostat::prelude::*;

/// Builds a set of `n` disjoint unit intervals with unit gaps.
fn comb(n: usize, offset: f64) -> IntervalSet {
    let mut endpoints = Vec::with_capacity(n * 2);
    for i in 0..n {
        let start = offset + (i * 2) as f64;
        endpoints.push(start);
        endpoints.push(start + 1.0);
    }
    IntervalSet::new(endpoints).unwrap()
}

fn bench_interval_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("interval_union");
    for size in [16usize, 256, 4096] {
        let a = comb(size, 0.0);
        let b = comb(size, 0.5);
        group.bench_with_input(BenchmarkId::new("interleaved", size), &size, |bench, _| {
            bench.iter(|| black_box(&a).union(black_box(&b)).unwrap());
        });
        let far = comb(size, (size * 4) as f64);
        group.bench_with_input(BenchmarkId::new("disjoint", size), &size, |bench, _| {
            bench.iter(|| black_box(&a).union(black_box(&far)).unwrap());
        });
    }
    group.finish();
}

fn bench_interval_intersection(c: &mut Criterion) {
    let mut group = c.benchmark_group("interval_intersection");
    for size in [16usize, 256, 4096] {
        let a = comb(size, 0.0);
        let b = comb(size, 0.5);
        group.bench_with_input(BenchmarkId::new("interleaved", size), &size, |bench, _| {
            bench.iter(|| black_box(&a).intersection(black_box(&b)).unwrap());
        });
    }
    group.finish();
}

fn bench_frame_rounding(c: &mut Criterion) {
    let frame = FrameSpec::default();
    let a = comb(1024, 3.0);
    c.bench_function("frame_rounding_1024", |bench| {
        bench.iter(|| black_box(&a).round_to_frame_times(black_box(&frame)).unwrap());
    });
}

fn bench_report_from_samples(c: &mut Criterion) {
    let config = ReportConfig::default()
        .with_bitrate(64)
        .with_histogram(HistogramSpec {
            range: (-2.0, 2.0),
            num_bins: 64,
        });
    let rows: Vec<Vec<f64>> = (0..64)
        .map(|r| (0..64).map(|o| ((r * o) % 7) as f64 * 0.1 - 0.3).collect())
        .collect();
    let block = SampleBlock::from_rows(rows).unwrap();
    let window = IntervalSet::from_range(0.0, 64.0).unwrap();

    c.bench_function("report_from_samples_64x64", |bench| {
        bench.iter(|| {
            Report::from_samples(
                ReportKind::IrigB,
                black_box(&block),
                black_box(&window),
                black_box(&config),
            )
            .unwrap()
        });
    });
}

fn bench_report_union(c: &mut Criterion) {
    let config = ReportConfig::default()
        .with_bitrate(256)
        .with_histogram(HistogramSpec {
            range: (-2.0, 2.0),
            num_bins: 128,
        });
    let block = SampleBlock::from_rows(vec![vec![0.1; 256]; 8]).unwrap();
    let a = Report::from_samples(
        ReportKind::IrigB,
        &block,
        &IntervalSet::from_range(0.0, 64.0).unwrap(),
        &config,
    )
    .unwrap();
    let b = Report::from_samples(
        ReportKind::IrigB,
        &block,
        &IntervalSet::from_range(64.0, 128.0).unwrap(),
        &config,
    )
    .unwrap();

    c.bench_function("report_union_256x128", |bench| {
        bench.iter(|| black_box(&a).union(black_box(&b)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_interval_union,
    bench_interval_intersection,
    bench_frame_rounding,
    bench_report_from_samples,
    bench_report_union
);
criterion_main!(benches);
