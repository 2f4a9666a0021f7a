//! Benchmarks for the statistic reducers
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use opex_pulse::stats::{reducers, ReducerRegistry, StatOperation};

fn create_test_samples(count: usize) -> Vec<f64> {
    // Deterministic, unsorted input
    (0..count)
        .map(|i| ((i * 7919) % count) as f64 * 0.5 + 1.0)
        .collect()
}

fn bench_linear_reducers(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear");

    for size in [1_440, 10_080, 43_200] {
        let samples = create_test_samples(size);

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("min_{}", size), |b| {
            b.iter(|| reducers::min(black_box(&samples)))
        });

        group.bench_function(format!("mean_{}", size), |b| {
            b.iter(|| reducers::mean(black_box(&samples)))
        });
    }

    group.finish();
}

fn bench_quantiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantile");

    for size in [1_440, 10_080, 43_200] {
        let samples = create_test_samples(size);

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("median_{}", size), |b| {
            b.iter(|| reducers::median(black_box(&samples)))
        });

        group.bench_function(format!("p99_{}", size), |b| {
            b.iter(|| reducers::p99(black_box(&samples)))
        });
    }

    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    let registry = ReducerRegistry::standard();
    let samples = create_test_samples(10_080);

    for op in StatOperation::builtin() {
        group.bench_function(format!("reduce_{}", op), |b| {
            b.iter(|| registry.reduce(black_box(op), black_box(&samples)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_linear_reducers, bench_quantiles, bench_registry);
criterion_main!(benches);
