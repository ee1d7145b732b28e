//! Benchmarks for the profiling engine.

use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use term_profiler::config::{RuleConfig, Rulesets};
use term_profiler::profiling::{ProfileEngine, RuleKind};
use term_profiler::test_fixtures::mixed_quality;
use tokio::runtime::Runtime;

fn bench_dataset_sizes(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = ProfileEngine::new(RuleConfig::default()).unwrap();

    let mut group = c.benchmark_group("dataset_sizes");
    group.measurement_time(Duration::from_secs(10));

    for rows in [1_000usize, 10_000, 50_000] {
        let batch = Arc::new(mixed_quality(rows).unwrap());
        group.bench_with_input(BenchmarkId::new("all_rules", rows), &batch, |b, batch| {
            b.iter(|| rt.block_on(engine.profile(black_box(Arc::clone(batch)))));
        });
    }

    group.finish();
}

fn bench_rule_selections(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let batch = Arc::new(mixed_quality(10_000).unwrap());

    let mut group = c.benchmark_group("rule_selections");
    group.measurement_time(Duration::from_secs(8));

    let selections = vec![
        (
            "statistics_only",
            Rulesets::none().with(RuleKind::ColumnStatistics, true),
        ),
        (
            "pii_only",
            Rulesets::none().with(RuleKind::PiiDetection, true),
        ),
        (
            "keys_only",
            Rulesets::none().with(RuleKind::CandidateKeys, true),
        ),
        ("all", Rulesets::all()),
    ];

    for (name, rules) in selections {
        let engine = ProfileEngine::new(RuleConfig::builder().rules(rules).build()).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| rt.block_on(engine.profile(black_box(Arc::clone(&batch)))));
        });
    }

    group.finish();
}

fn bench_worker_counts(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let batch = Arc::new(mixed_quality(20_000).unwrap());

    let mut group = c.benchmark_group("worker_counts");
    for workers in [1usize, 2, 4, 8] {
        let engine =
            ProfileEngine::new(RuleConfig::builder().max_workers(workers).build()).unwrap();
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, _| {
            b.iter(|| rt.block_on(engine.profile(black_box(Arc::clone(&batch)))));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_dataset_sizes,
    bench_rule_selections,
    bench_worker_counts
);
criterion_main!(benches);
