//! Benchmarks for suite execution over generated datasets.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dqf_guard::core::{run_suite, run_suite_concurrent, CheckSpec, DatasetSpec, RunContext, SuiteSpec};
use dqf_guard::test_fixtures::generated_orders;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn context(rows: usize) -> RunContext {
    let mut datasets = HashMap::new();
    datasets.insert("orders".to_string(), generated_orders(rows));
    datasets.insert("reference".to_string(), generated_orders(rows / 2));
    RunContext::new("bench", datasets)
}

fn suite() -> SuiteSpec {
    let checks = [
        ("schema", json!({"columns": {"order_id": "int", "amount": "float"}})),
        ("null_rate", json!({"thresholds": {"customer_id": 0.2, "amount": 0.0}})),
        ("range", json!({"column": "amount", "min": 0, "max": 1000})),
        ("unique", json!({"columns": ["order_id"]})),
        ("unique", json!({"columns": ["customer_id", "amount"]})),
        (
            "fk",
            json!({"column": "customer_id", "ref_dataset": "reference", "ref_column": "order_id"}),
        ),
    ];

    let mut dataset = DatasetSpec::new("orders", "orders.csv");
    for (tag, params) in checks {
        dataset = dataset.with_check(CheckSpec::from_json(tag, params).unwrap());
    }
    SuiteSpec::builder("bench").dataset(dataset).build()
}

fn bench_run_suite(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_suite");
    group.measurement_time(Duration::from_secs(8));
    let suite = suite();

    for rows in [1_000, 10_000, 100_000] {
        let ctx = context(rows);
        group.bench_with_input(BenchmarkId::new("sequential", rows), &ctx, |b, ctx| {
            b.iter(|| run_suite(black_box(&suite), black_box(ctx)));
        });
    }

    group.finish();
}

fn bench_run_suite_concurrent(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("run_suite_concurrent");
    group.measurement_time(Duration::from_secs(8));
    let suite = Arc::new(suite());

    for rows in [10_000, 100_000] {
        let ctx = Arc::new(context(rows));
        group.bench_with_input(BenchmarkId::new("blocking_pool", rows), &ctx, |b, ctx| {
            b.iter(|| rt.block_on(run_suite_concurrent(Arc::clone(&suite), Arc::clone(ctx))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_run_suite, bench_run_suite_concurrent);
criterion_main!(benches);
