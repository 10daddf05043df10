// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Benchmarks for the metrics accumulator hot path.
//!
//! Measures the per-example cost of scoring plus fold-in, and the cost of
//! taking a snapshot from a populated table.

use criterion::{criterion_group, criterion_main, Criterion};
use suda::Observation;
use suda_eval::{Metrics, MetricsConfig};

fn bench_update(c: &mut Criterion) {
    let metrics = Metrics::new(&MetricsConfig::default()).unwrap();
    let obs = Observation::new().with_text("the quick brown fox jumps over the lazy dog");
    let refs = ["a quick brown fox leaps over a lazy dog"];

    c.bench_function("update_textual", |b| b.iter(|| metrics.update(&obs, &refs)));

    let ranking = Observation::new().with_candidates((0..100).map(|i| format!("candidate {i}")));
    c.bench_function("update_ranking", |b| {
        b.iter(|| metrics.update(&ranking, &["candidate 42"]))
    });
}

fn bench_report(c: &mut Criterion) {
    let metrics = Metrics::new(&MetricsConfig { workers: 4 }).unwrap();
    for i in 0..1000 {
        let text = format!("reply number {i} about topic {}", i % 7);
        metrics.update(&Observation::new().with_text(text), &["reply about topic"]);
    }

    c.bench_function("report_1000_examples", |b| b.iter(|| metrics.report()));
}

criterion_group!(benches, bench_update, bench_report);
criterion_main!(benches);
