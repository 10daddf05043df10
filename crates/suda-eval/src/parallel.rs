// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Parallel batch evaluation using Rayon.

use crate::metrics::{ExampleResult, Metrics};
use rayon::prelude::*;
use suda::Observation;

/// Drives [`Metrics::update`] for a whole batch across a thread pool.
///
/// The accumulator should be constructed with a worker count matching the
/// pool size so it selects shared storage up front; updates are serialized
/// at the fold-in step either way.
pub struct ParallelUpdater {
    num_threads: Option<usize>,
}

impl ParallelUpdater {
    /// Create an updater using Rayon's default pool size
    pub fn new() -> Self {
        Self { num_threads: None }
    }

    /// Set the number of worker threads
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Evaluate a batch of (observation, references) pairs against one
    /// shared accumulator. Per-example results come back in batch order.
    pub fn run<S>(
        &self,
        metrics: &Metrics,
        batch: &[(Observation<'_>, Vec<S>)],
    ) -> anyhow::Result<Vec<ExampleResult>>
    where
        S: AsRef<str> + Sync,
    {
        let pool = if let Some(threads) = self.num_threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?
        } else {
            rayon::ThreadPoolBuilder::new().build()?
        };

        let _span = tracing::info_span!("parallel_update", examples = batch.len()).entered();
        Ok(pool.install(|| {
            batch
                .par_iter()
                .map(|(observation, references)| metrics.update(observation, references))
                .collect()
        }))
    }
}

impl Default for ParallelUpdater {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsConfig;

    #[test]
    fn test_parallel_batch_accumulates_everything() {
        let metrics = Metrics::new(&MetricsConfig { workers: 4 }).unwrap();
        let batch: Vec<(Observation, Vec<String>)> = (0..20)
            .map(|i| {
                let text = if i % 2 == 0 { "right" } else { "wrong" };
                (
                    Observation::new().with_text(text),
                    vec!["right".to_string()],
                )
            })
            .collect();

        let results = ParallelUpdater::new()
            .with_threads(4)
            .run(&metrics, &batch)
            .unwrap();

        assert_eq!(results.len(), 20);
        // results keep batch order even though updates interleave
        assert!(results[0].correct);
        assert!(!results[1].correct);

        let report = metrics.report();
        assert_eq!(report.exs, 20);
        assert_eq!(report.get("accuracy"), Some(0.5));
    }

    #[test]
    fn test_parallel_default_pool() {
        let metrics = Metrics::new(&MetricsConfig { workers: 2 }).unwrap();
        let batch: Vec<(Observation, Vec<&str>)> = (0..8)
            .map(|_| (Observation::new().with_text("same"), vec!["same"]))
            .collect();

        let results = ParallelUpdater::default().run(&metrics, &batch).unwrap();
        assert!(results.iter().all(|r| r.correct));
        assert_eq!(metrics.report().exs, 8);
    }
}
