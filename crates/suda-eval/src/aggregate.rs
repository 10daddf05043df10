// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Cross-task report aggregation.
//!
//! Each independently evaluated task (or data shard) produces its own
//! [`Report`]; [`aggregate`] merges them into one combined summary with a
//! per-task breakdown and equal-weight means of the headline metrics.

use crate::report::{round_sigfigs, Report};
use serde::Serialize;
use std::collections::BTreeMap;

/// Headline metrics averaged across tasks.
#[cfg(feature = "bleu")]
const HEADLINE_KEYS: [&str; 5] = ["accuracy", "f1", "loss", "ppl", "bleu"];
#[cfg(not(feature = "bleu"))]
const HEADLINE_KEYS: [&str; 4] = ["accuracy", "f1", "loss", "ppl"];

/// Anything that can identify itself and snapshot its metrics.
pub trait Reporter {
    /// Stable identifier of the task or shard.
    fn id(&self) -> &str;

    /// Snapshot of the metrics accumulated so far.
    fn report(&self) -> Report;
}

/// Combined summary over several task reports.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CombinedReport {
    /// Per-task sub-reports keyed by (deduplicated) task identifier.
    pub tasks: BTreeMap<String, Report>,

    /// Total examples seen across all tasks.
    pub exs: u64,

    /// Equal-weight means of the headline keys across the tasks that
    /// reported them.
    #[serde(flatten)]
    pub means: BTreeMap<String, f64>,
}

impl CombinedReport {
    /// Get an across-task mean by key
    pub fn mean(&self, key: &str) -> Option<f64> {
        self.means.get(key).copied()
    }

    /// Get one task's sub-report
    pub fn task(&self, id: &str) -> Option<&Report> {
        self.tasks.get(id)
    }
}

/// Merge the reports of several independent tasks into one summary.
///
/// Identifier collisions are resolved by appending `_` until the id is
/// unique. For each headline key the mean is taken over the tasks that
/// reported that key at all; a task that never reported it does not count
/// toward the denominator, and example counts never weight the mean.
/// `accuracy` defaults to 0 when no task reported it.
pub fn aggregate(reporters: &[&dyn Reporter]) -> CombinedReport {
    let mut combined = CombinedReport::default();
    let mut sums: BTreeMap<&str, (f64, u64)> = BTreeMap::new();

    for reporter in reporters {
        let report = reporter.report();
        let mut tid = reporter.id().to_string();
        while combined.tasks.contains_key(&tid) {
            tid.push('_');
        }

        combined.exs += report.exs;
        for key in HEADLINE_KEYS {
            if let Some(value) = report.get(key) {
                let entry = sums.entry(key).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }
        combined.tasks.insert(tid, report);
    }

    combined.means.insert("accuracy".to_string(), 0.0);
    for (key, (sum, tasks)) in sums {
        combined
            .means
            .insert(key.to_string(), round_sigfigs(sum / tasks as f64, 4));
    }
    combined
}
