// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! The concurrent metrics accumulation engine.
//!
//! A [`Metrics`] instance owns one accumulator table behind one mutex.
//! Evaluation workers call [`update`](Metrics::update) concurrently; scorer
//! functions run outside the lock and each example's results fold in as a
//! single atomic group, so a concurrent [`report`](Metrics::report) never
//! observes a torn update where some but not all keys advanced for the same
//! example.

use crate::report::{round_sigfigs, Report};
use crate::scorer;
use parking_lot::Mutex;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use suda::normalize::normalize_answer;
use suda::{Error, Observation, Result};

/// Ranking cutoffs tracked as `hits@K`.
pub const HITS_AT_K: [usize; 4] = [1, 5, 10, 100];

/// N-gram orders tracked by the distinct-n diversity metrics.
const DISTINCT_ORDERS: [usize; 4] = [1, 2, 3, 4];

/// Counter group shared by the `hits@K` keys.
const HITS_GROUP: &str = "hits@";

/// Metric names an observation's own metrics dict may not override.
const RESERVED_KEYS: [&str; 4] = ["correct", "f1", "hits@k", "bleu"];

/// How the accumulator table is shared between evaluation workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Single-worker table; the lock is never contended.
    Local,
    /// One table folded into by several workers. Dynamic metric keys
    /// cannot be introduced in this mode (see [`Metrics::update`]).
    Shared,
}

/// Evaluation run configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Number of evaluation workers folding into one accumulator.
    pub workers: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// Minimal per-example outcome returned by [`Metrics::update`].
///
/// Run-level state is not required to answer this; everything else is
/// available through [`Metrics::report`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExampleResult {
    /// Whether the generated text exactly matched a reference answer.
    pub correct: bool,
}

type FreqTable = HashMap<String, u64>;

/// Counter group for a scalar key.
///
/// `bleu-1..4` share the `bleu` denominator, `rouge-*` share `rouge`,
/// `intra-distinct-*` share `intra-distinct`, `hits@K` share `hits@`;
/// an ungrouped key pairs with a denominator of its own name.
fn counter_group(key: &str) -> &str {
    if key.starts_with(HITS_GROUP) {
        return HITS_GROUP;
    }
    match key.rsplit_once('-') {
        Some((group, _)) => group,
        None => key,
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    has_textual_predictions: bool,
    has_ranking_candidates: bool,
}

/// The shared mutable store of per-metric running sums and counts.
#[derive(Debug, Default)]
struct Table {
    /// Global example counter; exactly one increment per update.
    cnt: u64,
    /// Running sums per scalar metric key.
    sums: HashMap<String, f64>,
    /// Denominators per counter group.
    counts: HashMap<String, u64>,
    /// Cumulative n-gram tables for the inter-distinct keys; grown over
    /// the whole run, never reset per example.
    freqs: HashMap<String, FreqTable>,
    /// Scalar and frequency keys in registration order.
    keys: Vec<String>,
    flags: Flags,
    /// Bumped whenever a custom key is registered.
    schema_version: u64,
}

impl Table {
    fn with_builtin_keys() -> Self {
        let mut table = Table::default();
        for key in ["mean_rank", "loss", "correct", "f1", "ppl"] {
            table.register_scalar(key);
        }
        #[cfg(feature = "bleu")]
        for n in 1..=4 {
            table.register_scalar(&format!("bleu-{n}"));
        }
        #[cfg(feature = "rouge")]
        for key in ["rouge-1", "rouge-2", "rouge-l"] {
            table.register_scalar(key);
        }
        for n in DISTINCT_ORDERS {
            table.register_scalar(&format!("intra-distinct-{n}"));
        }
        for n in DISTINCT_ORDERS {
            table.register_freq(&format!("inter-distinct-{n}"));
        }
        for k in HITS_AT_K {
            table.sums.insert(format!("hits@{k}"), 0.0);
        }
        table.counts.insert(HITS_GROUP.to_string(), 0);
        table
    }

    fn register_scalar(&mut self, key: &str) {
        self.sums.insert(key.to_string(), 0.0);
        self.counts
            .entry(counter_group(key).to_string())
            .or_insert(0);
        self.keys.push(key.to_string());
    }

    fn register_freq(&mut self, key: &str) {
        self.freqs.insert(key.to_string(), FreqTable::new());
        self.keys.push(key.to_string());
    }

    fn add_scalar(&mut self, key: &str, value: f64) {
        if let Some(sum) = self.sums.get_mut(key) {
            *sum += value;
        }
    }

    fn bump_count(&mut self, group: &str) {
        if let Some(count) = self.counts.get_mut(group) {
            *count += 1;
        }
    }

    fn ratio(&self, key: &str, group: &str) -> f64 {
        let sum = self.sums.get(key).copied().unwrap_or(0.0);
        let count = self.counts.get(group).copied().unwrap_or(0);
        sum / count.max(1) as f64
    }

    fn fold_text(&mut self, scores: TextScores) {
        if let (Some(correct), Some(f1)) = (scores.correct, scores.f1) {
            self.flags.has_textual_predictions = true;
            self.add_scalar("correct", if correct { 1.0 } else { 0.0 });
            self.bump_count("correct");
            self.add_scalar("f1", f1);
            self.bump_count("f1");
        }
        #[cfg(feature = "bleu")]
        if let Some(bleu) = scores.bleu {
            for (i, score) in bleu.iter().enumerate() {
                self.add_scalar(&format!("bleu-{}", i + 1), *score);
            }
            self.bump_count("bleu");
        }
        #[cfg(feature = "rouge")]
        if let Some([r1, r2, rl]) = scores.rouge {
            self.add_scalar("rouge-1", r1);
            self.add_scalar("rouge-2", r2);
            self.add_scalar("rouge-l", rl);
            self.bump_count("rouge");
        }
        for (i, n) in DISTINCT_ORDERS.iter().enumerate() {
            self.add_scalar(&format!("intra-distinct-{n}"), scores.intra[i]);
        }
        self.bump_count("intra-distinct");
        for (n, example_counts) in DISTINCT_ORDERS.iter().zip(scores.inter) {
            if let Some(freq) = self.freqs.get_mut(&format!("inter-distinct-{n}")) {
                for (gram, count) in example_counts {
                    *freq.entry(gram).or_insert(0) += count;
                }
            }
        }
    }

    fn fold_ranking(&mut self, ranking: &RankingHits) {
        self.flags.has_ranking_candidates = true;
        for (hit, k) in ranking.hits.iter().zip(HITS_AT_K) {
            if *hit {
                self.add_scalar(&format!("hits@{k}"), 1.0);
            }
        }
        self.bump_count(HITS_GROUP);
    }

    fn fold_user(&mut self, user: &HashMap<Cow<'_, str>, f64>, mode: StorageMode) {
        for (key, value) in user {
            let key = key.as_ref();
            if RESERVED_KEYS.contains(&key) {
                continue;
            }
            if self.sums.contains_key(key) {
                self.add_scalar(key, *value);
                *self
                    .counts
                    .entry(counter_group(key).to_string())
                    .or_insert(0) += 1;
            } else if self.freqs.contains_key(key) {
                // frequency slots only grow through scored examples
                tracing::debug!(metric = key, "ignoring user value for frequency metric");
            } else {
                match mode {
                    StorageMode::Shared => {
                        // cannot grow the schema while other workers iterate it
                        tracing::debug!(metric = key, "dropping custom metric in shared mode");
                    }
                    StorageMode::Local => {
                        self.register_scalar(key);
                        self.add_scalar(key, *value);
                        *self
                            .counts
                            .entry(counter_group(key).to_string())
                            .or_insert(0) += 1;
                        self.schema_version += 1;
                    }
                }
            }
        }
    }
}

/// Scores computed for one example's generated text, outside the lock.
struct TextScores {
    /// Exact-match outcome; `None` when there were no references to compare.
    correct: Option<bool>,
    f1: Option<f64>,
    #[cfg(feature = "bleu")]
    bleu: Option<[f64; 4]>,
    #[cfg(feature = "rouge")]
    rouge: Option<[f64; 3]>,
    intra: [f64; 4],
    inter: [FreqTable; 4],
}

impl TextScores {
    fn compute<S: AsRef<str>>(text: &str, references: &[S]) -> Self {
        let has_refs = !references.is_empty();
        let correct = has_refs.then(|| scorer::exact_match(text, references));
        let f1 = has_refs.then(|| scorer::f1_score(text, references));

        #[cfg(feature = "bleu")]
        let bleu = if has_refs {
            let mut scores = [0.0; 4];
            let mut complete = true;
            for (i, k) in (1..=4).enumerate() {
                match scorer::bleu_score(text, references, k) {
                    Some(score) => scores[i] = score,
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            complete.then_some(scores)
        } else {
            None
        };

        #[cfg(feature = "rouge")]
        let rouge = if has_refs {
            scorer::rouge_scores(text, references)
        } else {
            None
        };

        Self {
            correct,
            f1,
            #[cfg(feature = "bleu")]
            bleu,
            #[cfg(feature = "rouge")]
            rouge,
            intra: DISTINCT_ORDERS.map(|n| scorer::intra_distinct(text, n)),
            inter: DISTINCT_ORDERS.map(|n| scorer::inter_ngrams(text, n)),
        }
    }
}

/// Ranking hits for one example, computed outside the lock.
struct RankingHits {
    hits: [bool; 4],
}

impl RankingHits {
    fn compute<C: AsRef<str>, S: AsRef<str>>(candidates: &[C], references: &[S]) -> Self {
        let label_set: HashSet<String> = references
            .iter()
            .map(|r| normalize_answer(r.as_ref()))
            .collect();

        // candidates are assumed pre-ranked best-first
        let mut hits = [false; HITS_AT_K.len()];
        for (rank, candidate) in candidates.iter().enumerate() {
            if label_set.contains(&normalize_answer(candidate.as_ref())) {
                for (i, k) in HITS_AT_K.iter().enumerate() {
                    if rank < *k {
                        hits[i] = true;
                    }
                }
            }
        }
        Self { hits }
    }
}

/// Maintains evaluation metrics over a dialog run.
///
/// Workers share one instance (behind an `Arc` or a reference) and call
/// [`update`](Metrics::update) concurrently. One mutex per instance guards
/// the table; independent runs never contend with each other.
#[derive(Debug)]
pub struct Metrics {
    mode: StorageMode,
    inner: Mutex<Table>,
}

impl Metrics {
    /// Create an accumulator for the given run configuration.
    ///
    /// `workers > 1` selects [`StorageMode::Shared`]: several workers fold
    /// into the same table and dynamically introduced metric keys are
    /// dropped to avoid schema races. A zero worker count is a
    /// configuration error; per-example data issues never error.
    pub fn new(config: &MetricsConfig) -> Result<Self> {
        if config.workers == 0 {
            return Err(Error::config("workers must be at least 1"));
        }
        let mode = if config.workers > 1 {
            StorageMode::Shared
        } else {
            StorageMode::Local
        };
        Ok(Self {
            mode,
            inner: Mutex::new(Table::with_builtin_keys()),
        })
    }

    /// Storage mode selected at construction.
    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    /// Number of custom-key registrations accepted so far.
    pub fn schema_version(&self) -> u64 {
        self.inner.lock().schema_version
    }

    /// Fold one example into the table.
    ///
    /// Scorer functions run before the lock is taken; the fold-in itself
    /// is one atomic group covering the example counter, text metrics,
    /// ranking metrics and agent-supplied metrics.
    ///
    /// A missing prediction or an empty reference list short-circuits the
    /// corresponding scorers: they contribute nothing for this example
    /// rather than a zero score, and their denominators do not move.
    pub fn update<S: AsRef<str>>(
        &self,
        observation: &Observation<'_>,
        references: &[S],
    ) -> ExampleResult {
        let text_scores = observation
            .text()
            .map(|text| TextScores::compute(text, references));
        let ranking = observation
            .text_candidates
            .as_deref()
            .map(|candidates| RankingHits::compute(candidates, references));
        let correct = text_scores
            .as_ref()
            .and_then(|scores| scores.correct)
            .unwrap_or(false);

        let mut table = self.inner.lock();
        table.cnt += 1;
        if let Some(scores) = text_scores {
            table.fold_text(scores);
        }
        if let Some(hits) = ranking {
            table.fold_ranking(&hits);
        }
        if let Some(user) = observation.metrics.as_ref() {
            table.fold_user(user, self.mode);
        }
        ExampleResult { correct }
    }

    /// Report the metrics over all data seen so far.
    ///
    /// The snapshot is taken under the lock, so every scalar/counter pair
    /// reflects the same set of folded examples. Metrics with zero
    /// observations are omitted rather than reported as zero.
    pub fn report(&self) -> Report {
        let table = self.inner.lock();
        let mut report = Report::new(table.cnt);
        if table.cnt == 0 {
            return report;
        }

        if table.flags.has_textual_predictions {
            report.insert("accuracy", round_sigfigs(table.ratio("correct", "correct"), 4));
            report.insert("f1", round_sigfigs(table.ratio("f1", "f1"), 4));
        }
        if table.flags.has_ranking_candidates {
            for k in HITS_AT_K {
                let key = format!("hits@{k}");
                report.insert(key.clone(), round_sigfigs(table.ratio(&key, HITS_GROUP), 3));
            }
        }
        for key in &table.keys {
            if let Some(freq) = table.freqs.get(key) {
                if !freq.is_empty() {
                    let total: u64 = freq.values().sum();
                    let ratio = (freq.len() as f64).max(1e-12) / (total as f64).max(1e-5);
                    report.insert(key.clone(), round_sigfigs(ratio, 4));
                }
            } else if key != "correct" && key != "f1" {
                let group = counter_group(key);
                if table.counts.get(group).copied().unwrap_or(0) > 0 {
                    report.insert(key.clone(), round_sigfigs(table.ratio(key, group), 4));
                }
            }
        }
        report
    }

    /// Reset the example counter, all sums and counters, and all frequency
    /// tables to zero/empty.
    ///
    /// Dynamically registered keys stay registered; their values reset like
    /// any other.
    pub fn clear(&self) {
        let mut table = self.inner.lock();
        table.cnt = 0;
        for sum in table.sums.values_mut() {
            *sum = 0.0;
        }
        for count in table.counts.values_mut() {
            *count = 0;
        }
        for freq in table.freqs.values_mut() {
            freq.clear();
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(&MetricsConfig::default()).expect("default config is valid")
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.inner.lock();
        write!(
            f,
            "Metrics(exs={}, sums={:?}, counts={:?})",
            table.cnt, table.sums, table.counts
        )
    }
}
