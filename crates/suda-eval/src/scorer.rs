// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Scorer functions over normalized text.
//!
//! Each scorer is a pure function mapping a candidate and a set of reference
//! answers to a score. All comparisons run on [`normalize_answer`]ed text.
//!
//! # Features
//!
//! - `bleu` - Enable the BLEU-k n-gram overlap scorer
//! - `rouge` - Enable the ROUGE-1/2/L scorers
//!
//! A disabled feature behaves like a missing optional scoring library: the
//! engine never registers the corresponding metric keys and reports simply
//! omit them.

use std::collections::HashMap;
use suda::normalize::{ngram_key, ngrams, normalize_answer, tokenize};

// ============================================================================
// Token overlap scorers
// ============================================================================

/// Check if the guess is a (normalized) exact match with any answer.
pub fn exact_match<S: AsRef<str>>(guess: &str, answers: &[S]) -> bool {
    if answers.is_empty() {
        return false;
    }
    let guess = normalize_answer(guess);
    answers.iter().any(|a| normalize_answer(a.as_ref()) == guess)
}

/// Precision, recall and F1 over two token multisets.
///
/// Overlap is clipped per token: a token occurring twice in the prediction
/// but once in the gold answer contributes one match.
fn prec_recall_f1(pred: &[&str], gold: &[&str]) -> (f64, f64, f64) {
    if pred.is_empty() || gold.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let mut gold_counts: HashMap<&str, u64> = HashMap::new();
    for &t in gold {
        *gold_counts.entry(t).or_insert(0) += 1;
    }
    let mut pred_counts: HashMap<&str, u64> = HashMap::new();
    for &t in pred {
        *pred_counts.entry(t).or_insert(0) += 1;
    }

    let num_same: u64 = pred_counts
        .iter()
        .map(|(t, c)| (*c).min(gold_counts.get(t).copied().unwrap_or(0)))
        .sum();
    if num_same == 0 {
        return (0.0, 0.0, 0.0);
    }

    let precision = num_same as f64 / pred.len() as f64;
    let recall = num_same as f64 / gold.len() as f64;
    let f1 = 2.0 * precision * recall / (precision + recall);
    (precision, recall, f1)
}

/// Return the max token-overlap F1 between the guess and *any* answer.
pub fn f1_score<S: AsRef<str>>(guess: &str, answers: &[S]) -> f64 {
    let guess = normalize_answer(guess);
    let g_tokens = tokenize(&guess);
    answers
        .iter()
        .map(|a| {
            let a = normalize_answer(a.as_ref());
            let (_, _, f1) = prec_recall_f1(&g_tokens, &tokenize(&a));
            f1
        })
        .fold(0.0, f64::max)
}

// ============================================================================
// Diversity scorers
// ============================================================================

/// Occurrence counts of the n-gram windows of a token sequence.
fn ngram_counts(tokens: &[&str], n: usize) -> HashMap<String, u64> {
    let mut counts = HashMap::new();
    for window in ngrams(tokens, n) {
        *counts.entry(ngram_key(window)).or_insert(0) += 1;
    }
    counts
}

/// Per-example distinct-n ratio: unique n-grams over total n-grams.
///
/// Macro-averaged across examples by the accumulator. The epsilon floors
/// keep degenerate inputs (no n-grams at all) near zero instead of
/// dividing by zero.
pub fn intra_distinct(guess: &str, n: usize) -> f64 {
    let normalized = normalize_answer(guess);
    let counts = ngram_counts(&tokenize(&normalized), n);
    let total: u64 = counts.values().sum();
    (counts.len() as f64).max(1e-12) / (total as f64).max(1e-5)
}

/// N-gram occurrence counts for one example, to fold into the cumulative
/// inter-example frequency table.
pub fn inter_ngrams(guess: &str, n: usize) -> HashMap<String, u64> {
    let normalized = normalize_answer(guess);
    ngram_counts(&tokenize(&normalized), n)
}

/// Clipped n-gram overlap between two occurrence-count tables.
#[cfg(any(feature = "bleu", feature = "rouge"))]
fn clipped_overlap(pred: &HashMap<String, u64>, gold: &HashMap<String, u64>) -> u64 {
    pred.iter()
        .map(|(k, c)| (*c).min(gold.get(k).copied().unwrap_or(0)))
        .sum()
}

// ============================================================================
// BLEU (optional)
// ============================================================================

#[cfg(feature = "bleu")]
pub use bleu_impl::*;

#[cfg(feature = "bleu")]
mod bleu_impl {
    use super::*;
    use smallvec::SmallVec;

    /// Floor for zero n-gram precisions, so one missing order does not
    /// wipe out the whole geometric mean.
    const SMOOTH_EPSILON: f64 = 1e-12;

    /// Compute approximate BLEU-k between the guess and a set of answers.
    ///
    /// Uniform 1/k weights over n-gram orders 1..=k, epsilon smoothing for
    /// zero precisions, brevity penalty against the compared answer, best
    /// score over all answers. Returns `None` when the pair carries no
    /// token evidence to score, which the engine treats as "metric absent
    /// for this example".
    pub fn bleu_score<S: AsRef<str>>(guess: &str, answers: &[S], k: usize) -> Option<f64> {
        let guess = normalize_answer(guess);
        let g_tokens = tokenize(&guess);
        if g_tokens.is_empty() || answers.is_empty() {
            return None;
        }

        let mut best: Option<f64> = None;
        for answer in answers {
            let answer = normalize_answer(answer.as_ref());
            let a_tokens = tokenize(&answer);
            if a_tokens.is_empty() {
                continue;
            }
            let score = sentence_bleu(&g_tokens, &a_tokens, k);
            best = Some(best.map_or(score, |b| b.max(score)));
        }
        best
    }

    fn sentence_bleu(cand: &[&str], reference: &[&str], k: usize) -> f64 {
        let weight = 1.0 / k as f64;
        let mut precisions: SmallVec<[f64; 4]> = SmallVec::new();
        for n in 1..=k {
            precisions.push(modified_precision(cand, reference, n));
        }

        let log_sum: f64 = precisions
            .iter()
            .map(|p| weight * p.max(SMOOTH_EPSILON).ln())
            .sum();
        brevity_penalty(cand.len(), reference.len()) * log_sum.exp()
    }

    /// Modified (clipped) n-gram precision of the candidate vs the reference.
    fn modified_precision(cand: &[&str], reference: &[&str], n: usize) -> f64 {
        let cand_counts = ngram_counts(cand, n);
        let total: u64 = cand_counts.values().sum();
        if total == 0 {
            return 0.0;
        }
        let ref_counts = ngram_counts(reference, n);
        clipped_overlap(&cand_counts, &ref_counts) as f64 / total as f64
    }

    fn brevity_penalty(cand_len: usize, ref_len: usize) -> f64 {
        if cand_len >= ref_len {
            1.0
        } else if cand_len == 0 {
            0.0
        } else {
            (1.0 - ref_len as f64 / cand_len as f64).exp()
        }
    }
}

// ============================================================================
// ROUGE (optional)
// ============================================================================

#[cfg(feature = "rouge")]
pub use rouge_impl::*;

#[cfg(feature = "rouge")]
mod rouge_impl {
    use super::*;

    /// Compute ROUGE-1, ROUGE-2 and ROUGE-L recall of the guess against a
    /// set of answers.
    ///
    /// Each component is maximized over the answers independently. Returns
    /// `None` when neither side carries tokens to compare, the local
    /// equivalent of a scoring-resource lookup failure.
    pub fn rouge_scores<S: AsRef<str>>(guess: &str, answers: &[S]) -> Option<[f64; 3]> {
        let guess = normalize_answer(guess);
        let g_tokens = tokenize(&guess);
        if g_tokens.is_empty() || answers.is_empty() {
            return None;
        }

        let mut best: Option<[f64; 3]> = None;
        for answer in answers {
            let answer = normalize_answer(answer.as_ref());
            let a_tokens = tokenize(&answer);
            if a_tokens.is_empty() {
                continue;
            }
            let scores = [
                rouge_n_recall(&g_tokens, &a_tokens, 1),
                rouge_n_recall(&g_tokens, &a_tokens, 2),
                rouge_l_recall(&g_tokens, &a_tokens),
            ];
            best = Some(match best {
                Some(b) => [
                    b[0].max(scores[0]),
                    b[1].max(scores[1]),
                    b[2].max(scores[2]),
                ],
                None => scores,
            });
        }
        best
    }

    /// Clipped n-gram recall: overlap over reference n-gram count.
    fn rouge_n_recall(cand: &[&str], reference: &[&str], n: usize) -> f64 {
        let ref_counts = ngram_counts(reference, n);
        let total: u64 = ref_counts.values().sum();
        if total == 0 {
            return 0.0;
        }
        let cand_counts = ngram_counts(cand, n);
        clipped_overlap(&cand_counts, &ref_counts) as f64 / total as f64
    }

    /// Longest-common-subsequence recall against the reference.
    fn rouge_l_recall(cand: &[&str], reference: &[&str]) -> f64 {
        lcs_length(cand, reference) as f64 / reference.len() as f64
    }

    /// LCS length via 1D dynamic programming.
    fn lcs_length(a: &[&str], b: &[&str]) -> usize {
        let mut dp = vec![0usize; b.len() + 1];
        for i in 1..=a.len() {
            let mut prev = 0;
            for j in 1..=b.len() {
                let tmp = dp[j];
                dp[j] = if a[i - 1] == b[j - 1] {
                    prev + 1
                } else {
                    dp[j].max(dp[j - 1])
                };
                prev = tmp;
            }
        }
        dp[b.len()]
    }
}
