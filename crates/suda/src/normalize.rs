// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Answer normalization and n-gram extraction.
//!
//! Every text comparison in the evaluation stack goes through
//! [`normalize_answer`] first: lowercase, punctuation collapsed to
//! whitespace, the articles `a`/`an`/`the` stripped as whole words, and
//! repeated whitespace collapsed. Normalization is deterministic and
//! side-effect-free, so two calls on the same input always agree.

use regex::Regex;
use std::sync::OnceLock;

static RE_ART: OnceLock<Regex> = OnceLock::new();
static RE_PUNC: OnceLock<Regex> = OnceLock::new();

fn re_art() -> &'static Regex {
    RE_ART.get_or_init(|| Regex::new(r"\b(a|an|the)\b").expect("article pattern is valid"))
}

fn re_punc() -> &'static Regex {
    RE_PUNC.get_or_init(|| {
        Regex::new(r##"[!"#$%&()*+,\-./:;<=>?@\[\]\\^`{|}~_']"##)
            .expect("punctuation pattern is valid")
    })
}

/// Lower text and remove punctuation, articles and extra whitespace.
pub fn normalize_answer(s: &str) -> String {
    let lower = s.to_lowercase();
    // punctuation becomes whitespace, so "it's" compares as "it s"
    let no_punc = re_punc().replace_all(&lower, " ");
    let no_art = re_art().replace_all(&no_punc, " ");
    no_art.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split already-normalized text into tokens.
pub fn tokenize(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}

/// Iterate the contiguous n-gram windows of a token sequence.
///
/// Yields nothing when the sequence is shorter than `n`. `n` must be >= 1.
pub fn ngrams<'a, 'b>(tokens: &'b [&'a str], n: usize) -> impl Iterator<Item = &'b [&'a str]> {
    debug_assert!(n >= 1);
    tokens.windows(n)
}

/// Render an n-gram window as a single hashable key.
///
/// Normalized tokens never contain whitespace, so the join is unambiguous.
pub fn ngram_key(window: &[&str]) -> String {
    window.join(" ")
}
