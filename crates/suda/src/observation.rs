// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! The per-example observation record.
//!
//! One [`Observation`] is delivered for every evaluated example. Every field
//! is explicitly optional: a plain ranking agent produces candidates without
//! generated text, a generative agent produces text without candidates, and
//! either may attach its own pre-computed metric values.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// A single evaluated model response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Observation<'a> {
    /// Generated response text, if the agent produced one.
    #[serde(borrow)]
    pub text: Option<Cow<'a, str>>,

    /// Ranked candidate responses, best first, if the agent ranks.
    #[serde(borrow)]
    pub text_candidates: Option<Vec<Cow<'a, str>>>,

    /// Agent-supplied metric values (e.g. `loss`, `ppl`) to fold in as-is.
    #[serde(borrow)]
    pub metrics: Option<HashMap<Cow<'a, str>, f64>>,
}

impl<'a> Observation<'a> {
    /// Create an empty observation
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the generated response text
    pub fn with_text(mut self, text: impl Into<Cow<'a, str>>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the ranked candidate list (assumed pre-sorted best-first)
    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'a, str>>,
    {
        self.text_candidates = Some(candidates.into_iter().map(Into::into).collect());
        self
    }

    /// Attach one agent-supplied metric value
    pub fn insert_metric(&mut self, key: impl Into<Cow<'a, str>>, value: f64) {
        self.metrics
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
    }

    /// Builder form of [`insert_metric`](Self::insert_metric)
    pub fn with_metric(mut self, key: impl Into<Cow<'a, str>>, value: f64) -> Self {
        self.insert_metric(key, value);
        self
    }

    /// Get the generated text, if any
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Convert to an owned version
    pub fn into_owned(self) -> Observation<'static> {
        Observation {
            text: self.text.map(|t| Cow::Owned(t.into_owned())),
            text_candidates: self.text_candidates.map(|cands| {
                cands
                    .into_iter()
                    .map(|c| Cow::Owned(c.into_owned()))
                    .collect()
            }),
            metrics: self.metrics.map(|m| {
                m.into_iter()
                    .map(|(k, v)| (Cow::Owned(k.into_owned()), v))
                    .collect()
            }),
        }
    }
}
