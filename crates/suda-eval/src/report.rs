// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Point-in-time metric snapshots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Round a value to the given number of significant figures.
pub fn round_sigfigs(x: f64, sigfigs: i32) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let magnitude = x.abs().log10().floor() as i32;
    let factor = 10f64.powi(sigfigs - magnitude - 1);
    (x * factor).round() / factor
}

/// A normalized snapshot of accumulated metrics.
///
/// Produced fresh by every `report()` call and never shared between
/// workers. Metrics with zero observations are omitted entirely, so
/// absence is distinguishable from a true zero score. Keys are ordered
/// for stable serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Total examples seen.
    pub exs: u64,

    /// Normalized metric values keyed by metric name.
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl Report {
    /// Create an empty report for `exs` examples
    pub fn new(exs: u64) -> Self {
        Self {
            exs,
            values: BTreeMap::new(),
        }
    }

    /// Get a metric value by key
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Whether a metric key is present
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of metric values in the snapshot (excluding `exs`)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the snapshot holds no metric values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Insert a metric value
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    /// Iterate metric key/value pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_sigfigs() {
        assert!((round_sigfigs(0.123_456, 4) - 0.1235).abs() < 1e-12);
        assert!((round_sigfigs(123_456.0, 4) - 123_500.0).abs() < 1e-6);
        assert!((round_sigfigs(0.000_123_44, 3) - 0.000_123).abs() < 1e-12);
        assert!((round_sigfigs(-0.666_66, 4) - -0.6667).abs() < 1e-12);
        assert_eq!(round_sigfigs(1.0, 4), 1.0);
        assert_eq!(round_sigfigs(0.0, 4), 0.0);
    }

    #[test]
    fn test_round_sigfigs_non_finite() {
        assert!(round_sigfigs(f64::NAN, 4).is_nan());
        assert_eq!(round_sigfigs(f64::INFINITY, 4), f64::INFINITY);
    }

    #[test]
    fn test_report_accessors() {
        let mut report = Report::new(10);
        report.insert("accuracy", 0.9);

        assert_eq!(report.exs, 10);
        assert_eq!(report.get("accuracy"), Some(0.9));
        assert_eq!(report.get("f1"), None);
        assert!(report.contains("accuracy"));
        assert_eq!(report.len(), 1);
        assert!(!report.is_empty());
    }

    #[test]
    fn test_report_serializes_flat() {
        let mut report = Report::new(3);
        report.insert("accuracy", 0.5);
        report.insert("f1", 0.25);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["exs"], 3);
        assert_eq!(json["accuracy"], 0.5);
        assert_eq!(json["f1"], 0.25);

        let back: Report = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
