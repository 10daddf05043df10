// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! # Suda Eval - Concurrent Dialog Metrics
//!
//! Statistical evaluation of generated dialog responses against reference
//! answers: exact-match accuracy, token-overlap F1, BLEU/ROUGE n-gram
//! overlap, `hits@K` retrieval hit-rates, and distinct-n lexical diversity,
//! accumulated across many examples by possibly-parallel workers.
//!
//! The centerpiece is [`Metrics`]: a shared running-aggregate store behind
//! one mutex per instance. Scorers run outside the lock, each example folds
//! in atomically, and [`Metrics::report`] yields a consistent normalized
//! snapshot at any point. Snapshots from independent tasks are merged with
//! [`aggregate`].
//!
//! # Features
//!
//! - `bleu` (default) - register and report the `bleu-1..4` keys
//! - `rouge` (default) - register and report the `rouge-1/2/l` keys
//!
//! # Quick Start
//!
//! ```
//! use suda::Observation;
//! use suda_eval::{Metrics, MetricsConfig};
//!
//! let metrics = Metrics::new(&MetricsConfig::default())?;
//! let result = metrics.update(
//!     &Observation::new().with_text("the answer is Paris"),
//!     &["answer is paris"],
//! );
//! assert!(result.correct);
//!
//! let report = metrics.report();
//! assert_eq!(report.exs, 1);
//! assert_eq!(report.get("accuracy"), Some(1.0));
//! # Ok::<(), suda::Error>(())
//! ```

#![warn(missing_docs)]

pub mod aggregate;
pub mod metrics;
pub mod parallel;
pub mod report;
pub mod scorer;

pub use aggregate::{aggregate, CombinedReport, Reporter};
pub use metrics::{ExampleResult, Metrics, MetricsConfig, StorageMode, HITS_AT_K};
pub use parallel::ParallelUpdater;
pub use report::{round_sigfigs, Report};
