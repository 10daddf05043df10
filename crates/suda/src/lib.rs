// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! # Suda - Dialog Evaluation Core
//!
//! Shared types and text machinery for evaluating generated dialog responses
//! against reference answers. This crate holds the pieces every evaluator
//! needs: the [`Observation`] record delivered per example, the answer
//! normalization rules applied before every text comparison, and the common
//! error type.
//!
//! The metrics engine itself (accumulators, reports, cross-task aggregation)
//! lives in the companion `suda-eval` crate.

#![warn(missing_docs)]

pub mod error;
pub mod normalize;
pub mod observation;

pub use error::{Error, Result};
pub use observation::Observation;
