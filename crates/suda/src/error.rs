// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Error types for Suda

use thiserror::Error;

/// Result type alias for Suda operations
pub type Result<T> = core::result::Result<T, Error>;

/// Main error type for the Suda library.
///
/// Per-example data issues (missing predictions, empty reference lists,
/// scorer skips) are absorbed by the evaluation engine and never surface
/// here. Only configuration and programming errors are fatal.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid evaluation configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the error category for logging/metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Other(_) => "other",
        }
    }
}
