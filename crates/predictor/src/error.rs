//! Error types for the predictor crate.
//!
//! These cover configuration problems only. Row-level problems in the
//! ratings stream are counted and skipped, and I/O failures surface as
//! `anyhow` errors from the orchestrator.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("Unknown scoring mode '{0}' (expected DOTPRODUCT, COSINE or BRAYCURTIS)")]
    UnknownScoringMode(String),

    #[error("Unknown update rule '{0}' (expected ELEMENTWISE or DOTPRODUCT)")]
    UnknownUpdateRule(String),

    /// A numeric parameter is out of its valid range
    #[error("Invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, PredictError>;
