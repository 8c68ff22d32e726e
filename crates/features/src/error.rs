//! Error types for the features crate.

use thiserror::Error;

/// Errors raised while building, persisting or loading feature artifacts
#[derive(Error, Debug)]
pub enum FeatureError {
    /// I/O error while reading or writing an artifact
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The JSON manifest could not be read or written
    #[error("Manifest error: {0}")]
    ManifestError(#[from] serde_json::Error),

    /// Metadata loading failed before any features were computed
    #[error("Data load error: {0}")]
    DataLoad(#[from] data_loader::DataLoadError),

    /// Every metadata record was rejected
    #[error("No valid movie records to build features from")]
    EmptyCorpus,

    /// An internal invariant between matrix, index and catalog was broken.
    ///
    /// Fatal: the artifacts must not be written or used.
    #[error("Schema inconsistency: {0}")]
    SchemaInconsistency(String),

    /// Preset name not one of BASIC, INTERMEDIATE, ADVANCED, ALL
    #[error("Unknown feature preset '{0}' (expected BASIC, INTERMEDIATE, ADVANCED or ALL)")]
    UnknownPreset(String),

    /// Group name not one of the eight feature groups
    #[error("Unknown feature group '{0}'")]
    UnknownGroup(String),

    /// Percentiles of an empty sample are undefined
    #[error("Cannot compute a percentile of an empty sample")]
    EmptySample,

    /// A continuous feature needs at least one bin
    #[error("Invalid bin count: {0}")]
    InvalidBinCount(usize),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, FeatureError>;
