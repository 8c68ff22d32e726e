//! # Data Loader Crate
//!
//! This crate reads every delimited input of the rating predictor.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (RawMovieRecord, RatingRow, PredictionRecord, EvaluationTargets)
//! - **parser**: Streaming CSV records and Python-literal list fields
//! - **metadata**: Parse the movie metadata file into deduplicated records
//! - **ratings**: Ratings stream rows, evaluation targets, ground truth, prediction files
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{load_metadata, load_evaluation_targets};
//! use std::path::Path;
//!
//! let metadata = load_metadata(Path::new("data/movies_metadata.csv"))?;
//! let (targets, _report) = load_evaluation_targets(Path::new("data/evaluation_ratings.csv"))?;
//!
//! println!("{} movies, {} users to evaluate", metadata.records.len(), targets.user_count());
//! ```
//!
//! Row-level problems never abort a load: the row is skipped and counted.

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod metadata;
pub mod ratings;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use metadata::{MetadataLoad, load_metadata, read_metadata};
pub use parser::{CsvRecord, CsvRecords, open_records};
pub use ratings::{
    PREDICTION_HEADER, PredictionWriter, RatingLine, load_evaluation_targets, load_predictions,
    load_rating_targets, parse_rating, parse_rating_record, read_evaluation_targets, read_predictions,
    read_rating_targets,
};
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    // Core types
    EvaluationTargets,
    LoadReport,
    PredictionRecord,
    RatingRow,
    RatingTargets,
    RawMovieRecord,
};
