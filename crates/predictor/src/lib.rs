//! Content-based rating prediction over a ratings stream.
//!
//! This crate provides:
//! - ProfileTrainer / UserSession: per-user gradient-descent profiles
//! - Scorer: dot-product, cosine and Bray-Curtis scoring with half-star quantization
//! - StreamOrchestrator: single pass over a user-sorted ratings stream
//! - RMSE evaluation of prediction files
//! - Pairwise movie distances
//! - Sweeps over every preset and scoring mode
//!
//! ## Example Usage
//! ```ignore
//! use predictor::{PredictorConfig, StreamOrchestrator};
//!
//! let config = PredictorConfig::default();
//! config.validate()?;
//!
//! let mut store = FeatureStore::load(&paths)?.select_preset(config.preset)?;
//! store.normalize_rows();
//!
//! let orchestrator = StreamOrchestrator::new(&store, &targets, &config);
//! let summary = orchestrator.run_files(Path::new("ratings.csv"), Path::new("predicted.csv"))?;
//! ```

pub mod error;
pub mod config;
pub mod trainer;
pub mod scoring;
pub mod orchestrator;
pub mod evaluation;
pub mod distances;
pub mod sweep;

// Re-export main types
pub use error::PredictError;
pub use config::PredictorConfig;
pub use trainer::{ProfileTrainer, UpdateRule, UserProfile, UserSession};
pub use scoring::{ScoringMode, Scorer, quantize, raw_score};
pub use orchestrator::{RunSummary, StreamOrchestrator};
pub use evaluation::{RmseReport, evaluate_files, rmse};
pub use distances::{write_distance_file, write_pairwise_distances};
pub use sweep::{SweepEntry, SweepInputs, run_sweep};
