//! Feature engineering for content-based rating prediction.
//!
//! This crate provides:
//! - Encoding policy: percentile bins, fixed bins, multi-hot categories
//! - FeatureMatrixBuilder: metadata records to a one row per movie matrix
//! - FeatureCatalog: column names parsed into feature groups
//! - FeatureStore: persisted artifacts, column selection, row normalization
//! - Distance functions used by the scoring modes
//!
//! ## Architecture
//! 1. `FeatureSchema::fit` computes every boundary and category list once
//! 2. The builder encodes each record group by group and concatenates
//! 3. `persist` writes the matrix, index, catalog and manifest
//! 4. `FeatureStore::load` reads them back; a run then selects its preset
//!    columns and normalizes the rows
//!
//! ## Example Usage
//! ```ignore
//! use features::{ArtifactPaths, FeatureMatrixBuilder, FeaturePreset, FeatureStore, persist};
//!
//! let built = FeatureMatrixBuilder::new(FeaturePreset::All).build(&metadata.records)?;
//! let paths = ArtifactPaths::in_dir(Path::new("artifacts"));
//! persist(&built, &paths)?;
//!
//! let mut store = FeatureStore::load(&paths)?.select_preset(FeaturePreset::Basic)?;
//! store.normalize_rows();
//! ```

pub mod error;
pub mod group;
pub mod encoding;
pub mod catalog;
pub mod matrix;
pub mod builder;
pub mod store;
pub mod distance;

// Re-export main types
pub use error::{FeatureError, Result};
pub use group::{FeatureGroup, FeaturePreset};
pub use catalog::{CatalogColumn, FeatureCatalog};
pub use matrix::FeatureMatrix;
pub use builder::{BuiltFeatures, FeatureMatrixBuilder, FeatureSchema, GroupEncoder};
pub use store::{ArtifactManifest, ArtifactPaths, FeatureStore, persist};
pub use distance::{bray_curtis_distance, cosine_distance, dot, l2_norm};
