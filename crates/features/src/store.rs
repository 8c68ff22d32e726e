//! Persisted feature artifacts and the in-memory store built from them.
//!
//! A build writes four files next to each other:
//! - `movie_features.dat`: the matrix, little-endian `f32`, row-major, no header
//! - `movie_index.dat`: one little-endian `i64` movie id per matrix row
//! - `movie_columns.csv`: the catalog, one column name per line
//! - `manifest.json`: format version, shape, preset and fitted encoders
//!
//! The matrix shape is never stored in the matrix file itself: it is
//! reconstructed from the index length and the catalog line count, and the
//! matrix byte length must agree with both.

use crate::builder::{BuiltFeatures, GroupEncoder};
use crate::catalog::FeatureCatalog;
use crate::error::{FeatureError, Result};
use crate::group::{FeatureGroup, FeaturePreset};
use crate::matrix::FeatureMatrix;
use data_loader::MovieId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const MATRIX_FILE: &str = "movie_features.dat";
pub const INDEX_FILE: &str = "movie_index.dat";
pub const CATALOG_FILE: &str = "movie_columns.csv";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Version written to and expected in the manifest
pub const FORMAT_VERSION: u32 = 1;

const MATRIX_VALUE_BYTES: usize = std::mem::size_of::<f32>();
const INDEX_VALUE_BYTES: usize = std::mem::size_of::<i64>();

/// Locations of the four artifact files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub matrix: PathBuf,
    pub index: PathBuf,
    pub catalog: PathBuf,
    pub manifest: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            matrix: dir.join(MATRIX_FILE),
            index: dir.join(INDEX_FILE),
            catalog: dir.join(CATALOG_FILE),
            manifest: dir.join(MANIFEST_FILE),
        }
    }
}

/// Summary of a build stored next to the binary artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub format_version: u32,
    pub preset: FeaturePreset,
    pub rows: usize,
    pub columns: usize,
    pub encoders: Vec<GroupEncoder>,
}

impl ArtifactManifest {
    pub fn describe(built: &BuiltFeatures) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            preset: built.schema.preset(),
            rows: built.matrix.n_rows(),
            columns: built.matrix.n_cols(),
            encoders: built.schema.encoders().to_vec(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

/// Write a build to disk.
///
/// Movie ids must be integers since the index file stores them as `i64`.
pub fn persist(built: &BuiltFeatures, paths: &ArtifactPaths) -> Result<()> {
    let matrix = &built.matrix;
    if matrix.n_cols() != built.catalog.len() {
        return Err(FeatureError::SchemaInconsistency(format!(
            "matrix has {} columns but catalog has {}",
            matrix.n_cols(),
            built.catalog.len()
        )));
    }

    let ids = matrix
        .movie_ids()
        .iter()
        .map(|id| {
            id.parse::<i64>().map_err(|_| {
                FeatureError::SchemaInconsistency(format!("movie id '{}' is not an integer", id))
            })
        })
        .collect::<Result<Vec<i64>>>()?;

    let mut writer = BufWriter::new(File::create(&paths.matrix)?);
    for value in matrix.values() {
        writer.write_all(&(*value as f32).to_le_bytes())?;
    }
    writer.flush()?;

    let mut writer = BufWriter::new(File::create(&paths.index)?);
    for id in &ids {
        writer.write_all(&id.to_le_bytes())?;
    }
    writer.flush()?;

    built
        .catalog
        .write(BufWriter::new(File::create(&paths.catalog)?))?;

    let mut writer = BufWriter::new(File::create(&paths.manifest)?);
    serde_json::to_writer_pretty(&mut writer, &ArtifactManifest::describe(built))?;
    writer.flush()?;

    info!(
        "Persisted {} x {} feature matrix to {:?}",
        matrix.n_rows(),
        matrix.n_cols(),
        paths.matrix
    );
    Ok(())
}

/// Read-only feature matrix with its catalog and a hashed movie index.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    matrix: FeatureMatrix,
    catalog: FeatureCatalog,
    index: HashMap<MovieId, usize>,
}

impl FeatureStore {
    /// Wrap a matrix and its catalog, building the movie index.
    pub fn new(matrix: FeatureMatrix, catalog: FeatureCatalog) -> Result<Self> {
        if matrix.n_cols() != catalog.len() {
            return Err(FeatureError::SchemaInconsistency(format!(
                "matrix has {} columns but catalog has {}",
                matrix.n_cols(),
                catalog.len()
            )));
        }
        let mut index = HashMap::with_capacity(matrix.n_rows());
        for (row, movie_id) in matrix.movie_ids().iter().enumerate() {
            if index.insert(movie_id.clone(), row).is_some() {
                return Err(FeatureError::SchemaInconsistency(format!(
                    "movie id {} indexes more than one row",
                    movie_id
                )));
            }
        }
        Ok(Self {
            matrix,
            catalog,
            index,
        })
    }

    pub fn from_built(built: BuiltFeatures) -> Result<Self> {
        Self::new(built.matrix, built.catalog)
    }

    /// Load persisted artifacts.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let catalog = FeatureCatalog::load(&paths.catalog)?;

        let index_bytes = fs::read(&paths.index)?;
        if index_bytes.len() % INDEX_VALUE_BYTES != 0 {
            return Err(FeatureError::SchemaInconsistency(format!(
                "index file has {} bytes, not a multiple of {}",
                index_bytes.len(),
                INDEX_VALUE_BYTES
            )));
        }
        let movie_ids: Vec<MovieId> = index_bytes
            .chunks_exact(INDEX_VALUE_BYTES)
            .map(|chunk| {
                let mut raw = [0u8; INDEX_VALUE_BYTES];
                raw.copy_from_slice(chunk);
                i64::from_le_bytes(raw).to_string()
            })
            .collect();

        let rows = movie_ids.len();
        let cols = catalog.len();
        let matrix_bytes = fs::read(&paths.matrix)?;
        let expected = rows * cols * MATRIX_VALUE_BYTES;
        if matrix_bytes.len() != expected {
            return Err(FeatureError::SchemaInconsistency(format!(
                "matrix file has {} bytes, expected {} for {} rows x {} columns",
                matrix_bytes.len(),
                expected,
                rows,
                cols
            )));
        }

        if paths.manifest.exists() {
            let manifest = ArtifactManifest::load(&paths.manifest)?;
            if manifest.format_version != FORMAT_VERSION {
                return Err(FeatureError::SchemaInconsistency(format!(
                    "artifact format version {} is not supported (expected {})",
                    manifest.format_version, FORMAT_VERSION
                )));
            }
            if manifest.rows != rows || manifest.columns != cols {
                return Err(FeatureError::SchemaInconsistency(format!(
                    "manifest shape {} x {} disagrees with artifacts {} x {}",
                    manifest.rows, manifest.columns, rows, cols
                )));
            }
            debug!("Manifest matches artifacts (preset {})", manifest.preset);
        }

        let data: Vec<f64> = matrix_bytes
            .chunks_exact(MATRIX_VALUE_BYTES)
            .map(|chunk| {
                let mut raw = [0u8; MATRIX_VALUE_BYTES];
                raw.copy_from_slice(chunk);
                f64::from(f32::from_le_bytes(raw))
            })
            .collect();

        let store = Self::new(FeatureMatrix::new(movie_ids, cols, data)?, catalog)?;
        info!(
            "Loaded feature store: {} movies x {} columns",
            store.len(),
            store.width()
        );
        Ok(store)
    }

    /// Store restricted to the columns of `groups`.
    ///
    /// Every requested group must be present in the catalog.
    pub fn select_groups(&self, groups: &[FeatureGroup]) -> Result<Self> {
        if let Some(missing) = groups.iter().find(|g| self.catalog.width_of(**g) == 0) {
            return Err(FeatureError::SchemaInconsistency(format!(
                "group {} is not part of the stored features",
                missing
            )));
        }
        let columns = self.catalog.indices_of(groups);
        Ok(Self {
            matrix: self.matrix.select_columns(&columns),
            catalog: self.catalog.select(&columns),
            index: self.index.clone(),
        })
    }

    pub fn select_preset(&self, preset: FeaturePreset) -> Result<Self> {
        debug!("Selecting {} columns", preset);
        self.select_groups(&preset.groups())
    }

    /// Scale every row to unit length; returns the number of zero rows.
    pub fn normalize_rows(&mut self) -> usize {
        let zero_rows = self.matrix.normalize_rows();
        if zero_rows > 0 {
            warn!(
                "{} movies have no active feature and keep a zero vector",
                zero_rows
            );
        }
        zero_rows
    }

    /// Feature row of a movie, `None` for a movie without metadata
    pub fn row(&self, movie_id: &str) -> Option<&[f64]> {
        self.index.get(movie_id).map(|&idx| self.matrix.row(idx))
    }

    pub fn contains(&self, movie_id: &str) -> bool {
        self.index.contains_key(movie_id)
    }

    pub fn row_at(&self, idx: usize) -> &[f64] {
        self.matrix.row(idx)
    }

    pub fn movie_id_at(&self, idx: usize) -> &str {
        self.matrix.movie_id(idx)
    }

    /// Number of movies
    pub fn len(&self) -> usize {
        self.matrix.n_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.matrix.n_cols()
    }

    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    pub fn matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FeatureStore {
        let catalog = FeatureCatalog::parse(
            "releaseDate_MinTo1990\nreleaseDate_1990ToMax\ngenre_35\ngenre_unknown\n",
        )
        .unwrap();
        let matrix = FeatureMatrix::from_rows(
            vec!["10".to_string(), "20".to_string()],
            4,
            vec![vec![1.0, 0.0, 1.0, 0.0], vec![0.0, 0.0, 0.0, 0.0]],
        )
        .unwrap();
        FeatureStore::new(matrix, catalog).unwrap()
    }

    #[test]
    fn test_lookup() {
        let store = store();
        assert_eq!(store.row("10"), Some(&[1.0, 0.0, 1.0, 0.0][..]));
        assert!(store.row("99").is_none());
        assert!(store.contains("20"));
        assert_eq!(store.movie_id_at(1), "20");
    }

    #[test]
    fn test_select_groups() {
        let store = store();
        let genre = store.select_groups(&[FeatureGroup::Genre]).unwrap();
        assert_eq!(genre.width(), 2);
        assert_eq!(genre.row("10"), Some(&[1.0, 0.0][..]));

        assert!(matches!(
            store.select_groups(&[FeatureGroup::Runtime]),
            Err(FeatureError::SchemaInconsistency(_))
        ));
    }

    #[test]
    fn test_normalize_keeps_zero_rows() {
        let mut store = store();
        assert_eq!(store.normalize_rows(), 1);
        assert_eq!(store.row("20"), Some(&[0.0, 0.0, 0.0, 0.0][..]));
        let norm: f64 = store.row("10").unwrap().iter().map(|v| v * v).sum();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_catalog_width_mismatch() {
        let catalog = FeatureCatalog::parse("genre_35\n").unwrap();
        let matrix = FeatureMatrix::new(vec!["1".to_string()], 2, vec![0.0, 1.0]).unwrap();
        assert!(FeatureStore::new(matrix, catalog).is_err());
    }

    #[test]
    fn test_load_rejects_truncated_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        fs::write(&paths.catalog, "genre_35\ngenre_unknown\n").unwrap();
        fs::write(&paths.index, 7i64.to_le_bytes()).unwrap();
        fs::write(&paths.matrix, 1.0f32.to_le_bytes()).unwrap();

        assert!(matches!(
            FeatureStore::load(&paths),
            Err(FeatureError::SchemaInconsistency(_))
        ));
    }
}
