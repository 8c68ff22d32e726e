//! Feature matrix builder.
//!
//! Turns deduplicated metadata records into a `FeatureMatrix` and its
//! `FeatureCatalog`. The per-group encoders (boundaries, retained
//! categories, outlier repairs) are fitted once on the corpus into a
//! `FeatureSchema`, an immutable value that is then used to encode rows.
//!
//! ## Algorithm
//! 1. Fit one `GroupEncoder` per group of the preset, in column order
//! 2. Encode every record group by group into per-group blocks
//! 3. Check every block has one row per record
//! 4. Concatenate blocks row by row

use crate::catalog::FeatureCatalog;
use crate::encoding::{
    self, COLLECTION_RETAIN_PERCENTILE, OutlierPolicy, POPULARITY_BINS,
    POPULARITY_CLIP_PERCENTILE, RELEASE_YEAR_BINS, RUNTIME_BOUNDARIES, VOTE_AVERAGE_BOUNDARIES,
};
use crate::error::{FeatureError, Result};
use crate::group::{FeatureGroup, FeaturePreset};
use crate::matrix::FeatureMatrix;
use data_loader::{MovieId, RawMovieRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Category token of the single adult column
pub const ADULT_CATEGORY: &str = "isAdult";

/// Fitted encoder of one feature group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupEncoder {
    Continuous {
        group: FeatureGroup,
        boundaries: Vec<f64>,
        outliers: OutlierPolicy,
    },
    Categorical {
        group: FeatureGroup,
        categories: Vec<String>,
        nullable: bool,
    },
}

impl GroupEncoder {
    /// Fit the encoder of `group` on the whole corpus.
    pub fn fit(group: FeatureGroup, records: &[RawMovieRecord]) -> Result<Self> {
        let encoder = match group {
            FeatureGroup::Popularity => {
                let values = continuous_values(group, records);
                let outliers =
                    OutlierPolicy::fit_clip_to_mean(&values, POPULARITY_CLIP_PERCENTILE)?;
                let repaired: Vec<f64> = values.iter().map(|v| outliers.apply(*v)).collect();
                GroupEncoder::Continuous {
                    group,
                    boundaries: encoding::continuous_boundaries(&repaired, POPULARITY_BINS)?,
                    outliers,
                }
            }
            FeatureGroup::ReleaseDate => {
                let values = continuous_values(group, records);
                let outliers = OutlierPolicy::fit_fill_zero(&values);
                let repaired: Vec<f64> = values.iter().map(|v| outliers.apply(*v)).collect();
                GroupEncoder::Continuous {
                    group,
                    boundaries: encoding::continuous_boundaries(&repaired, RELEASE_YEAR_BINS)?,
                    outliers,
                }
            }
            FeatureGroup::VoteAverage => GroupEncoder::Continuous {
                group,
                boundaries: VOTE_AVERAGE_BOUNDARIES.to_vec(),
                outliers: OutlierPolicy::Keep,
            },
            FeatureGroup::Runtime => GroupEncoder::Continuous {
                group,
                boundaries: RUNTIME_BOUNDARIES.to_vec(),
                outliers: OutlierPolicy::Keep,
            },
            FeatureGroup::Adult => GroupEncoder::Categorical {
                group,
                categories: vec![ADULT_CATEGORY.to_string()],
                nullable: false,
            },
            FeatureGroup::Collection => GroupEncoder::Categorical {
                group,
                categories: encoding::retain_frequent_categories(
                    &category_sets(group, records),
                    COLLECTION_RETAIN_PERCENTILE,
                )?,
                nullable: true,
            },
            FeatureGroup::Genre | FeatureGroup::Language => GroupEncoder::Categorical {
                group,
                categories: encoding::observed_categories(&category_sets(group, records)),
                nullable: true,
            },
        };
        debug!("Fitted {} encoder with width {}", group, encoder.width());
        Ok(encoder)
    }

    pub fn group(&self) -> FeatureGroup {
        match self {
            GroupEncoder::Continuous { group, .. } | GroupEncoder::Categorical { group, .. } => {
                *group
            }
        }
    }

    /// Number of columns this group expands into
    pub fn width(&self) -> usize {
        match self {
            GroupEncoder::Continuous { boundaries, .. } => boundaries.len() + 1,
            GroupEncoder::Categorical {
                categories,
                nullable,
                ..
            } => categories.len() + usize::from(*nullable),
        }
    }

    /// Column names, e.g. `runtime_MinTo60`, `runtime_60To180`, `runtime_180ToMax`
    /// or `genre_35`, `genre_unknown`.
    pub fn column_names(&self) -> Vec<String> {
        let prefix = self.group().name();
        match self {
            GroupEncoder::Continuous { boundaries, .. } => {
                let mut names = Vec::with_capacity(boundaries.len() + 1);
                let mut lower = "Min".to_string();
                for bound in boundaries {
                    names.push(format!("{}_{}To{}", prefix, lower, bound));
                    lower = bound.to_string();
                }
                names.push(format!("{}_{}ToMax", prefix, lower));
                names
            }
            GroupEncoder::Categorical {
                categories,
                nullable,
                ..
            } => {
                let mut names: Vec<String> = categories
                    .iter()
                    .map(|category| format!("{}_{}", prefix, category))
                    .collect();
                if *nullable {
                    names.push(format!("{}_unknown", prefix));
                }
                names
            }
        }
    }

    /// Encode one record into this group's sub-vector.
    pub fn encode(&self, record: &RawMovieRecord) -> Vec<f64> {
        match self {
            GroupEncoder::Continuous {
                group,
                boundaries,
                outliers,
            } => {
                let value = outliers.apply(continuous_value(*group, record));
                encoding::encode_continuous(value, boundaries)
            }
            GroupEncoder::Categorical {
                group,
                categories,
                nullable,
            } => encoding::encode_categorical(&category_tokens(*group, record), categories, *nullable),
        }
    }
}

/// Every fitted encoder of a build, in column order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    preset: FeaturePreset,
    encoders: Vec<GroupEncoder>,
}

impl FeatureSchema {
    /// Fit the encoders of every group of `preset` on the corpus.
    pub fn fit(records: &[RawMovieRecord], preset: FeaturePreset) -> Result<Self> {
        if records.is_empty() {
            return Err(FeatureError::EmptyCorpus);
        }
        let encoders = preset
            .groups()
            .into_iter()
            .map(|group| GroupEncoder::fit(group, records))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { preset, encoders })
    }

    pub fn preset(&self) -> FeaturePreset {
        self.preset
    }

    pub fn encoders(&self) -> &[GroupEncoder] {
        &self.encoders
    }

    /// Total number of columns
    pub fn width(&self) -> usize {
        self.encoders.iter().map(GroupEncoder::width).sum()
    }

    pub fn catalog(&self) -> Result<FeatureCatalog> {
        FeatureCatalog::new(
            self.encoders
                .iter()
                .flat_map(GroupEncoder::column_names)
                .collect(),
        )
    }

    /// Encode a single record into a full row.
    pub fn encode(&self, record: &RawMovieRecord) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.width());
        for encoder in &self.encoders {
            row.extend(encoder.encode(record));
        }
        row
    }
}

/// Output of a build
#[derive(Debug, Clone)]
pub struct BuiltFeatures {
    pub matrix: FeatureMatrix,
    pub catalog: FeatureCatalog,
    pub schema: FeatureSchema,
}

/// Builds feature matrices for one preset.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureMatrixBuilder {
    preset: FeaturePreset,
}

impl FeatureMatrixBuilder {
    pub fn new(preset: FeaturePreset) -> Self {
        Self { preset }
    }

    /// Build the matrix and catalog for `records`.
    ///
    /// `records` must already be deduplicated by movie id (the metadata
    /// loader does this); a repeated id is a schema inconsistency.
    pub fn build(&self, records: &[RawMovieRecord]) -> Result<BuiltFeatures> {
        info!(
            "Building {} feature matrix from {} movies",
            self.preset,
            records.len()
        );
        let mut distinct = HashSet::new();
        if let Some(dup) = records.iter().find(|r| !distinct.insert(r.movie_id.as_str())) {
            return Err(FeatureError::SchemaInconsistency(format!(
                "movie id {} appears more than once",
                dup.movie_id
            )));
        }

        let schema = FeatureSchema::fit(records, self.preset)?;
        let catalog = schema.catalog()?;

        // One block per group, one row per record in each block
        let blocks: Vec<Vec<Vec<f64>>> = schema
            .encoders()
            .iter()
            .map(|encoder| records.iter().map(|record| encoder.encode(record)).collect())
            .collect();

        for (encoder, block) in schema.encoders().iter().zip(&blocks) {
            if block.len() != records.len() {
                return Err(FeatureError::SchemaInconsistency(format!(
                    "group {} produced {} rows for {} movies",
                    encoder.group(),
                    block.len(),
                    records.len()
                )));
            }
        }

        let n_cols = catalog.len();
        let mut data = Vec::with_capacity(records.len() * n_cols);
        for row in 0..records.len() {
            for block in &blocks {
                data.extend_from_slice(&block[row]);
            }
        }

        let movie_ids: Vec<MovieId> = records.iter().map(|r| r.movie_id.clone()).collect();
        let matrix = FeatureMatrix::new(movie_ids, n_cols, data)?;
        info!(
            "Built feature matrix: {} rows x {} columns",
            matrix.n_rows(),
            matrix.n_cols()
        );
        Ok(BuiltFeatures {
            matrix,
            catalog,
            schema,
        })
    }
}

fn continuous_value(group: FeatureGroup, record: &RawMovieRecord) -> f64 {
    match group {
        FeatureGroup::Popularity => record.popularity,
        FeatureGroup::ReleaseDate => record.release_year,
        FeatureGroup::VoteAverage => record.vote_average,
        FeatureGroup::Runtime => record.runtime,
        _ => 0.0,
    }
}

fn continuous_values(group: FeatureGroup, records: &[RawMovieRecord]) -> Vec<f64> {
    records.iter().map(|r| continuous_value(group, r)).collect()
}

fn category_tokens(group: FeatureGroup, record: &RawMovieRecord) -> Vec<String> {
    match group {
        FeatureGroup::Adult if record.is_adult => vec![ADULT_CATEGORY.to_string()],
        FeatureGroup::Collection => record.collection_ids.iter().map(i64::to_string).collect(),
        FeatureGroup::Genre => record.genre_ids.iter().map(i64::to_string).collect(),
        FeatureGroup::Language => record.language_codes.clone(),
        _ => Vec::new(),
    }
}

fn category_sets(group: FeatureGroup, records: &[RawMovieRecord]) -> Vec<Vec<String>> {
    records.iter().map(|r| category_tokens(group, r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: &str, genres: &[i64], year: f64, popularity: f64) -> RawMovieRecord {
        RawMovieRecord {
            genre_ids: genres.to_vec(),
            release_year: year,
            popularity,
            vote_average: 6.0,
            runtime: 100.0,
            language_codes: vec!["en".to_string()],
            ..RawMovieRecord::new(id)
        }
    }

    #[test]
    fn test_column_names() {
        let runtime = GroupEncoder::Continuous {
            group: FeatureGroup::Runtime,
            boundaries: vec![60.0, 180.0],
            outliers: OutlierPolicy::Keep,
        };
        assert_eq!(
            runtime.column_names(),
            vec!["runtime_MinTo60", "runtime_60To180", "runtime_180ToMax"]
        );

        let genre = GroupEncoder::Categorical {
            group: FeatureGroup::Genre,
            categories: vec!["Comedy".to_string()],
            nullable: true,
        };
        assert_eq!(genre.column_names(), vec!["genre_Comedy", "genre_unknown"]);

        let adult = GroupEncoder::Categorical {
            group: FeatureGroup::Adult,
            categories: vec![ADULT_CATEGORY.to_string()],
            nullable: false,
        };
        assert_eq!(adult.column_names(), vec!["adult_isAdult"]);
        assert_eq!(adult.width(), 1);
    }

    #[test]
    fn test_build_basic() {
        let records = vec![
            movie("1", &[35], 1990.0, 1.0),
            movie("2", &[18, 35], 2000.0, 2.0),
            movie("3", &[], 0.0, 3.0),
        ];
        let built = FeatureMatrixBuilder::new(FeaturePreset::Basic)
            .build(&records)
            .unwrap();

        // releaseDate: 10 bins, genre: 35, 18, unknown
        assert_eq!(built.matrix.n_rows(), 3);
        assert_eq!(built.matrix.n_cols(), 13);
        assert_eq!(built.catalog.len(), 13);
        assert_eq!(
            built.catalog.groups(),
            vec![FeatureGroup::ReleaseDate, FeatureGroup::Genre]
        );
        assert_eq!(&built.matrix.row(0)[10..], &[1.0, 0.0, 0.0]);
        assert_eq!(&built.matrix.row(1)[10..], &[1.0, 1.0, 0.0]);
        assert_eq!(&built.matrix.row(2)[10..], &[0.0, 0.0, 1.0]);

        // Missing year 0 is filled with 1995 before binning, never the lowest bin
        let row = built.matrix.row(2);
        assert_eq!(row[..10].iter().sum::<f64>(), 1.0);
        assert_eq!(row[0], 0.0);
    }

    #[test]
    fn test_each_row_one_hot_per_continuous_group() {
        let records: Vec<RawMovieRecord> = (0..20)
            .map(|i| movie(&i.to_string(), &[i % 3], 1950.0 + i as f64, i as f64))
            .collect();
        let built = FeatureMatrixBuilder::new(FeaturePreset::Advanced)
            .build(&records)
            .unwrap();

        for encoder in built.schema.encoders() {
            if !encoder.group().is_continuous() {
                continue;
            }
            let cols = built.catalog.indices_of(&[encoder.group()]);
            for row in built.matrix.rows() {
                let hot: f64 = cols.iter().map(|&c| row[c]).sum();
                assert_eq!(hot, 1.0, "group {}", encoder.group());
            }
        }
    }

    #[test]
    fn test_schema_encodes_new_record_like_build() {
        let records = vec![movie("1", &[35], 1990.0, 1.0), movie("2", &[18], 2000.0, 2.0)];
        let built = FeatureMatrixBuilder::new(FeaturePreset::All)
            .build(&records)
            .unwrap();
        assert_eq!(built.schema.encode(&records[1]), built.matrix.row(1));
        assert_eq!(built.schema.width(), built.catalog.len());
    }

    #[test]
    fn test_empty_corpus_is_fatal() {
        assert!(matches!(
            FeatureMatrixBuilder::new(FeaturePreset::All).build(&[]),
            Err(FeatureError::EmptyCorpus)
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let records = vec![movie("1", &[35], 1990.0, 1.0), movie("1", &[18], 2000.0, 2.0)];
        assert!(matches!(
            FeatureMatrixBuilder::new(FeaturePreset::Basic).build(&records),
            Err(FeatureError::SchemaInconsistency(_))
        ));
    }
}
