//! Core domain types for movie metadata, ratings and predictions.
//!
//! Key Rust concepts demonstrated here:
//! - Type aliases for domain clarity (UserId, MovieId)
//! - Structs with public fields
//! - HashMap for the per-user evaluation targets

use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user in the ratings stream
pub type UserId = u32;

/// Movie identifier as it appears in the metadata and ratings files.
///
/// Kept as text because ratings and targets join on the literal id; the
/// metadata loader still checks it parses as an integer so the row index
/// can be persisted as fixed-width integers.
pub type MovieId = String;

// =============================================================================
// Metadata
// =============================================================================

/// One parsed row of the movie metadata file.
///
/// The `Vec` fields have set semantics: duplicates are removed while the
/// first-seen order is kept, so category lists derived from them are
/// deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMovieRecord {
    pub is_adult: bool,
    pub collection_ids: Vec<i64>,
    pub genre_ids: Vec<i64>,
    pub movie_id: MovieId,
    pub popularity: f64,
    /// Year of release, `0.0` when the date is missing
    pub release_year: f64,
    /// Runtime in minutes, `0.0` when missing
    pub runtime: f64,
    pub language_codes: Vec<String>,
    pub vote_average: f64,
}

impl RawMovieRecord {
    /// A record with every attribute empty or zero.
    pub fn new(movie_id: impl Into<MovieId>) -> Self {
        Self {
            is_adult: false,
            collection_ids: Vec::new(),
            genre_ids: Vec::new(),
            movie_id: movie_id.into(),
            popularity: 0.0,
            release_year: 0.0,
            runtime: 0.0,
            language_codes: Vec::new(),
            vote_average: 0.0,
        }
    }
}

// =============================================================================
// Ratings
// =============================================================================

/// One row of the ratings stream. The timestamp column is not consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRow {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
}

/// A predicted rating for one (user, movie) pair
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
}

/// Movies that need a prediction, grouped by user.
///
/// Movies keep the order in which they appear in the targets file.
#[derive(Debug, Clone, Default)]
pub struct EvaluationTargets {
    by_user: HashMap<UserId, Vec<MovieId>>,
}

impl EvaluationTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user_id: UserId, movie_id: MovieId) {
        self.by_user.entry(user_id).or_default().push(movie_id);
    }

    /// Movies requested for a user, if the user is part of the evaluation
    pub fn movies_for(&self, user_id: UserId) -> Option<&[MovieId]> {
        self.by_user.get(&user_id).map(Vec::as_slice)
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.by_user.contains_key(&user_id)
    }

    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    pub fn target_count(&self) -> usize {
        self.by_user.values().map(Vec::len).sum()
    }
}

/// Ground-truth ratings keyed by (user, movie)
pub type RatingTargets = HashMap<(UserId, MovieId), f64>;

/// Counts reported after reading a delimited file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
}
