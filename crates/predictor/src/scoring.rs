//! Scoring a movie against a user profile.
//!
//! Every mode produces a raw value that is then quantized to the nearest
//! half star and clamped from above. There is no lower clamp: a negative
//! prediction is valid output.

use crate::error::PredictError;
use crate::trainer::UserProfile;
use data_loader::{MovieId, PredictionRecord};
use features::{FeatureStore, bray_curtis_distance, cosine_distance, dot};
use std::fmt;
use std::str::FromStr;

/// Highest rating on the MovieLens scale
pub const DEFAULT_MAX_RATE: f64 = 5.0;

/// How a (movie vector, profile) pair becomes a raw rating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ScoringMode {
    /// `movie · profile`
    #[default]
    DotProduct,
    /// `cosine_distance(movie, profile) * max_rate`
    Cosine,
    /// `bray_curtis_distance(movie, profile) * max_rate`
    BrayCurtis,
}

impl ScoringMode {
    pub const VARIANTS: [ScoringMode; 3] = [
        ScoringMode::DotProduct,
        ScoringMode::Cosine,
        ScoringMode::BrayCurtis,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScoringMode::DotProduct => "DOTPRODUCT",
            ScoringMode::Cosine => "COSINE",
            ScoringMode::BrayCurtis => "BRAYCURTIS",
        }
    }
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScoringMode {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoringMode::VARIANTS
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PredictError::UnknownScoringMode(s.to_string()))
    }
}

/// Raw, unquantized score.
pub fn raw_score(mode: ScoringMode, movie: &[f64], profile: &[f64], max_rate: f64) -> f64 {
    match mode {
        ScoringMode::DotProduct => dot(movie, profile),
        ScoringMode::Cosine => cosine_distance(movie, profile) * max_rate,
        ScoringMode::BrayCurtis => bray_curtis_distance(movie, profile) * max_rate,
    }
}

/// Round to the nearest 0.5 (ties to even) and cap at `max_rate`.
///
/// `4.3 -> 4.5`, `5.6 -> 5.0`, `-0.3 -> -0.5`.
pub fn quantize(raw: f64, max_rate: f64) -> f64 {
    let rounded = (raw * 2.0).round_ties_even() / 2.0;
    if rounded > max_rate {
        max_rate
    } else {
        rounded
    }
}

/// Scores target movies for trained profiles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scorer {
    mode: ScoringMode,
    max_rate: f64,
}

impl Scorer {
    pub fn new(mode: ScoringMode, max_rate: f64) -> Self {
        Self { mode, max_rate }
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    /// Quantized prediction for one movie vector
    pub fn score(&self, movie: &[f64], profile: &[f64]) -> f64 {
        quantize(raw_score(self.mode, movie, profile, self.max_rate), self.max_rate)
    }

    /// Predict every target movie the store knows, in target order.
    ///
    /// Targets without metadata are skipped.
    pub fn predict(
        &self,
        profile: &UserProfile,
        targets: &[MovieId],
        store: &FeatureStore,
    ) -> Vec<PredictionRecord> {
        targets
            .iter()
            .filter_map(|movie_id| {
                let row = store.row(movie_id)?;
                Some(PredictionRecord {
                    user_id: profile.user_id,
                    movie_id: movie_id.clone(),
                    rating: self.score(row, &profile.weights),
                })
            })
            .collect()
    }
}
