//! RMSE of a prediction file against ground-truth ratings.

use anyhow::{Context, Result};
use data_loader::{PredictionRecord, RatingTargets, load_predictions, load_rating_targets};
use std::path::Path;
use tracing::info;

/// Outcome of comparing predictions with the truth
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RmseReport {
    /// Root mean squared error over the matched pairs, `0.0` when none matched
    pub rmse: f64,
    /// Predictions that had a ground-truth rating
    pub matched: usize,
    /// Predictions without a ground-truth rating
    pub unmatched: usize,
    /// Malformed rows skipped across both input files
    pub rows_skipped: usize,
}

/// Root mean squared error over the `(user, movie)` pairs present in both.
///
/// An empty intersection yields an RMSE of 0 rather than NaN, so a run that
/// predicted nothing reads as 0 and must be judged by `matched`.
pub fn rmse(predictions: &[PredictionRecord], truth: &RatingTargets) -> RmseReport {
    let mut report = RmseReport::default();
    let mut squared_sum = 0.0;

    for prediction in predictions {
        match truth.get(&(prediction.user_id, prediction.movie_id.clone())) {
            Some(actual) => {
                squared_sum += (prediction.rating - actual).powi(2);
                report.matched += 1;
            }
            None => report.unmatched += 1,
        }
    }

    if report.matched > 0 {
        report.rmse = (squared_sum / report.matched as f64).sqrt();
    }
    report
}

/// Read a prediction file and a ground-truth file and compute the RMSE.
pub fn evaluate_files(predictions: &Path, truth: &Path) -> Result<RmseReport> {
    let (predicted, predicted_load) = load_predictions(predictions)
        .with_context(|| format!("Failed to read predictions from {}", predictions.display()))?;
    let (actual, truth_load) = load_rating_targets(truth)
        .with_context(|| format!("Failed to read ground truth from {}", truth.display()))?;

    let mut report = rmse(&predicted, &actual);
    report.rows_skipped = predicted_load.rows_skipped + truth_load.rows_skipped;
    info!(
        "RMSE {:.4} over {} predictions ({} without ground truth, {} rows skipped)",
        report.rmse, report.matched, report.unmatched, report.rows_skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(user_id: u32, movie_id: &str, rating: f64) -> PredictionRecord {
        PredictionRecord {
            user_id,
            movie_id: movie_id.to_string(),
            rating,
        }
    }

    #[test]
    fn test_single_pair() {
        let mut truth = RatingTargets::new();
        truth.insert((1, "10".to_string()), 5.0);

        let report = rmse(&[prediction(1, "10", 4.5)], &truth);
        assert_eq!(report.rmse, 0.5);
        assert_eq!(report.matched, 1);
    }

    #[test]
    fn test_empty_intersection_is_zero() {
        let mut truth = RatingTargets::new();
        truth.insert((2, "10".to_string()), 5.0);

        let report = rmse(&[prediction(1, "10", 4.5)], &truth);
        assert_eq!(report.rmse, 0.0);
        assert_eq!(report.matched, 0);
        assert_eq!(report.unmatched, 1);

        assert_eq!(rmse(&[], &truth).rmse, 0.0);
    }

    #[test]
    fn test_mean_over_matches() {
        let mut truth = RatingTargets::new();
        truth.insert((1, "10".to_string()), 4.0);
        truth.insert((1, "20".to_string()), 2.0);

        let predictions = [prediction(1, "10", 3.0), prediction(1, "20", 5.0)];
        // sqrt((1 + 9) / 2)
        let report = rmse(&predictions, &truth);
        assert!((report.rmse - 5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_files() {
        let dir = tempfile::tempdir().unwrap();
        let predictions = dir.path().join("predicted.csv");
        let truth = dir.path().join("truth.csv");
        std::fs::write(&predictions, "user_id,movie_id,ratings\n1,10,4.5\n1,20,\n").unwrap();
        std::fs::write(&truth, "userId,movieId,rating\n1,10,5.0\n1,20,1.0\n").unwrap();

        let report = evaluate_files(&predictions, &truth).unwrap();
        assert_eq!(report.rmse, 0.5);
        assert_eq!(report.matched, 1);
    }

    #[test]
    fn test_bad_truth_row_does_not_stop_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let predictions = dir.path().join("predicted.csv");
        let truth = dir.path().join("truth.csv");
        std::fs::write(&predictions, "user_id,movie_id,ratings\n1,10,4.5\n2,20,3.0\n").unwrap();
        std::fs::write(&truth, "userId,movieId,rating\n1,10,5.0\n2,20,NA\n").unwrap();

        let report = evaluate_files(&predictions, &truth).unwrap();
        assert_eq!(report.rmse, 0.5);
        assert_eq!(report.matched, 1);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.rows_skipped, 1);
    }
}
