//! # Stream Orchestrator
//!
//! Reads the ratings stream once and turns it into predictions:
//! 1. Group contiguous rows by user (the stream must be sorted by user id)
//! 2. Collect known-movie samples for users that have evaluation targets
//! 3. When the user changes, train the previous user's profile and score
//!    their target movies
//! 4. Flush the last user once the stream is exhausted
//!
//! Malformed rows and the header are skipped and counted without touching
//! the current user. Ratings of movies without metadata are dropped.

use crate::config::PredictorConfig;
use crate::scoring::Scorer;
use crate::trainer::{ProfileTrainer, UserSession};
use anyhow::{Context, Result};
use data_loader::{
    CsvRecords, EvaluationTargets, PredictionWriter, RatingLine, parse_rating_record,
};
use features::FeatureStore;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Rows between two progress lines
const PROGRESS_INTERVAL: usize = 500_000;

/// Counts reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Data rows parsed and applied
    pub rows_processed: usize,
    /// Header and malformed rows
    pub rows_skipped: usize,
    /// Distinct contiguous user blocks
    pub users_seen: usize,
    /// Users that were trained and scored
    pub users_scored: usize,
    pub predictions_written: usize,
    /// Ratings whose movie has no feature row
    pub unknown_ratings: usize,
}

/// Drives training and scoring over one ratings stream.
///
/// The store and targets are read-only for the whole run.
pub struct StreamOrchestrator<'a> {
    store: &'a FeatureStore,
    targets: &'a EvaluationTargets,
    trainer: ProfileTrainer,
    scorer: Scorer,
    max_rate: f64,
}

impl<'a> StreamOrchestrator<'a> {
    pub fn new(
        store: &'a FeatureStore,
        targets: &'a EvaluationTargets,
        config: &PredictorConfig,
    ) -> Self {
        Self {
            store,
            targets,
            trainer: config.trainer(),
            scorer: config.scorer(),
            max_rate: config.max_rate,
        }
    }

    /// Run over files: read `ratings`, write predictions to `output`.
    pub fn run_files(&self, ratings: &Path, output: &Path) -> Result<RunSummary> {
        let input = File::open(ratings)
            .with_context(|| format!("Failed to open ratings file {}", ratings.display()))?;
        let out = File::create(output)
            .with_context(|| format!("Failed to create output file {}", output.display()))?;
        self.run(BufReader::new(input), BufWriter::new(out))
    }

    /// Process the whole stream and write the prediction file.
    pub fn run<R: BufRead, W: Write>(&self, ratings: R, output: W) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut writer = PredictionWriter::new(output).context("Failed to write output header")?;
        let mut summary = RunSummary::default();
        let mut session: Option<UserSession<'a>> = None;

        for record in CsvRecords::new(ratings) {
            let row = match record.and_then(|record| parse_rating_record(&record)) {
                Ok(RatingLine::Row(row)) => row,
                Ok(RatingLine::Header) => {
                    summary.rows_skipped += 1;
                    continue;
                }
                Err(e) if e.is_row_level() => {
                    debug!("Skipping ratings row: {}", e);
                    summary.rows_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e).context("Failed to read the ratings stream"),
            };

            if summary.rows_processed % PROGRESS_INTERVAL == 0 {
                debug!("Ratings rows processed: {}", summary.rows_processed);
            }
            summary.rows_processed += 1;

            if session.as_ref().map(UserSession::user_id) != Some(row.user_id) {
                if let Some(done) = session.replace(UserSession::new(row.user_id)) {
                    self.finalize(done, &mut writer, &mut summary)?;
                }
                summary.users_seen += 1;
            }

            let features = self.store.row(&row.movie_id);
            if features.is_none() {
                summary.unknown_ratings += 1;
            }
            if self.targets.contains_user(row.user_id) {
                if let Some(current) = session.as_mut() {
                    current.push(features, row.rating / self.max_rate);
                }
            }
        }

        // The last user never sees a different user id after it
        if let Some(done) = session.take() {
            self.finalize(done, &mut writer, &mut summary)?;
        }

        summary.predictions_written = writer.written();
        writer.finish().context("Failed to flush predictions")?;

        info!(
            "Processed {} ratings rows ({} skipped): {} users seen, {} scored, {} predictions in {:?}",
            summary.rows_processed,
            summary.rows_skipped,
            summary.users_seen,
            summary.users_scored,
            summary.predictions_written,
            start_time.elapsed()
        );
        Ok(summary)
    }

    /// Train and score a finished user if they have evaluation targets.
    fn finalize<W: Write>(
        &self,
        session: UserSession<'a>,
        writer: &mut PredictionWriter<W>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let Some(targets) = self.targets.movies_for(session.user_id()) else {
            return Ok(());
        };
        let user_id = session.user_id();
        let Some(profile) = session.train(&self.trainer) else {
            debug!("User {} has no known rated movie, no predictions", user_id);
            return Ok(());
        };

        for prediction in self.scorer.predict(&profile, targets, self.store) {
            writer
                .write(&prediction)
                .with_context(|| format!("Failed to write predictions for user {}", user_id))?;
        }
        summary.users_scored += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use features::{FeatureCatalog, FeatureMatrix};

    fn store() -> FeatureStore {
        let catalog = FeatureCatalog::parse("genre_35\ngenre_18\ngenre_unknown\n").unwrap();
        let matrix = FeatureMatrix::from_rows(
            vec!["1".to_string(), "2".to_string(), "3".to_string()],
            3,
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
        )
        .unwrap();
        FeatureStore::new(matrix, catalog).unwrap()
    }

    fn run(ratings: &str, targets: &EvaluationTargets) -> (RunSummary, String) {
        let store = store();
        let orchestrator = StreamOrchestrator::new(&store, targets, &PredictorConfig::default());
        let mut out = Vec::new();
        let summary = orchestrator.run(ratings.as_bytes(), &mut out).unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_last_user_is_flushed() {
        let mut targets = EvaluationTargets::new();
        targets.insert(9, "1".to_string());

        let (summary, output) = run("userId,movieId,rating,timestamp\n9,1,5.0,0\n", &targets);
        assert_eq!(output.lines().count(), 2);
        assert_eq!(summary.users_scored, 1);
        assert_eq!(summary.rows_skipped, 1);
    }

    #[test]
    fn test_skipped_rows_keep_current_user() {
        let mut targets = EvaluationTargets::new();
        targets.insert(1, "2".to_string());

        // The malformed rows between user 1's ratings must not split the user
        let ratings = "1,1,4.0,0\n1,bad\nx,2,4.0,0\n1,2,2.0,0\n";
        let (summary, output) = run(ratings, &targets);
        assert_eq!(summary.rows_processed, 2);
        assert_eq!(summary.rows_skipped, 2);
        assert_eq!(summary.users_seen, 1);
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_stray_quote_does_not_swallow_later_users() {
        let mut targets = EvaluationTargets::new();
        for user in 1..=3 {
            targets.insert(user, "1".to_string());
        }

        let ratings = "1,1,4.0,0\n1,2x\",4.0,0\n2,2,4.0,0\n3,3,4.0,0\n";
        let (summary, output) = run(ratings, &targets);
        // The quote stays part of the movie id, which has no feature row
        assert_eq!(summary.rows_processed, 4);
        assert_eq!(summary.unknown_ratings, 1);
        assert_eq!(summary.users_seen, 3);
        assert_eq!(summary.predictions_written, 3);
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn test_non_finite_rating_is_skipped() {
        let mut targets = EvaluationTargets::new();
        targets.insert(1, "1".to_string());

        let (summary, output) = run("1,1,nan,0\n1,2,4.0,0\n", &targets);
        assert_eq!(summary.rows_skipped, 1);
        assert_eq!(summary.rows_processed, 1);
        assert!(!output.contains("NaN"));
    }

    #[test]
    fn test_user_without_known_movies_has_no_prediction() {
        let mut targets = EvaluationTargets::new();
        targets.insert(1, "1".to_string());
        targets.insert(2, "1".to_string());

        let (summary, output) = run("1,77,4.0,0\n2,1,3.0,0\n", &targets);
        assert_eq!(summary.unknown_ratings, 1);
        assert_eq!(summary.users_scored, 1);
        // Targets are rating / max_rate, so a dot-product score stays on that scale
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines, vec!["user_id,movie_id,ratings", "2,1,0.5"]);
    }

    #[test]
    fn test_users_without_targets_are_not_scored() {
        let targets = EvaluationTargets::new();
        let (summary, output) = run("1,1,4.0,0\n2,2,3.0,0\n", &targets);
        assert_eq!(summary.users_seen, 2);
        assert_eq!(summary.users_scored, 0);
        assert_eq!(output, "user_id,movie_id,ratings\n");
    }
}
