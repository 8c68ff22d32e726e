//! Ratings, evaluation targets, ground truth and prediction files.
//!
//! Formats:
//! - ratings: `userId,movieId,rating,timestamp` (exactly 4 fields)
//! - evaluation targets: `userId,movieId[,...]` (at least 2 fields)
//! - ground truth: header naming `userId`, `movieId`, `rating` in any order
//! - predictions: header `user_id,movie_id,ratings`

use crate::error::{DataLoadError, Result};
use crate::parser::{CsvRecord, CsvRecords, locate_columns, open_records, parse_field};
use crate::types::{
    EvaluationTargets, LoadReport, PredictionRecord, RatingRow, RatingTargets, UserId,
};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, info};

/// Number of fields in a ratings row
pub const RATING_FIELD_COUNT: usize = 4;

/// First column name of the ratings and targets headers
pub const USER_ID_COLUMN: &str = "userId";

/// Header line of a prediction file
pub const PREDICTION_HEADER: &str = "user_id,movie_id,ratings";

const RATINGS_FILE: &str = "ratings.csv";
const TARGETS_FILE: &str = "evaluation_ratings.csv";

/// A ratings row is either the header or data
#[derive(Debug, Clone, PartialEq)]
pub enum RatingLine {
    Header,
    Row(RatingRow),
}

/// Parse one record of the ratings stream.
///
/// The header is recognized by the literal `userId` in the first column.
pub fn parse_rating_record(record: &CsvRecord) -> Result<RatingLine> {
    if record.len() != RATING_FIELD_COUNT {
        return Err(DataLoadError::FieldCountMismatch {
            expected: RATING_FIELD_COUNT,
            found: record.len(),
            line: record.line,
        });
    }
    if record.field(0) == USER_ID_COLUMN {
        return Ok(RatingLine::Header);
    }

    Ok(RatingLine::Row(RatingRow {
        user_id: parse_field(record.field(0), "userId", RATINGS_FILE, record.line)?,
        movie_id: record.field(1).trim().to_string(),
        rating: parse_rating(record.field(2), "rating", RATINGS_FILE, record.line)?,
    }))
}

/// Parse a rating cell. `nan` and `inf` parse as floats but are rejected.
pub fn parse_rating(value: &str, name: &str, file: &str, line: usize) -> Result<f64> {
    let rating: f64 = parse_field(value, name, file, line)?;
    if !rating.is_finite() {
        return Err(DataLoadError::InvalidValue {
            field: format!("{} (line {})", name, line),
            value: value.trim().to_string(),
        });
    }
    Ok(rating)
}

/// Load the (user, movie) pairs that need a prediction.
pub fn load_evaluation_targets(path: &Path) -> Result<(EvaluationTargets, LoadReport)> {
    info!("Reading evaluation targets from {}", path.display());
    let (targets, report) = read_target_records(open_records(path)?)?;
    info!(
        "Read {} evaluation targets for {} users ({} rows skipped)",
        targets.target_count(),
        targets.user_count(),
        report.rows_skipped
    );
    Ok((targets, report))
}

/// Parse evaluation targets from any buffered reader.
pub fn read_evaluation_targets<R: BufRead>(reader: R) -> Result<(EvaluationTargets, LoadReport)> {
    read_target_records(CsvRecords::new(reader))
}

fn read_target_records<R: BufRead>(
    records: CsvRecords<R>,
) -> Result<(EvaluationTargets, LoadReport)> {
    let mut targets = EvaluationTargets::new();
    let mut report = LoadReport::default();

    for record in records {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_row_level() => {
                report.rows_skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        if record.len() < 2 {
            report.rows_skipped += 1;
            continue;
        }
        if record.field(0) == USER_ID_COLUMN {
            continue;
        }

        match parse_field(record.field(0), "userId", TARGETS_FILE, record.line) {
            Ok(user_id) => {
                targets.insert(user_id, record.field(1).trim().to_string());
                report.rows_read += 1;
            }
            Err(e) => {
                debug!("Skipping target row: {}", e);
                report.rows_skipped += 1;
            }
        }
    }

    Ok((targets, report))
}

/// Load ground-truth ratings keyed by (user, movie).
///
/// Columns are located by header name; later duplicates overwrite earlier ones.
/// Malformed rows are skipped and counted.
pub fn load_rating_targets(path: &Path) -> Result<(RatingTargets, LoadReport)> {
    let file = path.display().to_string();
    read_truth_records(open_records(path)?, &file)
}

/// Parse ground-truth ratings from any buffered reader.
pub fn read_rating_targets<R: BufRead>(reader: R) -> Result<(RatingTargets, LoadReport)> {
    read_truth_records(CsvRecords::new(reader), "ground truth")
}

fn read_truth_records<R: BufRead>(
    mut records: CsvRecords<R>,
    file: &str,
) -> Result<(RatingTargets, LoadReport)> {
    let mut truth = RatingTargets::new();
    let mut report = LoadReport::default();
    let header = match records.next() {
        Some(header) => header?,
        None => return Ok((truth, report)),
    };
    let columns = locate_columns(&header, &["userId", "movieId", "rating"], file)?;
    let (user_col, movie_col, rating_col) = (columns[0], columns[1], columns[2]);

    for record in records {
        let parsed = record.and_then(|record| {
            let user_id: UserId = parse_field(record.field(user_col), "userId", file, record.line)?;
            let rating = parse_rating(record.field(rating_col), "rating", file, record.line)?;
            Ok(((user_id, record.field(movie_col).trim().to_string()), rating))
        });
        match parsed {
            Ok((key, rating)) => {
                truth.insert(key, rating);
                report.rows_read += 1;
            }
            Err(e) if e.is_row_level() => {
                debug!("Skipping ground-truth row: {}", e);
                report.rows_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok((truth, report))
}

/// Read a prediction file back.
///
/// Rows whose rating cell is blank carry no prediction and are left out
/// without being counted. Malformed rows are skipped and counted.
pub fn load_predictions(path: &Path) -> Result<(Vec<PredictionRecord>, LoadReport)> {
    let file = path.display().to_string();
    read_prediction_records(open_records(path)?, &file)
}

/// Parse predictions from any buffered reader.
pub fn read_predictions<R: BufRead>(reader: R) -> Result<(Vec<PredictionRecord>, LoadReport)> {
    read_prediction_records(CsvRecords::new(reader), "predictions")
}

fn read_prediction_records<R: BufRead>(
    mut records: CsvRecords<R>,
    file: &str,
) -> Result<(Vec<PredictionRecord>, LoadReport)> {
    let mut predictions = Vec::new();
    let mut report = LoadReport::default();
    let header = match records.next() {
        Some(header) => header?,
        None => return Ok((predictions, report)),
    };
    let columns = locate_columns(&header, &["user_id", "movie_id", "ratings"], file)?;
    let (user_col, movie_col, rating_col) = (columns[0], columns[1], columns[2]);

    for record in records {
        let parsed = record.and_then(|record| {
            if record.field(rating_col).trim().is_empty() {
                return Ok(None);
            }
            Ok(Some(PredictionRecord {
                user_id: parse_field(record.field(user_col), "user_id", file, record.line)?,
                movie_id: record.field(movie_col).trim().to_string(),
                rating: parse_rating(record.field(rating_col), "ratings", file, record.line)?,
            }))
        });
        match parsed {
            Ok(Some(prediction)) => {
                predictions.push(prediction);
                report.rows_read += 1;
            }
            Ok(None) => {}
            Err(e) if e.is_row_level() => {
                debug!("Skipping prediction row: {}", e);
                report.rows_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok((predictions, report))
}

/// Writes prediction rows under the `user_id,movie_id,ratings` header.
///
/// Ratings are always multiples of 0.5, so one decimal is exact.
pub struct PredictionWriter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> PredictionWriter<W> {
    /// Wrap `writer` and emit the header line.
    pub fn new(mut writer: W) -> Result<Self> {
        writeln!(writer, "{}", PREDICTION_HEADER)?;
        Ok(Self { writer, written: 0 })
    }

    pub fn write(&mut self, prediction: &PredictionRecord) -> Result<()> {
        writeln!(
            self.writer,
            "{},{},{}",
            prediction.user_id,
            prediction.movie_id,
            format_rating(prediction.rating)
        )?;
        self.written += 1;
        Ok(())
    }

    /// Rows written so far, header excluded
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the inner writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Format a rating with one decimal, never as `-0.0`.
pub fn format_rating(rating: f64) -> String {
    // Adding positive zero turns -0.0 into 0.0
    format!("{:.1}", rating + 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: usize, fields: &[&str]) -> CsvRecord {
        CsvRecord {
            line,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_rating_record() {
        let header = record(1, &["userId", "movieId", "rating", "timestamp"]);
        assert_eq!(parse_rating_record(&header).unwrap(), RatingLine::Header);

        let row = record(2, &["1", "110", "1.0", "1425941529"]);
        assert_eq!(
            parse_rating_record(&row).unwrap(),
            RatingLine::Row(RatingRow {
                user_id: 1,
                movie_id: "110".to_string(),
                rating: 1.0
            })
        );

        assert!(matches!(
            parse_rating_record(&record(3, &["1", "110", "1.0"])),
            Err(DataLoadError::FieldCountMismatch { found: 3, .. })
        ));
        assert!(matches!(
            parse_rating_record(&record(4, &["x", "110", "1.0", "0"])),
            Err(DataLoadError::ParseError { line: 4, .. })
        ));
    }

    #[test]
    fn test_non_finite_ratings_rejected() {
        for bad in ["nan", "NaN", "inf", "-inf"] {
            let err = parse_rating_record(&record(2, &["1", "1", bad, "0"])).unwrap_err();
            assert!(matches!(err, DataLoadError::InvalidValue { .. }));
            assert!(err.is_row_level());
        }
    }

    #[test]
    fn test_read_evaluation_targets() {
        let input = "userId,movieId\n1,10\n1,20\n2,30,extra\nbad\nx,40\n";
        let (targets, report) = read_evaluation_targets(input.as_bytes()).unwrap();

        assert_eq!(targets.movies_for(1).unwrap(), &["10".to_string(), "20".to_string()]);
        assert_eq!(targets.movies_for(2).unwrap(), &["30".to_string()]);
        assert!(!targets.contains_user(3));
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_skipped, 2);
    }

    #[test]
    fn test_read_rating_targets_by_header() {
        let input = "movieId,rating,userId,timestamp\n10,5.0,1,0\n20,3.5,2,0\n";
        let (truth, report) = read_rating_targets(input.as_bytes()).unwrap();
        assert_eq!(truth.get(&(1, "10".to_string())), Some(&5.0));
        assert_eq!(truth.get(&(2, "20".to_string())), Some(&3.5));
        assert_eq!(report.rows_read, 2);
    }

    #[test]
    fn test_bad_truth_rows_skipped() {
        let input = "userId,movieId,rating\n1,10,5.0\n2,20,NA\n3,30,nan\nx,40,1.0\n4,50,2.0\n";
        let (truth, report) = read_rating_targets(input.as_bytes()).unwrap();
        assert_eq!(truth.len(), 2);
        assert_eq!(truth.get(&(4, "50".to_string())), Some(&2.0));
        assert_eq!(report.rows_read, 2);
        assert_eq!(report.rows_skipped, 3);
    }

    #[test]
    fn test_prediction_writer_round_trip() {
        let mut writer = PredictionWriter::new(Vec::new()).unwrap();
        writer
            .write(&PredictionRecord {
                user_id: 1,
                movie_id: "10".to_string(),
                rating: 4.5,
            })
            .unwrap();
        writer
            .write(&PredictionRecord {
                user_id: 2,
                movie_id: "20".to_string(),
                rating: -0.0,
            })
            .unwrap();
        assert_eq!(writer.written(), 2);

        let bytes = writer.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "user_id,movie_id,ratings\n1,10,4.5\n2,20,0.0\n");

        let (back, _) = read_predictions(text.as_bytes()).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].rating, 4.5);
    }

    #[test]
    fn test_blank_predictions_skipped() {
        let input = "user_id,movie_id,ratings\n1,10,\n1,11,3.0\n1,12,oops\n";
        let (back, report) = read_predictions(input.as_bytes()).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].movie_id, "11");
        assert_eq!(report.rows_skipped, 1);
    }
}
