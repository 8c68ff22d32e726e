//! Movie metadata loading.
//!
//! The metadata file has 24 columns per row:
//!
//! ```text
//! adult,belongs_to_collection,budget,genres,homepage,id,imdb_id,original_language,
//! original_title,overview,popularity,poster_path,production_companies,
//! production_countries,release_date,revenue,runtime,spoken_languages,status,
//! tagline,title,video,vote_average,vote_count
//! ```
//!
//! Rows with a different field count or an unparsable value are skipped and
//! counted. Only the first row for a given movie id is kept.

use crate::error::{DataLoadError, Result};
use crate::parser::{
    CsvRecord, CsvRecords, literal_values, open_records, parse_field, parse_optional_f64,
    push_unique,
};
use crate::types::RawMovieRecord;
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info};

/// Number of fields in a well-formed metadata row
pub const METADATA_FIELD_COUNT: usize = 24;

const FILE_NAME: &str = "movies_metadata.csv";

// Column positions of the attributes we keep
const ADULT: usize = 0;
const COLLECTION: usize = 1;
const GENRES: usize = 3;
const ID: usize = 5;
const ORIGINAL_LANGUAGE: usize = 7;
const POPULARITY: usize = 10;
const RELEASE_DATE: usize = 14;
const RUNTIME: usize = 16;
const SPOKEN_LANGUAGES: usize = 17;
const VOTE_AVERAGE: usize = 22;

/// Result of reading a metadata file
#[derive(Debug, Clone, Default)]
pub struct MetadataLoad {
    /// Distinct movies in first-seen order
    pub records: Vec<RawMovieRecord>,
    /// Data rows read, header excluded
    pub rows_read: usize,
    /// Malformed rows that were dropped
    pub rows_skipped: usize,
    /// Well-formed rows dropped because their movie id was already seen
    pub duplicates: usize,
}

/// Load and parse the metadata file at `path`.
pub fn load_metadata(path: &Path) -> Result<MetadataLoad> {
    info!("Reading movie metadata from {}", path.display());
    let load = read_metadata_records(open_records(path)?)?;
    info!(
        "Read {} metadata rows: {} movies, {} skipped, {} duplicates",
        load.rows_read,
        load.records.len(),
        load.rows_skipped,
        load.duplicates
    );
    Ok(load)
}

/// Parse metadata from any buffered reader.
pub fn read_metadata<R: BufRead>(reader: R) -> Result<MetadataLoad> {
    read_metadata_records(CsvRecords::new(reader))
}

fn read_metadata_records<R: BufRead>(records: CsvRecords<R>) -> Result<MetadataLoad> {
    let mut load = MetadataLoad::default();
    let mut seen: HashSet<String> = HashSet::new();

    for record in records {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_row_level() => {
                debug!("Skipping metadata row: {}", e);
                load.rows_skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        if is_header(&record) {
            continue;
        }
        load.rows_read += 1;

        match parse_metadata_record(&record) {
            Ok(movie) => {
                if seen.insert(movie.movie_id.clone()) {
                    load.records.push(movie);
                } else {
                    load.duplicates += 1;
                }
            }
            Err(e) => {
                debug!("Skipping metadata row: {}", e);
                load.rows_skipped += 1;
            }
        }
    }

    Ok(load)
}

fn is_header(record: &CsvRecord) -> bool {
    record.field(ADULT) == "adult" && record.field(ID) == "id"
}

/// Parse one metadata record into a `RawMovieRecord`.
pub fn parse_metadata_record(record: &CsvRecord) -> Result<RawMovieRecord> {
    let line = record.line;
    if record.len() != METADATA_FIELD_COUNT {
        return Err(DataLoadError::FieldCountMismatch {
            expected: METADATA_FIELD_COUNT,
            found: record.len(),
            line,
        });
    }

    // The row index is persisted as integers, so the id must be one. It is
    // kept in canonical form so `0862` and `862` are the same movie.
    let movie_id = parse_field::<i64>(record.field(ID), "movieId", FILE_NAME, line)?.to_string();

    let is_adult = match record.field(ADULT).trim() {
        "False" => false,
        "True" => true,
        other => {
            return Err(DataLoadError::InvalidValue {
                field: "adult".to_string(),
                value: other.to_string(),
            });
        }
    };

    let collection_ids = parse_literal_ids(record.field(COLLECTION), line)?;
    let genre_ids = parse_literal_ids(record.field(GENRES), line)?;

    let mut language_codes = Vec::new();
    let original = record.field(ORIGINAL_LANGUAGE).trim();
    if !original.is_empty() {
        language_codes.push(original.to_string());
    }
    for code in literal_values(record.field(SPOKEN_LANGUAGES), "iso_639_1") {
        push_unique(&mut language_codes, code);
    }

    Ok(RawMovieRecord {
        is_adult,
        collection_ids,
        genre_ids,
        movie_id,
        popularity: parse_field(record.field(POPULARITY), "popularity", FILE_NAME, line)?,
        release_year: parse_release_year(record.field(RELEASE_DATE), line)?,
        runtime: parse_optional_f64(record.field(RUNTIME), "runtime", FILE_NAME, line)?,
        language_codes,
        vote_average: parse_field(record.field(VOTE_AVERAGE), "vote_average", FILE_NAME, line)?,
    })
}

fn parse_literal_ids(raw: &str, line: usize) -> Result<Vec<i64>> {
    let mut ids = Vec::new();
    for value in literal_values(raw, "id") {
        push_unique(&mut ids, parse_field(&value, "id", FILE_NAME, line)?);
    }
    Ok(ids)
}

/// Keep only the year of a `YYYY-MM-DD` date; blank means `0.0`.
fn parse_release_year(raw: &str, line: usize) -> Result<f64> {
    let year = raw.trim().split('-').next().unwrap_or("");
    parse_optional_f64(year, "release_date", FILE_NAME, line)
}
