//! Error types for the data-loader crate.
//!
//! Every variant except `IoError` and `FileNotFound` describes a single bad
//! row. Callers recover from those by skipping the row and counting it.

use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading metadata, ratings and target files
///
/// Rust concept: The `#[derive(Error)]` macro from thiserror implements
/// `std::error::Error` and `Display` from the `#[error(...)]` attributes
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in a data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Expected number of fields in a line doesn't match actual
    #[error("Expected {expected} fields but found {found} in line {line}")]
    FieldCountMismatch {
        expected: usize,
        found: usize,
        line: usize,
    },

    /// A header row lacks a column we locate by name
    #[error("Missing column '{column}' in header of {file}")]
    MissingColumn { column: String, file: String },

    /// A quoted field was still open when the input ended
    #[error("Unterminated quoted field starting at line {line}")]
    UnterminatedQuote { line: usize },
}

impl DataLoadError {
    /// True for errors confined to one row; the reader can keep going.
    pub fn is_row_level(&self) -> bool {
        !matches!(
            self,
            DataLoadError::FileNotFound { .. } | DataLoadError::IoError(_)
        )
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;

/// Open a file for reading, reporting a missing file by path.
pub fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}
