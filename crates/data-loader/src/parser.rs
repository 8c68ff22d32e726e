//! Low-level parsing shared by every input file.
//!
//! - `CsvRecords`: streaming reader of comma-delimited records. Fields may be
//!   quoted, quotes inside a quoted field are doubled, and a quoted field may
//!   span several lines (the metadata overviews do).
//! - `literal_values`: pulls values out of the Python-literal list columns of
//!   the metadata file, e.g. `[{'id': 35, 'name': 'Comedy'}]`.
//! - Small field parsers that turn a bad value into a row-level error.

use crate::error::{DataLoadError, Result, open_file};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// One delimited record and the line it started on (1-based)
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRecord {
    pub line: usize,
    pub fields: Vec<String>,
}

impl CsvRecord {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> &str {
        self.fields.get(idx).map(String::as_str).unwrap_or("")
    }
}

/// Iterator over the records of a delimited text source.
///
/// Blank lines are skipped. An I/O error ends the useful part of the stream;
/// an unterminated quote is reported once and then the iterator is exhausted
/// because the rest of the input was consumed looking for the closing quote.
pub struct CsvRecords<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> CsvRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Number of physical lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line
    }

    fn parse_record(&mut self) -> Result<CsvRecord> {
        let start_line = self.line;
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        // A quote only opens a quoted field as the field's first character
        let mut field_start = true;
        let mut text = std::mem::take(&mut self.buf);

        loop {
            let mut chars = text.chars().peekable();
            while let Some(c) = chars.next() {
                match (in_quotes, c) {
                    (true, '"') => {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            field.push('"');
                        } else {
                            in_quotes = false;
                        }
                    }
                    (true, c) => field.push(c),
                    (false, '"') if field_start => {
                        in_quotes = true;
                        field_start = false;
                    }
                    (false, ',') => {
                        fields.push(std::mem::take(&mut field));
                        field_start = true;
                    }
                    (false, '\n') | (false, '\r') => {}
                    (false, c) => {
                        field.push(c);
                        field_start = false;
                    }
                }
            }

            if !in_quotes {
                break;
            }

            // Quoted field continues on the next physical line
            text.clear();
            if self.reader.read_line(&mut text)? == 0 {
                return Err(DataLoadError::UnterminatedQuote { line: start_line });
            }
            self.line += 1;
        }

        fields.push(field);
        self.buf = text;
        Ok(CsvRecord {
            line: start_line,
            fields,
        })
    }
}

impl<R: BufRead> Iterator for CsvRecords<R> {
    type Item = Result<CsvRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line += 1;

            if self.buf.trim_end_matches(['\r', '\n']).is_empty() {
                continue; // Skip empty lines
            }
            return Some(self.parse_record());
        }
    }
}

/// Open a delimited file for streaming.
///
/// The `BufReader` owns the file handle, so it is closed whenever the
/// iterator is dropped, including on early returns.
pub fn open_records(path: &Path) -> Result<CsvRecords<BufReader<File>>> {
    let file = open_file(path)?;
    Ok(CsvRecords::new(BufReader::new(file)))
}

/// Extract every value stored under `key` in a Python-literal list of dicts.
///
/// ```ignore
/// literal_values("[{'id': 35, 'name': 'Comedy'}, {'id': 10751, 'name': 'Family'}]", "id")
///     == vec!["35", "10751"]
/// ```
///
/// Keys are matched exactly. Values whose text contains commas are cut at the
/// first comma, which never matters for the id and code keys read here.
pub fn literal_values(raw: &str, key: &str) -> Vec<String> {
    let mut values = Vec::new();
    for object in raw.split('}') {
        for pair in object.split(',') {
            let Some((k, v)) = pair.split_once(':') else {
                continue;
            };
            if clean_literal_token(k) == key {
                let value = clean_literal_token(v);
                if !value.is_empty() {
                    values.push(value);
                }
            }
        }
    }
    values
}

fn clean_literal_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '[' | ']' | '\'' | '"'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Push `value` unless it is already present (set semantics, ordered).
pub fn push_unique<T: PartialEq>(values: &mut Vec<T>, value: T) {
    if !values.contains(&value) {
        values.push(value);
    }
}

/// Parse one field, turning a failure into a row-level `ParseError`.
pub fn parse_field<T>(value: &str, name: &str, file: &str, line: usize) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", name, e),
    })
}

/// Parse a float that may be blank; blank means `0.0`.
pub fn parse_optional_f64(value: &str, name: &str, file: &str, line: usize) -> Result<f64> {
    if value.trim().is_empty() {
        Ok(0.0)
    } else {
        parse_field(value, name, file, line)
    }
}

/// Locate named columns in a header row.
pub fn locate_columns(header: &CsvRecord, names: &[&str], file: &str) -> Result<Vec<usize>> {
    names
        .iter()
        .map(|name| {
            header
                .fields
                .iter()
                .position(|f| f.trim() == *name)
                .ok_or_else(|| DataLoadError::MissingColumn {
                    column: name.to_string(),
                    file: file.to_string(),
                })
        })
        .collect()
}
