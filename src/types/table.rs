//! Tabular batch input read from CSV

use crate::error::ParseError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// A header row plus rows of raw cells.
///
/// Cells are kept verbatim so a report can echo exactly what was uploaded,
/// including columns the classifier never sees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from already-split cells.
    ///
    /// Every row must have exactly as many cells as there are headers.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, ParseError> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(ParseError::InvalidTable {
                // header is line 1
                line: Some(i as u64 + 2),
                message: format!("expected {} cells, found {}", headers.len(), row.len()),
            });
        }
        Ok(Self { headers, rows })
    }

    /// Read comma-separated text with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ParseError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::None)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record.map_err(csv_error)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(columns = headers.len(), rows = rows.len(), "Table read");
        Ok(Self { headers, rows })
    }

    /// Read a CSV file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ParseError::InvalidTable {
            line: None,
            message: format!("cannot open {}: {}", path.display(), e),
        })?;
        Self::from_reader(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column with this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

fn csv_error(err: csv::Error) -> ParseError {
    ParseError::InvalidTable {
        line: err.position().map(|p| p.line()),
        message: match err.kind() {
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => format!("expected {} cells, found {}", expected_len, len),
            _ => err.to_string(),
        },
    }
}
