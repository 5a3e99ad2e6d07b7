//! Error taxonomy for parsing and scoring

use serde::Serialize;
use thiserror::Error;

/// Input could not be turned into validated records.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    #[error("Missing field: {field}")]
    MissingField { field: String },

    #[error("{}", describe_non_numeric(field, *row, value))]
    NonNumericField {
        field: String,
        /// 0-based data row, set for table input only
        row: Option<usize>,
        value: String,
    },

    #[error("Expected {expected} comma-separated values, got {actual}")]
    WrongFieldCount { expected: usize, actual: usize },

    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("{}", describe_invalid_table(*line, message))]
    InvalidTable { line: Option<u64>, message: String },
}

fn describe_non_numeric(field: &str, row: Option<usize>, value: &str) -> String {
    match row {
        Some(row) => format!("Row {row}: field {field} is not numeric: {value:?}"),
        None => format!("Field {field} is not numeric: {value:?}"),
    }
}

fn describe_invalid_table(line: Option<u64>, message: &str) -> String {
    match line {
        Some(line) => format!("Invalid table at line {line}: {message}"),
        None => format!("Invalid table: {message}"),
    }
}

/// The classifier could not label the input, or labels and rows disagree.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringError {
    #[error("Classifier schema mismatch: {detail}")]
    SchemaMismatch { detail: String },

    #[error("Label count mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Classifier failure: {0}")]
    Backend(String),
}

impl ScoringError {
    pub(crate) fn schema_mismatch(detail: impl Into<String>) -> Self {
        ScoringError::SchemaMismatch {
            detail: detail.into(),
        }
    }
}
