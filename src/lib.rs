//! Card Fraud Screen Library
//!
//! Validates transaction feature vectors typed as fields, pasted as a row or
//! uploaded as a CSV batch, scores them against a pre-trained classifier and
//! reports the rows flagged as fraudulent.

pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod report;
pub mod schema;
pub mod types;

pub use config::AppConfig;
pub use error::{ParseError, ScoringError};
pub use models::{Classifier, FeatureMatrix, OnnxClassifier, ScoringAdapter};
pub use parser::{
    autofill, parse_batch, parse_fields, parse_pasted_row, parse_table, parse_table_rowwise,
    BatchErrorMode, RowwiseParse,
};
pub use report::{filter_flagged, BatchReporter, FilteredReport};
pub use schema::FeatureSchema;
pub use types::{FieldValues, PredictionResult, RawInput, Table, ValidatedRecord};
