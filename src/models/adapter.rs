//! Uniform scoring interface over the classifier artifact

use crate::error::ScoringError;
use crate::schema::{FeatureSchema, FEATURE_COUNT};
use crate::types::prediction::PredictionResult;
use crate::types::record::ValidatedRecord;
use std::sync::Arc;
use tracing::debug;

/// Row-major `f32` feature matrix with columns in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Vec<f32>,
    rows: usize,
}

impl FeatureMatrix {
    pub fn from_records(records: &[ValidatedRecord]) -> Self {
        let mut data = Vec::with_capacity(records.len() * FEATURE_COUNT);
        for record in records {
            data.extend_from_slice(&record.to_f32());
        }
        Self {
            data,
            rows: records.len(),
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        FeatureSchema::column_order()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        FEATURE_COUNT
    }

    /// Flat row-major values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        self.data.chunks_exact(FEATURE_COUNT).nth(index)
    }
}

/// An opaque pre-trained binary classifier.
///
/// Implementations return one raw label per input row, in row order, and
/// must label each row independently of the others.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i64>, ScoringError>;
}

/// Scores validated records against an injected classifier.
#[derive(Clone)]
pub struct ScoringAdapter {
    classifier: Arc<dyn Classifier>,
}

impl ScoringAdapter {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Label every record, aligned index for index with the input.
    pub fn score(&self, records: &[ValidatedRecord]) -> Result<Vec<PredictionResult>, ScoringError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let features = FeatureMatrix::from_records(records);
        let labels = self.classifier.predict(&features)?;

        if labels.len() != records.len() {
            return Err(ScoringError::schema_mismatch(format!(
                "classifier returned {} labels for {} rows",
                labels.len(),
                records.len()
            )));
        }

        let results = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                PredictionResult::from_label(label).ok_or_else(|| {
                    ScoringError::schema_mismatch(format!("row {i}: unexpected label {label}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            classifier = %self.classifier.name(),
            rows = results.len(),
            flagged = results.iter().filter(|r| r.is_fraudulent()).count(),
            "Batch scored"
        );

        Ok(results)
    }

    /// Label a single record.
    pub fn score_one(&self, record: &ValidatedRecord) -> Result<PredictionResult, ScoringError> {
        let mut results = self.score(std::slice::from_ref(record))?;
        results
            .pop()
            .ok_or_else(|| ScoringError::schema_mismatch("classifier returned no label"))
    }
}
