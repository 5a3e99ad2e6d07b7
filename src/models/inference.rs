//! ONNX Runtime classifier

use crate::config::ModelConfig;
use crate::error::ScoringError;
use crate::models::adapter::{Classifier, FeatureMatrix};
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::schema::FEATURE_COUNT;
use anyhow::Result;
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::{debug, info};

/// The classifier artifact, loaded once and never replaced.
pub struct OnnxClassifier {
    /// ort needs exclusive access to the session while it runs
    model: Mutex<LoadedModel>,
    name: String,
    input_width: Option<usize>,
    threshold: f64,
}

impl OnnxClassifier {
    /// Load the model described by the configuration
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.intra_threads);
        let model = loader.load(config)?;

        if let Some(width) = model.input_width {
            if width != FEATURE_COUNT {
                anyhow::bail!(ScoringError::schema_mismatch(format!(
                    "model {} expects {} features, schema has {}",
                    model.name, width, FEATURE_COUNT
                )));
            }
        }

        info!(model = %model.name, threshold = config.threshold, "ONNX classifier ready");

        Ok(Self {
            name: model.name.clone(),
            input_width: model.input_width,
            threshold: config.threshold,
            model: Mutex::new(model),
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i64>, ScoringError> {
        check_input_width(self.input_width, features.width())?;

        let rows = features.rows();
        let shape = vec![rows as i64, features.width() as i64];
        let input_tensor = Tensor::from_array((shape, features.data().to_vec()))
            .map_err(|e| ScoringError::Backend(format!("Failed to create input tensor: {e}")))?;

        let mut guard = self
            .model
            .lock()
            .map_err(|e| ScoringError::Backend(format!("Lock error: {e}")))?;
        let model = &mut *guard;

        let outputs = model
            .session
            .run(ort::inputs![model.input_name.as_str() => input_tensor])
            .map_err(|e| ScoringError::Backend(e.to_string()))?;

        let labels = model
            .label_output
            .as_deref()
            .and_then(|name| outputs.get(name))
            .and_then(|output| output.try_extract_tensor::<i64>().ok())
            .map(|(_, data)| data);
        let probabilities = model
            .probability_output
            .as_deref()
            .and_then(|name| outputs.get(name))
            .and_then(|output| output.try_extract_tensor::<f32>().ok())
            .map(|(shape, data)| (shape.iter().copied().collect::<Vec<i64>>(), data));

        let extracted = ExtractedOutputs {
            labels,
            probabilities,
        };
        let labels = labels_from_outputs(&extracted, rows, self.threshold, &model.name)?;
        debug!(model = %model.name, rows, "Extracted labels");
        Ok(labels)
    }
}

/// Outputs read back from one session run.
#[derive(Debug, Default)]
struct ExtractedOutputs<'a> {
    /// Integer class labels, one per row
    labels: Option<&'a [i64]>,
    /// Probability tensor dims and data
    probabilities: Option<(Vec<i64>, &'a [f32])>,
}

fn check_input_width(expected: Option<usize>, actual: usize) -> Result<(), ScoringError> {
    match expected {
        Some(width) if width != actual => Err(ScoringError::schema_mismatch(format!(
            "model expects {width} features, got {actual}"
        ))),
        _ => Ok(()),
    }
}

/// Labels from the integer output when present, otherwise thresholded
/// fraud-class probabilities.
fn labels_from_outputs(
    outputs: &ExtractedOutputs<'_>,
    rows: usize,
    threshold: f64,
    model_name: &str,
) -> Result<Vec<i64>, ScoringError> {
    if let Some(labels) = outputs.labels {
        return Ok(labels.to_vec());
    }

    if let Some((dims, data)) = &outputs.probabilities {
        let probs = fraud_probabilities(dims, data, rows)?;
        return Ok(probs
            .into_iter()
            .map(|p| i64::from(f64::from(p) >= threshold))
            .collect());
    }

    Err(ScoringError::schema_mismatch(format!(
        "model {model_name} produced no integer label or float probability output"
    )))
}

/// Fraud-class probability per row from a probability tensor.
///
/// `[n, k]` with k >= 2 reads column 1, `[n, 1]` and `[n]` read the value.
fn fraud_probabilities(dims: &[i64], data: &[f32], rows: usize) -> Result<Vec<f32>, ScoringError> {
    let mismatch = || {
        ScoringError::schema_mismatch(format!(
            "probability output shape {dims:?} does not fit {rows} rows"
        ))
    };

    let leading = dims
        .first()
        .and_then(|&d| usize::try_from(d).ok())
        .ok_or_else(mismatch)?;
    if leading != rows {
        return Err(mismatch());
    }

    match dims {
        [_] => Ok(data.to_vec()),
        [_, cols] => {
            let cols = usize::try_from(*cols).map_err(|_| mismatch())?;
            match cols {
                1 => Ok(data.to_vec()),
                c if c >= 2 => Ok(data.chunks_exact(c).map(|row| row[1]).collect()),
                _ => Err(mismatch()),
            }
        }
        _ => Err(mismatch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_class_probabilities() {
        let data = [0.9, 0.1, 0.2, 0.8];
        let probs = fraud_probabilities(&[2, 2], &data, 2).unwrap();
        assert_eq!(probs, vec![0.1, 0.8]);
    }

    #[test]
    fn test_single_column_probabilities() {
        assert_eq!(fraud_probabilities(&[3, 1], &[0.1, 0.5, 0.7], 3).unwrap(), vec![0.1, 0.5, 0.7]);
        assert_eq!(fraud_probabilities(&[2], &[0.3, 0.6], 2).unwrap(), vec![0.3, 0.6]);
    }

    #[test]
    fn test_label_output_wins_over_probabilities() {
        let outputs = ExtractedOutputs {
            labels: Some(&[1, 0][..]),
            probabilities: Some((vec![2, 2], &[0.9, 0.1, 0.1, 0.9][..])),
        };
        assert_eq!(labels_from_outputs(&outputs, 2, 0.5, "m").unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_probabilities_are_thresholded_without_labels() {
        let outputs = ExtractedOutputs {
            labels: None,
            probabilities: Some((vec![3, 2], &[0.9, 0.1, 0.5, 0.5, 0.2, 0.8][..])),
        };
        assert_eq!(labels_from_outputs(&outputs, 3, 0.5, "m").unwrap(), vec![0, 1, 1]);
        assert_eq!(labels_from_outputs(&outputs, 3, 0.85, "m").unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn test_no_usable_output() {
        let err = labels_from_outputs(&ExtractedOutputs::default(), 1, 0.5, "m").unwrap_err();
        assert!(matches!(err, ScoringError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("no integer label"));
    }

    #[test]
    fn test_input_width_check() {
        assert!(check_input_width(Some(29), 29).is_ok());
        assert!(check_input_width(None, 12).is_ok());
        assert!(matches!(
            check_input_width(Some(29), 30),
            Err(ScoringError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        assert!(matches!(
            fraud_probabilities(&[1, 2], &[0.5, 0.5], 2),
            Err(ScoringError::SchemaMismatch { .. })
        ));
        assert!(fraud_probabilities(&[2, 0], &[], 2).is_err());
        assert!(fraud_probabilities(&[2, 2, 2], &[0.0; 8], 2).is_err());
        assert!(fraud_probabilities(&[], &[], 0).is_err());
    }
}
