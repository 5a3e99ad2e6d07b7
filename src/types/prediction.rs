//! Classifier verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary verdict for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionResult {
    Fraudulent,
    Legitimate,
}

impl PredictionResult {
    /// Map a raw classifier label (1 = fraud, 0 = legitimate).
    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            1 => Some(PredictionResult::Fraudulent),
            0 => Some(PredictionResult::Legitimate),
            _ => None,
        }
    }

    /// Label as the classifier emits it.
    pub fn label(self) -> i64 {
        match self {
            PredictionResult::Fraudulent => 1,
            PredictionResult::Legitimate => 0,
        }
    }

    pub fn is_fraudulent(self) -> bool {
        self == PredictionResult::Fraudulent
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionResult::Fraudulent => write!(f, "fraudulent"),
            PredictionResult::Legitimate => write!(f, "legitimate"),
        }
    }
}
