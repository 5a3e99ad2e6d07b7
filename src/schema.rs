//! Feature schema for the card fraud classifier.
//!
//! The classifier was trained on 28 anonymised components plus the
//! transaction amount. Every component that builds a numeric vector or a
//! column set reads the order from here.

/// Number of features the classifier consumes.
pub const FEATURE_COUNT: usize = 29;

/// Feature names in the exact order expected by the classifier.
const COLUMN_ORDER: [&str; FEATURE_COUNT] = [
    "V1", "V2", "V3", "V4", "V5", "V6", "V7", "V8", "V9", "V10", "V11", "V12", "V13", "V14",
    "V15", "V16", "V17", "V18", "V19", "V20", "V21", "V22", "V23", "V24", "V25", "V26", "V27",
    "V28", "Amount",
];

/// The fixed, ordered set of named numeric inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureSchema;

impl FeatureSchema {
    /// Column names in classifier order.
    pub fn column_order() -> &'static [&'static str] {
        &COLUMN_ORDER
    }

    /// Number of fields (always 29).
    pub fn len() -> usize {
        FEATURE_COUNT
    }

    /// Position of a field in the schema, if it belongs to it.
    pub fn position(name: &str) -> Option<usize> {
        COLUMN_ORDER.iter().position(|&c| c == name)
    }
}
