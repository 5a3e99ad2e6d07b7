//! Raw input shapes and the validated feature vector they parse into

use crate::error::ParseError;
use crate::parser;
use crate::schema::{FeatureSchema, FEATURE_COUNT};
use crate::types::table::Table;
use serde::Serialize;
use std::collections::HashMap;

/// Raw field strings keyed by schema name, as typed into a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    values: HashMap<String, String>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw string for a field, replacing any previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Split a pasted row into raw field strings (the autofill action).
    ///
    /// Only the token count is checked here; numeric validation happens
    /// when the values are parsed.
    pub fn from_pasted_row(text: &str) -> Result<Self, ParseError> {
        parser::autofill(text)
    }

    /// Field/value pairs in schema order, skipping fields that are unset.
    pub fn in_schema_order(&self) -> Vec<(&'static str, &str)> {
        FeatureSchema::column_order()
            .iter()
            .filter_map(|&name| self.get(name).map(|v| (name, v)))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = FieldValues::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

/// A schema-conformant feature vector: 29 finite values in schema order.
///
/// Only the parser constructs these, so a record is never partially filled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidatedRecord {
    values: [f64; FEATURE_COUNT],
}

impl ValidatedRecord {
    pub(crate) fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        debug_assert!(values.iter().all(|v| v.is_finite()));
        Self { values }
    }

    /// Values in schema order.
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Value of a named field.
    pub fn get(&self, field: &str) -> Option<f64> {
        FeatureSchema::position(field).map(|i| self.values[i])
    }

    pub fn amount(&self) -> f64 {
        self.values[FEATURE_COUNT - 1]
    }

    /// Values narrowed to `f32` for tensor input.
    pub fn to_f32(&self) -> [f32; FEATURE_COUNT] {
        self.values.map(|v| v as f32)
    }
}

/// One user action's worth of raw input.
#[derive(Debug, Clone)]
pub enum RawInput {
    FieldValues(FieldValues),
    PastedRow(String),
    Table(Table),
}

impl RawInput {
    /// Parse into validated records. Single-record inputs yield one record;
    /// tables yield one per row, in row order.
    pub fn into_records(self) -> Result<Vec<ValidatedRecord>, ParseError> {
        match self {
            RawInput::FieldValues(fields) => parser::parse_fields(&fields).map(|r| vec![r]),
            RawInput::PastedRow(text) => parser::parse_pasted_row(&text).map(|r| vec![r]),
            RawInput::Table(table) => parser::parse_table(&table),
        }
    }
}
