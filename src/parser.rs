//! Record parsing and validation.
//!
//! Turns the three raw input shapes into [`ValidatedRecord`]s. Every failure
//! is reported as a [`ParseError`] naming the field (and row, for tables)
//! that could not be used; no value is ever defaulted or coerced.

use crate::error::ParseError;
use crate::schema::{FeatureSchema, FEATURE_COUNT};
use crate::types::record::{FieldValues, ValidatedRecord};
use crate::types::table::Table;
use serde::Deserialize;
use tracing::{debug, warn};

/// How a batch reacts to a row with a non-numeric cell.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchErrorMode {
    /// The first bad cell fails the whole table
    #[default]
    Abort,
    /// Bad rows are reported and skipped, the rest are scored
    PerRow,
}

/// Outcome of parsing a table row by row.
#[derive(Debug, Clone, Default)]
pub struct RowwiseParse {
    /// Records for the rows that parsed, in row order
    pub records: Vec<ValidatedRecord>,
    /// Original 0-based row index of each record
    pub row_indices: Vec<usize>,
    /// One error per rejected row
    pub rejected: Vec<ParseError>,
}

/// Parse a single numeric value.
///
/// Accepts optionally signed decimal notation with an optional exponent,
/// surrounded by any amount of whitespace. Non-finite results are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse the form fields, one string per schema field.
pub fn parse_fields(fields: &FieldValues) -> Result<ValidatedRecord, ParseError> {
    let mut values = [0.0; FEATURE_COUNT];

    for (slot, &name) in values.iter_mut().zip(FeatureSchema::column_order()) {
        let raw = fields.get(name).ok_or_else(|| ParseError::MissingField {
            field: name.to_string(),
        })?;
        *slot = parse_number(raw).ok_or_else(|| ParseError::NonNumericField {
            field: name.to_string(),
            row: None,
            value: raw.to_string(),
        })?;
    }

    Ok(ValidatedRecord::from_values(values))
}

/// Split a pasted row into raw field strings keyed by schema name.
pub fn autofill(text: &str) -> Result<FieldValues, ParseError> {
    let joined: String = text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
    let tokens: Vec<&str> = joined.split(',').map(str::trim).collect();

    if tokens.len() != FEATURE_COUNT {
        return Err(ParseError::WrongFieldCount {
            expected: FEATURE_COUNT,
            actual: tokens.len(),
        });
    }

    Ok(FeatureSchema::column_order()
        .iter()
        .copied()
        .zip(tokens)
        .collect())
}

/// Parse one pasted comma-separated row mapping positionally to the schema.
pub fn parse_pasted_row(text: &str) -> Result<ValidatedRecord, ParseError> {
    let fields = autofill(text)?;
    parse_fields(&fields)
}

/// Parse every row of a table. The first non-numeric cell fails the table.
pub fn parse_table(table: &Table) -> Result<Vec<ValidatedRecord>, ParseError> {
    let columns = resolve_columns(table)?;

    let records = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| parse_row(row, i, &columns))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(rows = records.len(), "Table parsed");
    Ok(records)
}

/// Parse a table keeping good rows and collecting one error per bad row.
///
/// Missing columns still fail the whole table.
pub fn parse_table_rowwise(table: &Table) -> Result<RowwiseParse, ParseError> {
    let columns = resolve_columns(table)?;
    let mut outcome = RowwiseParse::default();

    for (i, row) in table.rows().iter().enumerate() {
        match parse_row(row, i, &columns) {
            Ok(record) => {
                outcome.records.push(record);
                outcome.row_indices.push(i);
            }
            Err(e) => {
                warn!(row = i, error = %e, "Skipping invalid row");
                outcome.rejected.push(e);
            }
        }
    }

    debug!(
        accepted = outcome.records.len(),
        rejected = outcome.rejected.len(),
        "Table parsed row by row"
    );
    Ok(outcome)
}

/// Parse a table under the given error mode.
pub fn parse_batch(table: &Table, mode: BatchErrorMode) -> Result<RowwiseParse, ParseError> {
    match mode {
        BatchErrorMode::Abort => {
            let records = parse_table(table)?;
            let row_indices = (0..records.len()).collect();
            Ok(RowwiseParse {
                records,
                row_indices,
                rejected: Vec::new(),
            })
        }
        BatchErrorMode::PerRow => parse_table_rowwise(table),
    }
}

/// Header position of every schema field, or every field that is missing.
fn resolve_columns(table: &Table) -> Result<[usize; FEATURE_COUNT], ParseError> {
    let mut columns = [0; FEATURE_COUNT];
    let mut missing = Vec::new();

    for (slot, &name) in columns.iter_mut().zip(FeatureSchema::column_order()) {
        match table.column_index(name) {
            Some(idx) => *slot = idx,
            None => missing.push(name.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(columns)
    } else {
        Err(ParseError::MissingColumns { missing })
    }
}

fn parse_row(
    row: &[String],
    row_index: usize,
    columns: &[usize; FEATURE_COUNT],
) -> Result<ValidatedRecord, ParseError> {
    let mut values = [0.0; FEATURE_COUNT];

    for ((slot, &col), &name) in values
        .iter_mut()
        .zip(columns)
        .zip(FeatureSchema::column_order())
    {
        let raw = row.get(col).map(String::as_str).unwrap_or("");
        *slot = parse_number(raw).ok_or_else(|| ParseError::NonNumericField {
            field: name.to_string(),
            row: Some(row_index),
            value: raw.to_string(),
        })?;
    }

    Ok(ValidatedRecord::from_values(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_fields(amount: &str) -> FieldValues {
        let mut fields = FieldValues::new();
        for i in 1..=28 {
            fields.insert(format!("V{i}"), "0.0");
        }
        fields.insert("Amount", amount);
        fields
    }

    fn header_with(extra_first: &[&str], extra_last: &[&str]) -> Vec<String> {
        extra_first
            .iter()
            .chain(FeatureSchema::column_order())
            .chain(extra_last)
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_parse_number_grammar() {
        assert_eq!(parse_number("1.5"), Some(1.5));
        assert_eq!(parse_number("  -2 "), Some(-2.0));
        assert_eq!(parse_number("+3"), Some(3.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("3e-4"), Some(3e-4));
        assert_eq!(parse_number("-1.2E+2"), Some(-120.0));

        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("1,5"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("1e400"), None);
    }

    #[test]
    fn test_parse_fields_success() {
        let record = parse_fields(&full_fields("100.0")).unwrap();
        assert_eq!(record.amount(), 100.0);
        assert!(record.values()[..28].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_parse_fields_missing() {
        let full = full_fields("1");
        let fields: FieldValues = full
            .in_schema_order()
            .into_iter()
            .filter(|(name, _)| *name != "V7")
            .collect();
        let err = parse_fields(&fields).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingField {
                field: "V7".to_string()
            }
        );
    }

    #[test]
    fn test_parse_fields_reports_first_bad_field() {
        let mut fields = full_fields("oops");
        fields.insert("V12", "x");
        let err = parse_fields(&fields).unwrap_err();
        assert_eq!(
            err,
            ParseError::NonNumericField {
                field: "V12".to_string(),
                row: None,
                value: "x".to_string(),
            }
        );
    }

    #[test]
    fn test_pasted_row_positional() {
        let row = (1..=28)
            .map(|i| i.to_string())
            .chain(std::iter::once("50.0".to_string()))
            .collect::<Vec<_>>()
            .join(",");
        let record = parse_pasted_row(&row).unwrap();

        for i in 1..=28 {
            assert_eq!(record.get(&format!("V{i}")), Some(i as f64));
        }
        assert_eq!(record.get("Amount"), Some(50.0));
    }

    #[test]
    fn test_pasted_row_strips_newlines_and_spaces() {
        let row = format!("{},\n 12.5 \r\n", vec!["1"; 28].join(" ,"));
        let record = parse_pasted_row(&row).unwrap();
        assert_eq!(record.amount(), 12.5);
    }

    #[test]
    fn test_pasted_row_wrong_count() {
        for n in [28, 30] {
            let row = vec!["1"; n].join(",");
            let err = parse_pasted_row(&row).unwrap_err();
            assert_eq!(
                err,
                ParseError::WrongFieldCount {
                    expected: 29,
                    actual: n
                }
            );
        }
    }

    #[test]
    fn test_pasted_row_non_numeric() {
        let mut tokens = vec!["1"; 29];
        tokens[3] = "four";
        let err = parse_pasted_row(&tokens.join(",")).unwrap_err();
        assert!(matches!(err, ParseError::NonNumericField { ref field, row: None, .. } if field == "V4"));
    }

    #[test]
    fn test_autofill_keeps_raw_strings() {
        let mut tokens = vec!["0"; 29];
        tokens[28] = "not-a-number";
        let fields = autofill(&tokens.join(",")).unwrap();
        assert_eq!(fields.len(), 29);
        assert_eq!(fields.get("Amount"), Some("not-a-number"));
    }

    #[test]
    fn test_parse_table_reordered_with_extra() {
        let mut headers = vec!["Amount".to_string()];
        headers.extend((1..=28).map(|i| format!("V{i}")));
        headers.push("ExtraCol".to_string());

        let mut row = vec!["75.5".to_string()];
        row.extend((1..=28).map(|i| i.to_string()));
        row.push("note".to_string());

        let table = Table::new(headers, vec![row]).unwrap();
        let records = parse_table(&table).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount(), 75.5);
        assert_eq!(records[0].get("V1"), Some(1.0));
        assert_eq!(records[0].get("V28"), Some(28.0));
    }

    #[test]
    fn test_parse_table_missing_columns() {
        for absent in FeatureSchema::column_order() {
            let headers: Vec<String> = header_with(&["Time"], &["Class"])
                .into_iter()
                .filter(|h| h != absent)
                .collect();
            let table = Table::new(headers, vec![]).unwrap();
            let err = parse_table(&table).unwrap_err();
            assert_eq!(
                err,
                ParseError::MissingColumns {
                    missing: vec![absent.to_string()]
                }
            );
        }
    }

    #[test]
    fn test_parse_table_aborts_on_bad_cell() {
        let headers = header_with(&[], &[]);
        let good = vec!["1".to_string(); 29];
        let mut bad = good.clone();
        bad[28] = "".to_string();
        let table = Table::new(headers, vec![good.clone(), bad, good]).unwrap();

        let err = parse_table(&table).unwrap_err();
        assert_eq!(
            err,
            ParseError::NonNumericField {
                field: "Amount".to_string(),
                row: Some(1),
                value: String::new(),
            }
        );
    }

    #[test]
    fn test_rowwise_skips_bad_rows() {
        let headers = header_with(&[], &[]);
        let good = vec!["1".to_string(); 29];
        let mut bad = good.clone();
        bad[0] = "n/a".to_string();
        let table = Table::new(headers, vec![good.clone(), bad, good]).unwrap();

        let outcome = parse_batch(&table, BatchErrorMode::PerRow).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.row_indices, vec![0, 2]);
        assert_eq!(outcome.rejected.len(), 1);
        assert!(matches!(
            outcome.rejected[0],
            ParseError::NonNumericField { row: Some(1), .. }
        ));

        assert!(parse_batch(&table, BatchErrorMode::Abort).is_err());
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new(header_with(&[], &[]), vec![]).unwrap();
        assert!(parse_table(&table).unwrap().is_empty());
    }
}
