//! Batch reporting: the flagged subset of an uploaded table.

use crate::error::ScoringError;
use crate::types::prediction::PredictionResult;
use crate::types::table::Table;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// Default name of the appended label column
pub const DEFAULT_LABEL_COLUMN: &str = "Prediction";

/// One flagged input row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedRow {
    /// 0-based index of the row in the uploaded table
    pub row_index: usize,
    /// Original cells with the label in the label column
    pub cells: Vec<String>,
}

/// Rows labeled fraudulent, in original order, with a label column.
///
/// The label column is appended unless the table already has one of that
/// name, in which case its cells are replaced.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredReport {
    pub headers: Vec<String>,
    pub rows: Vec<FlaggedRow>,
    /// Number of rows that were scored
    pub total_rows: usize,
    pub generated_at: DateTime<Utc>,
}

impl FilteredReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Short "flagged of total" line for display.
    pub fn summary(&self) -> String {
        format!(
            "{} of {} transactions flagged as fraudulent",
            self.rows.len(),
            self.total_rows
        )
    }

    /// Export the report as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(&row.cells)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Render for terminal display.
    pub fn to_display_table(&self) -> comfy_table::Table {
        let mut table = comfy_table::Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.set_header(std::iter::once("row").chain(self.headers.iter().map(String::as_str)));
        for row in &self.rows {
            table.add_row(
                std::iter::once(row.row_index.to_string()).chain(row.cells.iter().cloned()),
            );
        }
        table
    }
}

/// Builds filtered reports with a configurable label column.
#[derive(Debug, Clone)]
pub struct BatchReporter {
    label_column: String,
}

impl BatchReporter {
    pub fn new(label_column: impl Into<String>) -> Self {
        Self {
            label_column: label_column.into(),
        }
    }

    /// Keep the fraudulent rows of `table`; `labels` align with its rows.
    pub fn filter_flagged(
        &self,
        table: &Table,
        labels: &[PredictionResult],
    ) -> Result<FilteredReport, ScoringError> {
        if labels.len() != table.row_count() {
            return Err(ScoringError::LengthMismatch {
                expected: table.row_count(),
                actual: labels.len(),
            });
        }
        let indices: Vec<usize> = (0..table.row_count()).collect();
        self.filter_rows(table, &indices, labels)
    }

    /// Like [`filter_flagged`](Self::filter_flagged) for a subset of rows:
    /// `labels[i]` is the verdict for row `row_indices[i]`.
    pub fn filter_rows(
        &self,
        table: &Table,
        row_indices: &[usize],
        labels: &[PredictionResult],
    ) -> Result<FilteredReport, ScoringError> {
        if labels.len() != row_indices.len() {
            return Err(ScoringError::LengthMismatch {
                expected: row_indices.len(),
                actual: labels.len(),
            });
        }

        let existing = table.column_index(&self.label_column);
        let mut headers = table.headers().to_vec();
        if existing.is_none() {
            headers.push(self.label_column.clone());
        }

        let mut rows = Vec::new();
        for (&row_index, label) in row_indices.iter().zip(labels) {
            if !label.is_fraudulent() {
                continue;
            }
            let source = table
                .rows()
                .get(row_index)
                .ok_or(ScoringError::LengthMismatch {
                    expected: table.row_count(),
                    actual: row_index + 1,
                })?;
            let mut cells = source.clone();
            let label = label.label().to_string();
            match existing {
                Some(idx) if idx < cells.len() => cells[idx] = label,
                _ => cells.push(label),
            }
            rows.push(FlaggedRow { row_index, cells });
        }

        Ok(FilteredReport {
            headers,
            rows,
            total_rows: row_indices.len(),
            generated_at: Utc::now(),
        })
    }
}

impl Default for BatchReporter {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_COLUMN)
    }
}

/// Filter with the default label column.
pub fn filter_flagged(
    table: &Table,
    labels: &[PredictionResult],
) -> Result<FilteredReport, ScoringError> {
    BatchReporter::default().filter_flagged(table, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::prediction::PredictionResult::{Fraudulent as F, Legitimate as L};

    fn table() -> Table {
        Table::from_reader("id,Amount\na,1\nb,2\nc,3\nd,4\n".as_bytes()).unwrap()
    }

    #[test]
    fn test_filter_keeps_flagged_in_order() {
        let report = filter_flagged(&table(), &[F, L, L, F]).unwrap();

        assert_eq!(report.headers, vec!["id", "Amount", "Prediction"]);
        assert_eq!(report.len(), 2);
        assert_eq!(report.rows[0].row_index, 0);
        assert_eq!(report.rows[0].cells, vec!["a", "1", "1"]);
        assert_eq!(report.rows[1].row_index, 3);
        assert_eq!(report.rows[1].cells, vec!["d", "4", "1"]);
        assert_eq!(report.summary(), "2 of 4 transactions flagged as fraudulent");
    }

    #[test]
    fn test_nothing_flagged_is_empty_report() {
        let report = filter_flagged(&table(), &[L, L, L, L]).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.total_rows, 4);
    }

    #[test]
    fn test_length_mismatch() {
        let err = filter_flagged(&table(), &[F, L]).unwrap_err();
        assert_eq!(
            err,
            ScoringError::LengthMismatch {
                expected: 4,
                actual: 2
            }
        );
    }

    #[test]
    fn test_filter_rows_keeps_original_indices() {
        let reporter = BatchReporter::new("Verdict");
        let report = reporter.filter_rows(&table(), &[1, 3], &[F, F]).unwrap();

        assert_eq!(report.headers.last().unwrap(), "Verdict");
        let indices: Vec<usize> = report.rows.iter().map(|r| r.row_index).collect();
        assert_eq!(indices, vec![1, 3]);
        assert_eq!(report.total_rows, 2);
    }

    #[test]
    fn test_existing_label_column_is_overwritten() {
        let table = Table::from_reader("id,Prediction\na,0\nb,0\n".as_bytes()).unwrap();
        let report = filter_flagged(&table, &[F, L]).unwrap();

        assert_eq!(report.headers, vec!["id", "Prediction"]);
        assert_eq!(report.len(), 1);
        assert_eq!(report.rows[0].cells, vec!["a", "1"]);

        let mut out = Vec::new();
        report.write_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,Prediction\na,1\n");
    }

    #[test]
    fn test_other_label_column_name_is_appended() {
        let table = Table::from_reader("id,Prediction\na,0\n".as_bytes()).unwrap();
        let report = BatchReporter::new("Verdict")
            .filter_flagged(&table, &[F])
            .unwrap();

        assert_eq!(report.headers, vec!["id", "Prediction", "Verdict"]);
        assert_eq!(report.rows[0].cells, vec!["a", "0", "1"]);
    }

    #[test]
    fn test_write_csv() {
        let report = filter_flagged(&table(), &[L, F, L, L]).unwrap();
        let mut out = Vec::new();
        report.write_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,Amount,Prediction\nb,2,1\n");
    }

    #[test]
    fn test_display_table() {
        let report = filter_flagged(&table(), &[L, F, L, L]).unwrap();
        let rendered = report.to_display_table().to_string();
        assert!(rendered.contains("Prediction"));
        assert!(rendered.contains('b'));
    }
}
