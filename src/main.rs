//! Card Fraud Screen - Command Line Shell
//!
//! Collects transactions as typed fields, a pasted row or a CSV batch, scores
//! them with the ONNX classifier and prints the verdict or the flagged rows.

use anyhow::{Context, Result};
use card_fraud_screen::{
    config::AppConfig, parse_batch, parse_fields, parse_pasted_row, BatchErrorMode,
    BatchReporter, FeatureSchema, FieldValues, FilteredReport, OnnxClassifier, ParseError,
    PredictionResult, ScoringAdapter, Table, ValidatedRecord,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "fraud-screen", version, about = "Screen card transactions for fraud")]
struct Cli {
    /// Configuration file (defaults to config/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the feature columns in classifier order
    Schema,
    /// Score one transaction given as FIELD=VALUE pairs
    Fields {
        #[arg(value_parser = parse_assignment, required = true)]
        values: Vec<(String, String)>,
    },
    /// Score one transaction pasted as 29 comma-separated values
    Row {
        #[arg(allow_hyphen_values = true)]
        text: String,
    },
    /// Show how a pasted row maps onto the fields without scoring it
    Autofill {
        #[arg(allow_hyphen_values = true)]
        text: String,
    },
    /// Score every row of a CSV file and list the flagged ones
    Scan {
        file: PathBuf,
        /// Skip rows with non-numeric cells instead of rejecting the file
        #[arg(long)]
        per_row: bool,
        /// Write the flagged rows to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got {s:?}"))?;
    let field = field.trim();
    if FeatureSchema::position(field).is_none() {
        return Err(format!("unknown field {field:?}"));
    }
    Ok((field.to_string(), value.to_string()))
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => AppConfig::load()?,
    };

    init_logging(&config)?;

    match cli.command {
        Command::Schema => {
            for (i, name) in FeatureSchema::column_order().iter().enumerate() {
                println!("{:>2}  {}", i + 1, name);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Autofill { text } => match autofill_lines(&text) {
            Ok(lines) => {
                for line in lines {
                    println!("{line}");
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => Ok(invalid_input(e)),
        },
        Command::Fields { values } => {
            let fields: FieldValues = values.into_iter().collect();
            let adapter = load_adapter(&config)?;
            score_single(&adapter, parse_fields(&fields))
        }
        Command::Row { text } => {
            let adapter = load_adapter(&config)?;
            score_single(&adapter, parse_pasted_row(&text))
        }
        Command::Scan {
            file,
            per_row,
            export,
            json,
        } => {
            let mode = if per_row {
                BatchErrorMode::PerRow
            } else {
                config.batch.on_bad_row
            };
            let adapter = load_adapter(&config)?;
            scan(&adapter, &config, &file, mode, export, json)
        }
    }
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(format!(
            "card_fraud_screen={},fraud_screen={}",
            config.logging.level, config.logging.level
        ))
    })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn invalid_input(e: ParseError) -> ExitCode {
    eprintln!("Invalid input: {e}");
    ExitCode::from(2)
}

/// `FIELD = VALUE` lines for a pasted row, in schema order.
fn autofill_lines(text: &str) -> std::result::Result<Vec<String>, ParseError> {
    let fields = FieldValues::from_pasted_row(text)?;
    Ok(fields
        .in_schema_order()
        .into_iter()
        .map(|(name, value)| format!("{name} = {value}"))
        .collect())
}

fn load_adapter(config: &AppConfig) -> Result<ScoringAdapter> {
    let classifier = OnnxClassifier::load(&config.model)
        .with_context(|| format!("Failed to load classifier from {}", config.model.path))?;
    Ok(ScoringAdapter::new(Arc::new(classifier)))
}

fn score_single(
    adapter: &ScoringAdapter,
    parsed: std::result::Result<ValidatedRecord, ParseError>,
) -> Result<ExitCode> {
    let record = match parsed {
        Ok(record) => record,
        Err(e) => return Ok(invalid_input(e)),
    };

    let start_time = Instant::now();
    let verdict = adapter.score_one(&record)?;
    info!(
        classifier = %adapter.classifier_name(),
        verdict = %verdict,
        amount = record.amount(),
        processing_time_us = start_time.elapsed().as_micros(),
        "Transaction scored"
    );

    match verdict {
        PredictionResult::Fraudulent => println!("This transaction appears FRAUDULENT."),
        PredictionResult::Legitimate => println!("This transaction appears safe."),
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct ScanOutput<'a> {
    report: &'a FilteredReport,
    rejected: &'a [ParseError],
}

fn scan(
    adapter: &ScoringAdapter,
    config: &AppConfig,
    file: &Path,
    mode: BatchErrorMode,
    export: Option<PathBuf>,
    json: bool,
) -> Result<ExitCode> {
    let start_time = Instant::now();

    let parsed = Table::from_path(file).and_then(|table| {
        let outcome = parse_batch(&table, mode)?;
        Ok((table, outcome))
    });
    let (table, outcome) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error reading file: {e}");
            return Ok(ExitCode::from(2));
        }
    };

    for rejected in &outcome.rejected {
        warn!(error = %rejected, "Row rejected");
    }

    let labels = adapter.score(&outcome.records)?;
    let reporter = BatchReporter::new(config.batch.label_column.clone());
    let report = reporter.filter_rows(&table, &outcome.row_indices, &labels)?;

    info!(
        file = %file.display(),
        rows = table.row_count(),
        scored = report.total_rows,
        rejected = outcome.rejected.len(),
        flagged = report.len(),
        processing_time_ms = start_time.elapsed().as_millis(),
        "Batch scored"
    );

    if let Some(path) = export {
        let out = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        report
            .write_csv(BufWriter::new(out))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), rows = report.len(), "Report exported");
    }

    if json {
        let output = ScanOutput {
            report: &report,
            rejected: &outcome.rejected,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if report.is_empty() {
        println!("No fraudulent transactions found ({} scored).", report.total_rows);
    } else {
        println!("{}:", report.summary());
        println!("{}", report.to_display_table());
    }

    if !outcome.rejected.is_empty() {
        eprintln!("{} row(s) skipped because of invalid values.", outcome.rejected.len());
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEGATIVE_LEADING_ROW: &str = "-1.3598,-0.0728,2.5363,1.3782,-0.3383,0.4624,0.2396,\
0.0987,0.3638,0.0908,-0.5516,-0.6178,-0.9914,-0.3112,1.4682,-0.4704,0.2080,0.0258,0.4040,\
0.2514,-0.0183,0.2778,-0.1105,0.0669,0.1285,-0.1891,0.1336,-0.0211,149.62";

    #[test]
    fn test_row_accepts_leading_negative_value() {
        let cli = Cli::try_parse_from(["fraud-screen", "row", NEGATIVE_LEADING_ROW]).unwrap();
        match cli.command {
            Command::Row { text } => assert_eq!(text, NEGATIVE_LEADING_ROW),
            _ => panic!("expected the row subcommand"),
        }
    }

    #[test]
    fn test_autofill_accepts_leading_negative_value() {
        let cli =
            Cli::try_parse_from(["fraud-screen", "autofill", NEGATIVE_LEADING_ROW]).unwrap();
        match cli.command {
            Command::Autofill { text } => assert_eq!(text, NEGATIVE_LEADING_ROW),
            _ => panic!("expected the autofill subcommand"),
        }
    }

    #[test]
    fn test_autofill_lines_follow_schema_order() {
        let lines = autofill_lines(NEGATIVE_LEADING_ROW).unwrap();
        assert_eq!(lines.len(), FeatureSchema::len());
        assert_eq!(lines[0], "V1 = -1.3598");
        assert_eq!(lines[28], "Amount = 149.62");
    }

    #[test]
    fn test_autofill_wrong_count_is_invalid_input() {
        let err = autofill_lines("1,2,3").unwrap_err();
        assert_eq!(
            err,
            ParseError::WrongFieldCount {
                expected: 29,
                actual: 3
            }
        );
    }
}
