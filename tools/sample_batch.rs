//! Sample Batch Generator
//!
//! Writes a synthetic CSV of transactions in the classifier's column layout
//! for exercising `fraud-screen scan`.

use anyhow::{Context, Result};
use card_fraud_screen::FeatureSchema;
use clap::Parser;
use rand::Rng;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "sample-batch", about = "Generate a synthetic transaction CSV")]
struct Args {
    /// Number of rows to generate
    #[arg(long, default_value_t = 100)]
    count: u64,
    /// Share of rows generated as suspicious outliers
    #[arg(long, default_value_t = 0.1)]
    fraud_rate: f64,
    /// Share of rows with a corrupted cell, for per-row mode
    #[arg(long, default_value_t = 0.0)]
    corrupt_rate: f64,
    /// Output file (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Transaction row generator for testing
struct RowGenerator<R: Rng> {
    rng: R,
    row_counter: u64,
}

impl<R: Rng> RowGenerator<R> {
    fn new(rng: R) -> Self {
        Self {
            rng,
            row_counter: 0,
        }
    }

    /// Components near zero and an everyday amount
    fn generate_legitimate(&mut self) -> Vec<String> {
        let mut row: Vec<String> = (0..28)
            .map(|_| format!("{:.6}", self.rng.gen_range(-1.5..1.5)))
            .collect();
        row.push(format!("{:.2}", self.rng.gen_range(1.0..250.0)));
        self.finish(row)
    }

    /// Strongly shifted components and a large amount
    fn generate_suspicious(&mut self) -> Vec<String> {
        let mut row: Vec<String> = (0..28)
            .map(|i| {
                let shift = if i % 3 == 0 { -6.0 } else { 3.0 };
                format!("{:.6}", shift + self.rng.gen_range(-2.0..2.0))
            })
            .collect();
        row.push(format!("{:.2}", self.rng.gen_range(1000.0..10000.0)));
        self.finish(row)
    }

    fn corrupt(&mut self, row: &mut [String]) {
        let col = self.rng.gen_range(0..FeatureSchema::len());
        row[col] = "n/a".to_string();
    }

    fn finish(&mut self, mut row: Vec<String>) -> Vec<String> {
        self.row_counter += 1;
        row.push(format!("tx_{:08}", self.row_counter));
        row
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_batch=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.fraud_rate) && (0.0..=1.0).contains(&args.corrupt_rate),
        "rates must lie between 0 and 1"
    );

    info!(
        count = args.count,
        fraud_rate = args.fraud_rate,
        corrupt_rate = args.corrupt_rate,
        "Generating sample batch"
    );

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = csv::Writer::from_writer(sink);

    let mut header: Vec<&str> = FeatureSchema::column_order().to_vec();
    header.push("ExtraCol");
    writer.write_record(&header)?;

    let mut generator = RowGenerator::new(rand::thread_rng());
    let mut rng = rand::thread_rng();
    let mut suspicious_count = 0;
    let mut corrupt_count = 0;

    for _ in 0..args.count {
        let mut row = if rng.gen_bool(args.fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };
        if rng.gen_bool(args.corrupt_rate) {
            corrupt_count += 1;
            generator.corrupt(&mut row);
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;

    info!(
        rows = args.count,
        suspicious = suspicious_count,
        corrupt = corrupt_count,
        "Sample batch written"
    );

    Ok(())
}
