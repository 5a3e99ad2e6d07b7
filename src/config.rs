//! Configuration management for the screening front-end

use crate::parser::BatchErrorMode;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Classifier artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX model file
    #[serde(default = "default_model_path")]
    pub path: String,
    /// Input tensor name; the first graph input when unset
    #[serde(default)]
    pub input_name: Option<String>,
    /// Output holding integer class labels
    #[serde(default = "default_label_output")]
    pub label_output: String,
    /// Output holding class probabilities, used when no label output exists
    #[serde(default = "default_probability_output")]
    pub probability_output: String,
    /// Fraud probability at or above which a record is flagged
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Number of intra-op threads for ONNX inference
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
}

fn default_model_path() -> String {
    "models/credit_card_model.onnx".to_string()
}

fn default_label_output() -> String {
    "label".to_string()
}

fn default_probability_output() -> String {
    "probabilities".to_string()
}

fn default_threshold() -> f64 {
    0.5
}

fn default_intra_threads() -> usize {
    1
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            input_name: None,
            label_output: default_label_output(),
            probability_output: default_probability_output(),
            threshold: default_threshold(),
            intra_threads: default_intra_threads(),
        }
    }
}

/// Batch scoring configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Reaction to a row with a non-numeric cell
    #[serde(default)]
    pub on_bad_row: BatchErrorMode,
    /// Name of the column appended to reports
    #[serde(default = "default_label_column")]
    pub label_column: String,
}

fn default_label_column() -> String {
    "Prediction".to_string()
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            on_bad_row: BatchErrorMode::Abort,
            label_column: default_label_column(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load the default configuration file, falling back to built-in
    /// defaults when it does not exist.
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_path(DEFAULT_CONFIG_PATH)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
