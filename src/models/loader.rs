//! ONNX model loader

use crate::config::ModelConfig;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::{info, warn};

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name (file stem)
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the model
    pub input_name: String,
    /// Declared feature width of the input, if static
    pub input_width: Option<usize>,
    /// Output holding integer labels
    pub label_output: Option<String>,
    /// Output holding class probabilities
    pub probability_output: Option<String>,
}

/// Loader for the classifier artifact
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    intra_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(intra_threads: usize) -> Self {
        Self {
            intra_threads: intra_threads.max(1),
        }
    }

    /// Load the model described by the configuration
    pub fn load(&self, config: &ModelConfig) -> Result<LoadedModel> {
        let path = Path::new(&config.path);
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model")
            .to_string();

        info!(model = %name, path = %path.display(), threads = self.intra_threads, "Loading ONNX model");

        if !path.exists() {
            anyhow::bail!("Model file not found: {}", path.display());
        }

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.intra_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input = match &config.input_name {
            Some(wanted) => session
                .inputs
                .iter()
                .find(|i| &i.name == wanted)
                .with_context(|| format!("Model has no input named {wanted:?}"))?,
            None => session.inputs.first().context("Model declares no inputs")?,
        };
        let input_name = input.name.clone();
        let input_width = input
            .input_type
            .tensor_shape()
            .and_then(|shape| shape.last().copied())
            .and_then(|dim| usize::try_from(dim).ok());

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let label_output = resolve_output(&output_names, &config.label_output, "label");
        let probability_output =
            resolve_output(&output_names, &config.probability_output, "prob");

        if label_output.is_none() && probability_output.is_none() {
            anyhow::bail!(
                "Model {} exposes neither a label nor a probability output (outputs: {:?})",
                name,
                output_names
            );
        }
        if label_output.is_none() {
            warn!(model = %name, threshold = config.threshold, "No label output, thresholding probabilities");
        }

        info!(
            model = %name,
            input = %input_name,
            width = ?input_width,
            label_output = ?label_output,
            probability_output = ?probability_output,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name,
            session,
            input_name,
            input_width,
            label_output,
            probability_output,
        })
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Exact configured name first, then the first output containing `hint`.
fn resolve_output(outputs: &[String], preferred: &str, hint: &str) -> Option<String> {
    outputs
        .iter()
        .find(|o| o.as_str() == preferred)
        .or_else(|| outputs.iter().find(|o| o.to_lowercase().contains(hint)))
        .cloned()
}
