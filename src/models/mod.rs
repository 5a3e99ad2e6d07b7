//! Classifier loading and scoring

pub mod adapter;
pub mod inference;
pub mod loader;

pub use adapter::{Classifier, FeatureMatrix, ScoringAdapter};
pub use inference::OnnxClassifier;
pub use loader::ModelLoader;
