//! Type definitions for the screening pipeline

pub mod prediction;
pub mod record;
pub mod table;

pub use prediction::PredictionResult;
pub use record::{FieldValues, RawInput, ValidatedRecord};
pub use table::Table;
