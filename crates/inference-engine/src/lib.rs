//! Churn Inference Engine
//!
//! Loads the serialized model bundle once and turns customer records into
//! churn probabilities.

mod bundle;
mod engine;
mod model;

pub use bundle::{BundleFile, BundleMetadata, ModelBundle};
pub use engine::InferenceEngine;
pub use model::{
    Activation, DenseLayer, DenseNetwork, ModelSpec, NetworkError, OnnxModel, ScoringModel,
};

use feature_engine::FeatureError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors during bundle loading and inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model artifact not found: {}", .0.display())]
    ArtifactMissing(PathBuf),
    #[error("Model artifact {} is unreadable: {reason}", .path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },
    #[error("Unknown category for {field}: {value:?}")]
    UnknownCategory { field: &'static str, value: String },
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("Model produced probability {0} outside [0, 1]")]
    OutOfRangeProbability(f64),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

impl InferenceError {
    /// Stable identifier for callers that render or count errors
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::ArtifactMissing(_) | InferenceError::ArtifactCorrupt { .. } => {
                "artifact_missing"
            }
            InferenceError::UnknownCategory { .. } => "unknown_category",
            InferenceError::SchemaMismatch(_) | InferenceError::InvalidInputShape { .. } => {
                "schema_mismatch"
            }
            InferenceError::OutOfRangeProbability(_) => "out_of_range_probability",
            InferenceError::InferenceFailed(_) => "inference_failed",
        }
    }

    /// Whether the caller's input caused the failure
    pub fn is_input_error(&self) -> bool {
        matches!(self, InferenceError::UnknownCategory { .. })
    }
}

impl From<FeatureError> for InferenceError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::UnknownCategory { field, value } => {
                InferenceError::UnknownCategory { field, value }
            }
            FeatureError::MissingColumn(name) => InferenceError::SchemaMismatch(format!(
                "feature {name:?} is not produced by feature engineering"
            )),
            FeatureError::InvalidBins(reason) => InferenceError::SchemaMismatch(reason),
        }
    }
}
