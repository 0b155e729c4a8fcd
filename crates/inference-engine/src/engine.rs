//! Inference Engine Implementation

use crate::bundle::ModelBundle;
use crate::InferenceError;
use feature_engine::CustomerRecord;
use retention::{classify_with, RiskAssessment, RiskThresholds};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Scores customer records against a loaded bundle.
///
/// Cloning is cheap: the bundle is shared and never mutated.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    bundle: Arc<ModelBundle>,
    thresholds: RiskThresholds,
}

impl InferenceEngine {
    /// Create an engine around an already loaded bundle
    pub fn new(bundle: Arc<ModelBundle>, thresholds: RiskThresholds) -> Self {
        info!(
            features = bundle.feature_count(),
            high = thresholds.high,
            medium = thresholds.medium,
            "Creating inference engine"
        );
        Self { bundle, thresholds }
    }

    /// Load the bundle from disk and create an engine
    pub fn load<P: AsRef<Path>>(path: P, thresholds: RiskThresholds) -> Result<Self, InferenceError> {
        let bundle = ModelBundle::load(path)?;
        Ok(Self::new(Arc::new(bundle), thresholds))
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Churn probability for one record
    pub fn score(&self, record: &CustomerRecord) -> Result<f64, InferenceError> {
        let start = Instant::now();
        let probability = self.bundle.score(record)?;
        debug!(
            probability,
            latency_us = start.elapsed().as_micros() as u64,
            "Inference complete"
        );
        Ok(probability)
    }

    /// Score and map to a tier with its retention actions
    pub fn assess(&self, record: &CustomerRecord) -> Result<RiskAssessment, InferenceError> {
        let probability = self.score(record)?;
        Ok(classify_with(probability, &self.thresholds))
    }

    /// Score several records independently
    pub fn score_batch(&self, records: &[CustomerRecord]) -> Vec<Result<f64, InferenceError>> {
        records.iter().map(|r| self.score(r)).collect()
    }
}
