//! Risk Thresholds

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Threshold configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("Thresholds must satisfy 0 <= low <= medium < high <= 1, got low={low}, medium={medium}, high={high}")]
    Unordered { low: f64, medium: f64, high: f64 },
}

/// Probability cut-offs between tiers.
///
/// `p > high` is HIGH, `medium < p <= high` is MEDIUM, anything else is LOW.
/// `low` is the floor of the LOW band and is kept for display.
/// Keys left out of a serialized table keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl RiskThresholds {
    pub const HIGH: f64 = 0.6;
    pub const MEDIUM: f64 = 0.4;
    pub const LOW: f64 = 0.0;

    /// Check ordering and bounds
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let ordered = 0.0 <= self.low
            && self.low <= self.medium
            && self.medium < self.high
            && self.high <= 1.0;
        if ordered {
            Ok(())
        } else {
            Err(ThresholdError::Unordered {
                low: self.low,
                medium: self.medium,
                high: self.high,
            })
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: Self::HIGH,
            medium: Self::MEDIUM,
            low: Self::LOW,
        }
    }
}
