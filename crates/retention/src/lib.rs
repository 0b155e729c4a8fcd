//! Retention Decision Mapping
//!
//! Maps churn probabilities to risk tiers and the retention playbook for
//! each tier.

mod mapper;
mod thresholds;

pub use mapper::{classify, classify_with, RiskAssessment, RiskTier};
pub use thresholds::{RiskThresholds, ThresholdError};
