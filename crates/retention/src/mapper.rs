//! Probability to Tier Mapping

use crate::thresholds::RiskThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Churn risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Tier for a probability under the given thresholds
    pub fn from_probability(probability: f64, thresholds: &RiskThresholds) -> Self {
        let p = probability.clamp(0.0, 1.0);
        if p > thresholds.high {
            RiskTier::High
        } else if p > thresholds.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }

    /// One-line summary shown above the action list
    pub fn headline(&self) -> &'static str {
        match self {
            RiskTier::High => "Immediate action required",
            RiskTier::Medium => "Proactive retention",
            RiskTier::Low => "Low risk",
        }
    }

    /// Retention playbook, in the order the steps should be taken
    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            RiskTier::High => &[
                "Call customer within 24 hours",
                "Offer 25% discount + free premium",
                "Send personalized retention gift",
                "Priority support escalation",
            ],
            RiskTier::Medium => &[
                "Send targeted retention email",
                "Double rewards points offer",
                "Schedule satisfaction call",
                "Recommend product upgrade",
            ],
            RiskTier::Low => &[
                "Continue normal service",
                "Monitor quarterly",
                "Standard engagement cadence",
            ],
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scored customer: probability, tier and what to do about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Churn probability, clamped to [0, 1]
    pub probability: f64,
    pub tier: RiskTier,
    pub headline: String,
    pub actions: Vec<String>,
}

/// Classify with the default 0.6 / 0.4 thresholds
pub fn classify(probability: f64) -> RiskAssessment {
    classify_with(probability, &RiskThresholds::default())
}

/// Classify with explicit thresholds
pub fn classify_with(probability: f64, thresholds: &RiskThresholds) -> RiskAssessment {
    let tier = RiskTier::from_probability(probability, thresholds);
    debug!(probability, tier = %tier, "Classified churn probability");

    RiskAssessment {
        probability: probability.clamp(0.0, 1.0),
        tier,
        headline: tier.headline().to_string(),
        actions: tier.actions().iter().map(|a| a.to_string()).collect(),
    }
}
