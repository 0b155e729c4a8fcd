//! Fitted Standard Scaler

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Standardizing transform fitted on training-time feature statistics.
///
/// `transform` computes `(x - mean) / scale` per column. A zero scale is
/// stored for constant training columns and is treated as 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-feature training mean
    mean: Vec<f64>,
    /// Per-feature training standard deviation
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Create a scaler from fitted statistics
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ValidationError> {
        let scaler = Self { mean, scale };
        scaler.check()?;
        Ok(scaler)
    }

    /// Check both vectors agree and hold finite, non-negative statistics
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.mean.len() != self.scale.len() {
            return Err(ValidationError::DimensionMismatch {
                expected: self.mean.len(),
                actual: self.scale.len(),
            });
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(ValidationError::InvalidFormat(
                "scaler mean must be finite".to_string(),
            ));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(ValidationError::InvalidFormat(
                "scaler scale must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of features the scaler was fitted on
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Standardize a feature vector
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ValidationError> {
        if values.len() != self.width() {
            return Err(ValidationError::DimensionMismatch {
                expected: self.width(),
                actual: values.len(),
            });
        }

        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform() {
        let scaler = StandardScaler::new(vec![10.0, 0.0], vec![2.0, 4.0]).unwrap();
        let out = scaler.transform(&[14.0, -2.0]).unwrap();
        assert_eq!(out, vec![2.0, -0.5]);
    }

    #[test]
    fn test_zero_scale_treated_as_one() {
        let scaler = StandardScaler::new(vec![5.0], vec![0.0]).unwrap();
        assert_eq!(scaler.transform(&[7.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let scaler = StandardScaler::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        let err = scaler.transform(&[1.0]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_rejects_inconsistent_statistics() {
        assert!(StandardScaler::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(StandardScaler::new(vec![f64::NAN], vec![1.0]).is_err());
        assert!(StandardScaler::new(vec![0.0], vec![-1.0]).is_err());
    }
}
