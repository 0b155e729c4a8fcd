//! Fixed Age Buckets

use crate::FeatureError;
use serde::{Deserialize, Serialize};

/// Youngest and oldest ages seen in the training data
pub const TRAINING_AGE_RANGE: (f64, f64) = (18.0, 92.0);

/// Number of AgeGroup buckets
pub const AGE_GROUPS: usize = 5;

/// Bin edges recorded when the model was trained.
///
/// Intervals are right-closed, `(edges[i], edges[i + 1]]`, with the lowest
/// edge nudged down so the training minimum falls in bucket 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBins {
    edges: Vec<f64>,
}

impl AgeBins {
    /// Use recorded edges verbatim
    pub fn from_edges(edges: Vec<f64>) -> Result<Self, FeatureError> {
        let bins = Self { edges };
        bins.check()?;
        Ok(bins)
    }

    /// Equal-width edges over `[min, max]`, laid out the way they were at training time
    pub fn equal_width(min: f64, max: f64, bins: usize) -> Result<Self, FeatureError> {
        if bins == 0 || !(max > min) {
            return Err(FeatureError::InvalidBins(format!(
                "cannot split [{min}, {max}] into {bins} bins"
            )));
        }
        let width = (max - min) / bins as f64;
        let mut edges: Vec<f64> = (0..=bins).map(|i| min + width * i as f64).collect();
        edges[0] -= (max - min) * 0.001;
        edges[bins] = max;
        Ok(Self { edges })
    }

    /// Edges covering the training age range
    pub fn training_default() -> Self {
        let (min, max) = TRAINING_AGE_RANGE;
        Self::equal_width(min, max, AGE_GROUPS).unwrap_or_else(|_| Self {
            edges: vec![min, max],
        })
    }

    /// Validate edge count and ordering
    pub fn check(&self) -> Result<(), FeatureError> {
        if self.edges.len() < 2 {
            return Err(FeatureError::InvalidBins(format!(
                "need at least 2 edges, got {}",
                self.edges.len()
            )));
        }
        if self.edges.iter().any(|e| !e.is_finite()) {
            return Err(FeatureError::InvalidBins("edges must be finite".to_string()));
        }
        if !self.edges.windows(2).all(|w| w[0] < w[1]) {
            return Err(FeatureError::InvalidBins(
                "edges must be strictly increasing".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Bucket label for an age, or `None` when it falls outside the edges
    pub fn bucket(&self, age: f64) -> Option<u8> {
        let (first, last) = (*self.edges.first()?, *self.edges.last()?);
        if !(age > first && age <= last) {
            return None;
        }
        self.edges[1..]
            .iter()
            .position(|&upper| age <= upper)
            .map(|idx| idx as u8)
    }
}

impl Default for AgeBins {
    fn default() -> Self {
        Self::training_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_training_default_edges() {
        let bins = AgeBins::training_default();
        assert_eq!(bins.len(), 5);
        let edges = bins.edges();
        assert!((edges[0] - 17.926).abs() < 1e-9);
        assert!((edges[1] - 32.8).abs() < 1e-9);
        assert!((edges[5] - 92.0).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_labels() {
        let bins = AgeBins::training_default();
        assert_eq!(bins.bucket(18.0), Some(0));
        assert_eq!(bins.bucket(32.0), Some(0));
        assert_eq!(bins.bucket(33.0), Some(1));
        assert_eq!(bins.bucket(42.0), Some(1));
        assert_eq!(bins.bucket(50.0), Some(2));
        assert_eq!(bins.bucket(70.0), Some(3));
        assert_eq!(bins.bucket(92.0), Some(4));
    }

    #[test]
    fn test_bucket_outside_edges() {
        let bins = AgeBins::training_default();
        assert_eq!(bins.bucket(10.0), None);
        assert_eq!(bins.bucket(93.0), None);
        assert_eq!(bins.bucket(f64::NAN), None);
    }

    #[test]
    fn test_rejects_bad_edges() {
        assert!(AgeBins::from_edges(vec![18.0]).is_err());
        assert!(AgeBins::from_edges(vec![18.0, 30.0, 25.0]).is_err());
        assert!(AgeBins::from_edges(vec![18.0, f64::INFINITY]).is_err());
        assert!(AgeBins::equal_width(40.0, 40.0, 5).is_err());
        assert!(AgeBins::equal_width(18.0, 80.0, 0).is_err());
    }

    proptest! {
        #[test]
        fn prop_bucket_is_monotonic(a in 18.0f64..92.0, b in 18.0f64..92.0) {
            let bins = AgeBins::training_default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(bins.bucket(lo).unwrap() <= bins.bucket(hi).unwrap());
        }

        #[test]
        fn prop_bucket_in_range(age in 18.0f64..=92.0) {
            let bucket = AgeBins::training_default().bucket(age).unwrap();
            prop_assert!((bucket as usize) < AGE_GROUPS);
        }
    }
}
