//! Validation Error Types

use thiserror::Error;

/// Errors during data validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Value not in a closed set of allowed values
    #[error("{field} value {value} is not one of {allowed:?}")]
    NotAllowed {
        field: &'static str,
        value: i64,
        allowed: &'static [i64],
    },

    /// Vector length does not match the fitted width
    #[error("Dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl ValidationError {
    /// Name of the offending field, when the error concerns one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::OutOfRange { field, .. } | ValidationError::NotAllowed { field, .. } => {
                Some(*field)
            }
            _ => None,
        }
    }
}
