//! Feature Engineering Engine
//!
//! Turns a raw customer record into the named numeric columns the churn model
//! was trained on: derived features, categorical codes and age buckets.

mod age_bins;
mod encoding;
mod features;
mod record;

pub use age_bins::AgeBins;
pub use encoding::{gender_code, LabelEncoder};
pub use features::{DerivedFeatures, FeatureEngineer, FeatureFrame};
pub use record::{CustomerRecord, COLUMNS};

use thiserror::Error;

/// Errors during feature engineering and encoding
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// Categorical value outside the fitted vocabulary
    #[error("Unknown category for {field}: {value:?}")]
    UnknownCategory { field: &'static str, value: String },
    /// Requested column is not produced by feature engineering
    #[error("Column {0:?} is not produced by feature engineering")]
    MissingColumn(String),
    /// Bin edges are unusable
    #[error("Invalid bin edges: {0}")]
    InvalidBins(String),
}
