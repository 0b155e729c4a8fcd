//! Categorical Encoding

use crate::FeatureError;
use serde::{Deserialize, Serialize};

/// Label encoder fitted on a categorical column.
///
/// Codes are positions in the sorted class list, so `["France", "Germany",
/// "Spain"]` encodes France as 0 and Spain as 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit an encoder on observed values. Duplicates are collapsed.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = values.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Fitted classes in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Encode a category, failing on values the encoder never saw
    pub fn transform(&self, field: &'static str, value: &str) -> Result<u32, FeatureError> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .map(|idx| idx as u32)
            .map_err(|_| FeatureError::UnknownCategory {
                field,
                value: value.to_string(),
            })
    }

    /// Whether the stored classes are sorted and unique, as `transform` requires
    pub fn is_well_formed(&self) -> bool {
        self.classes.windows(2).all(|w| w[0] < w[1])
    }
}

/// Fixed gender mapping: Female -> 0, Male -> 1.
pub fn gender_code(value: &str) -> Result<u32, FeatureError> {
    match value {
        "Female" => Ok(0),
        "Male" => Ok(1),
        other => Err(FeatureError::UnknownCategory {
            field: "Gender",
            value: other.to_string(),
        }),
    }
}
