//! Feature Frame Assembly

use crate::age_bins::AgeBins;
use crate::encoding::{gender_code, LabelEncoder};
use crate::record::{CustomerRecord, COLUMNS};
use crate::FeatureError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Balance above which an inactive member is flagged
pub const HIGH_BALANCE: f64 = 100_000.0;

/// Features derived from a single record at inference time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DerivedFeatures {
    /// Balance / (NumOfProducts + 1)
    pub balance_per_product: f64,
    /// Age bucket 0..=4, `None` outside the recorded edges
    pub age_group: Option<u8>,
    /// 1 when the member is inactive and holds more than 100k
    pub inactive_high_balance: u8,
}

/// Named columns for one record after engineering and encoding.
///
/// Values are `None` until `fill_missing` runs.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: HashMap<&'static str, Option<f64>>,
}

impl FeatureFrame {
    fn new() -> Self {
        Self {
            columns: HashMap::with_capacity(COLUMNS.len()),
        }
    }

    fn insert(&mut self, name: &'static str, value: Option<f64>) {
        self.columns.insert(name, value);
    }

    /// Raw cell lookup: outer `None` means no such column
    pub fn get(&self, name: &str) -> Option<Option<f64>> {
        self.columns.get(name).copied()
    }

    /// Replace every missing cell with `value`
    pub fn fill_missing(&mut self, value: f64) {
        for cell in self.columns.values_mut() {
            if cell.is_none() {
                *cell = Some(value);
            }
        }
    }

    /// Number of missing cells
    pub fn missing_count(&self) -> usize {
        self.columns.values().filter(|v| v.is_none()).count()
    }

    /// Pick `names` in order. Missing cells become 0.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<f64>, FeatureError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name)
                    .map(|cell| cell.unwrap_or(0.0))
                    .ok_or_else(|| FeatureError::MissingColumn(name.to_string()))
            })
            .collect()
    }
}

/// Turns records into feature frames using the fitted encoder and age edges
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    geography: LabelEncoder,
    age_bins: AgeBins,
}

impl FeatureEngineer {
    /// Create an engineer from fitted artifacts
    pub fn new(geography: LabelEncoder, age_bins: AgeBins) -> Self {
        Self {
            geography,
            age_bins,
        }
    }

    pub fn geography_encoder(&self) -> &LabelEncoder {
        &self.geography
    }

    pub fn age_bins(&self) -> &AgeBins {
        &self.age_bins
    }

    /// Compute the three derived features
    pub fn derive(&self, record: &CustomerRecord) -> DerivedFeatures {
        let balance_per_product = record.balance / (record.num_of_products as f64 + 1.0);
        let age_group = self.age_bins.bucket(record.age as f64);
        let inactive_high_balance =
            u8::from(record.is_active_member == 0 && record.balance > HIGH_BALANCE);

        DerivedFeatures {
            balance_per_product,
            age_group,
            inactive_high_balance,
        }
    }

    /// Build the full named frame: raw fields, codes and derived features.
    ///
    /// Missing cells are filled with 0 before returning.
    pub fn frame(&self, record: &CustomerRecord) -> Result<FeatureFrame, FeatureError> {
        let derived = self.derive(record);
        let geography = self.geography.transform("Geography", &record.geography)?;
        let gender = gender_code(&record.gender)?;

        let mut frame = FeatureFrame::new();
        frame.insert("CreditScore", Some(record.credit_score as f64));
        frame.insert("Geography", Some(geography as f64));
        frame.insert("Gender", Some(gender as f64));
        frame.insert("Age", Some(record.age as f64));
        frame.insert("Tenure", Some(record.tenure as f64));
        frame.insert("Balance", Some(record.balance));
        frame.insert("NumOfProducts", Some(record.num_of_products as f64));
        frame.insert("HasCrCard", Some(record.has_cr_card as f64));
        frame.insert("IsActiveMember", Some(record.is_active_member as f64));
        frame.insert("EstimatedSalary", Some(record.estimated_salary));
        frame.insert("BalancePerProduct", Some(derived.balance_per_product));
        frame.insert("AgeGroup", derived.age_group.map(f64::from));
        frame.insert(
            "InactiveHighBalance",
            Some(derived.inactive_high_balance as f64),
        );

        let missing = frame.missing_count();
        if missing > 0 {
            debug!(missing, age = record.age, "Filling missing feature cells with 0");
        }
        frame.fill_missing(0.0);

        Ok(frame)
    }
}
