//! Customer Record Validator

use crate::error::ValidationError;
use feature_engine::CustomerRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PRODUCT_COUNTS: &[i64] = &[1, 2, 3, 4];
const FLAG_VALUES: &[i64] = &[0, 1];

/// Nominal field domains
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Credit score range
    pub credit_score_range: (f64, f64),
    /// Age range (years)
    pub age_range: (f64, f64),
    /// Tenure range (years)
    pub tenure_range: (f64, f64),
    /// Balance range
    pub balance_range: (f64, f64),
    /// Estimated salary range
    pub salary_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            credit_score_range: (300.0, 850.0),
            age_range: (18.0, 80.0),
            tenure_range: (0.0, 10.0),
            balance_range: (0.0, f64::MAX),
            salary_range: (0.0, f64::MAX),
        }
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(fields_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            fields_checked,
        }
    }

    /// Create an invalid result with errors
    pub fn invalid(errors: Vec<ValidationError>, fields_checked: usize) -> Self {
        Self {
            valid: false,
            errors,
            fields_checked,
        }
    }

    /// Errors on fields with a closed set of values (product count, flags).
    ///
    /// These cannot be scored meaningfully, unlike a slightly unusual age.
    pub fn closed_domain_errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors
            .iter()
            .filter(|e| matches!(e, ValidationError::NotAllowed { .. }))
    }
}

/// Range checker for customer records
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if value.is_nan() || value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate membership in a closed set
    pub fn validate_one_of(
        &self,
        field: &'static str,
        value: i64,
        allowed: &'static [i64],
    ) -> Result<(), ValidationError> {
        if allowed.contains(&value) {
            Ok(())
        } else {
            Err(ValidationError::NotAllowed {
                field,
                value,
                allowed,
            })
        }
    }

    /// Check every field of a record, collecting all failures
    pub fn validate(&self, record: &CustomerRecord) -> ValidationResult {
        let checks = [
            self.validate_range(
                "CreditScore",
                record.credit_score as f64,
                self.config.credit_score_range,
            ),
            self.validate_range("Age", record.age as f64, self.config.age_range),
            self.validate_range("Tenure", record.tenure as f64, self.config.tenure_range),
            self.validate_range("Balance", record.balance, self.config.balance_range),
            self.validate_range(
                "EstimatedSalary",
                record.estimated_salary,
                self.config.salary_range,
            ),
            self.validate_one_of(
                "NumOfProducts",
                record.num_of_products as i64,
                PRODUCT_COUNTS,
            ),
            self.validate_one_of("HasCrCard", record.has_cr_card as i64, FLAG_VALUES),
            self.validate_one_of(
                "IsActiveMember",
                record.is_active_member as i64,
                FLAG_VALUES,
            ),
        ];

        let fields_checked = checks.len();
        let errors: Vec<ValidationError> = checks.into_iter().filter_map(Result::err).collect();

        if errors.is_empty() {
            ValidationResult::valid(fields_checked)
        } else {
            debug!(count = errors.len(), "Record failed validation");
            ValidationResult::invalid(errors, fields_checked)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
