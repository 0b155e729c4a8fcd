//! Customer Record

use serde::{Deserialize, Serialize};

/// Every column feature engineering can produce, raw fields first.
pub const COLUMNS: [&str; 13] = [
    "CreditScore",
    "Geography",
    "Gender",
    "Age",
    "Tenure",
    "Balance",
    "NumOfProducts",
    "HasCrCard",
    "IsActiveMember",
    "EstimatedSalary",
    "BalancePerProduct",
    "AgeGroup",
    "InactiveHighBalance",
];

/// Raw customer profile as submitted for scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerRecord {
    /// Credit score (nominally 300-850)
    pub credit_score: i32,
    /// Country of residence
    pub geography: String,
    /// "Male" or "Female"
    pub gender: String,
    /// Age in years
    pub age: i32,
    /// Years as a customer
    pub tenure: i32,
    /// Account balance
    pub balance: f64,
    /// Number of products held (1-4)
    pub num_of_products: i32,
    /// 1 if the customer holds a credit card
    pub has_cr_card: u8,
    /// 1 if the customer is an active member
    pub is_active_member: u8,
    /// Estimated yearly salary
    pub estimated_salary: f64,
}

impl Default for CustomerRecord {
    fn default() -> Self {
        Self {
            credit_score: 650,
            geography: "France".to_string(),
            gender: "Male".to_string(),
            age: 42,
            tenure: 5,
            balance: 100_000.0,
            num_of_products: 2,
            has_cr_card: 1,
            is_active_member: 1,
            estimated_salary: 100_000.0,
        }
    }
}
