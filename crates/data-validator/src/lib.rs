//! Data Validation and Scaling
//!
//! Provides nominal range checks for customer records and the fitted
//! standard scaler applied before inference.

mod error;
mod scaler;
mod validator;

pub use error::ValidationError;
pub use scaler::StandardScaler;
pub use validator::{Validator, ValidationConfig, ValidationResult};
