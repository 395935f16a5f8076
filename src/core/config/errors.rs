//! Configuration errors and the validation trait implemented by every config type.

use thiserror::Error;

/// Errors raised while validating configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required list or value is empty.
    #[error("'{field}' must not be empty")]
    Empty {
        /// Name of the offending field.
        field: String,
    },

    /// A value lies outside its allowed range.
    #[error("'{field}' must be in {min}..={max}, got {actual}")]
    OutOfRange {
        /// Name of the offending field.
        field: String,
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
        /// The value that was provided.
        actual: i64,
    },

    /// A value is present twice where it must be unique.
    #[error("duplicate {what} '{value}'")]
    Duplicate {
        /// Kind of item that is duplicated.
        what: &'static str,
        /// The duplicated value.
        value: String,
    },

    /// A reference points to something that does not exist.
    #[error("{what} '{value}' is not defined")]
    Undefined {
        /// Kind of item being referenced.
        what: &'static str,
        /// The dangling reference.
        value: String,
    },
}

/// Trait for configuration types that can check their own invariants.
pub trait ConfigValidator {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Helper for the common "field must be in range" check.
pub(crate) fn check_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            actual: value,
        });
    }
    Ok(())
}
