use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors produced when a value violates a data-model rule.
///
/// Validation runs before any I/O is attempted, so a `ValidationError`
/// never leaves partial state behind.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("required field `{0}` is missing or blank")]
    MissingField(&'static str),

    #[error("invalid product id {id:?}: {reason}")]
    InvalidProductId { id: String, reason: &'static str },

    #[error("gps coordinates out of range: latitude={latitude}, longitude={longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("transfer {index} is timestamped {timestamp}, before its predecessor at {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        previous: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    #[error("transfer history is empty")]
    EmptyHistory,

    #[error("current location {current:?} does not match expected location {expected:?}")]
    LocationMismatch { current: String, expected: String },
}

/// Result alias for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Reject blank required text fields.
pub(crate) fn require(field: &'static str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_whitespace() {
        assert_eq!(
            require("location", " \t\n"),
            Err(ValidationError::MissingField("location"))
        );
        assert!(require("location", "Farm").is_ok());
    }

    #[test]
    fn display_names_the_field() {
        let err = ValidationError::MissingField("transferredBy");
        assert_eq!(
            err.to_string(),
            "required field `transferredBy` is missing or blank"
        );
    }
}
