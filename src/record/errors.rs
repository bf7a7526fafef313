//! # Record Errors
//!
//! Error types for record operations.

use thiserror::Error;

use crate::schema::{SchemaError, Violations};

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Record lifecycle errors
#[derive(Debug, Clone, Error)]
pub enum RecordError {
    // ==================
    // Client Errors
    // ==================
    /// Payload failed validation against the effective schema
    #[error("{0}")]
    Validation(Violations),

    /// Authored schema is malformed
    #[error("Invalid schema: {0}")]
    InvalidSchema(#[from] SchemaError),

    /// Scalar attribute missing or malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid list query parameter
    #[error("Invalid query parameter: {0}")]
    InvalidQuery(String),

    /// Page size above the configured maximum
    #[error("Limit {0} exceeds maximum {1}")]
    LimitExceeded(usize, usize),

    /// No record with this id
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unique attribute already taken
    #[error("{label} with {field} '{value}' already exists")]
    Conflict {
        label: &'static str,
        field: &'static str,
        value: String,
    },

    // ==================
    // Server Errors
    // ==================
    /// Document store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl RecordError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            RecordError::Validation(_) => 400,
            RecordError::InvalidSchema(_) => 400,
            RecordError::InvalidInput(_) => 400,
            RecordError::InvalidQuery(_) => 400,
            RecordError::LimitExceeded(_, _) => 400,

            RecordError::NotFound(_) => 404,

            RecordError::Conflict { .. } => 409,

            RecordError::Storage(_) => 500,
        }
    }

    /// Returns the violations carried by a validation failure
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            RecordError::Validation(v) => Some(v),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(err: serde_json::Error) -> Self {
        RecordError::Storage(format!("document codec: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Violation;

    #[test]
    fn test_error_status_codes() {
        let violations = Violations::from_vec(vec![Violation::required("name")]).unwrap();
        assert_eq!(RecordError::Validation(violations).status_code(), 400);
        assert_eq!(RecordError::NotFound("Policy").status_code(), 404);
        assert_eq!(
            RecordError::Conflict {
                label: "Policy",
                field: "policyNumber",
                value: "POL-1".into()
            }
            .status_code(),
            409
        );
        assert_eq!(RecordError::Storage("disk".into()).status_code(), 500);
    }

    #[test]
    fn test_validation_message_joins_violations() {
        let violations = Violations::from_vec(vec![
            Violation::required("a"),
            Violation::required("b"),
        ])
        .unwrap();
        let err = RecordError::Validation(violations);
        assert_eq!(err.to_string(), "a is required, b is required");
        assert_eq!(err.violations().map(|v| v.len()), Some(2));
    }

    #[test]
    fn test_not_found_names_collection() {
        assert_eq!(RecordError::NotFound("Application").to_string(), "Application not found");
    }
}
