//! CLI-specific error types

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::schema::SchemaError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (files, stdout)
    IoError,
    /// Schema file is malformed
    InvalidSchema,
    /// Payload breaks the schema
    ValidationFailed,
    /// Server failed to start or stopped with an error
    ServeFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "POLICYHUB_CLI_CONFIG_ERROR",
            Self::IoError => "POLICYHUB_CLI_IO_ERROR",
            Self::InvalidSchema => "POLICYHUB_CLI_INVALID_SCHEMA",
            Self::ValidationFailed => "POLICYHUB_CLI_VALIDATION_FAILED",
            Self::ServeFailed => "POLICYHUB_CLI_SERVE_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn validation_failed(count: usize) -> Self {
        Self::new(
            CliErrorCode::ValidationFailed,
            format!("payload has {} violation(s)", count),
        )
    }

    pub fn serve_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ServeFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::new(CliErrorCode::InvalidSchema, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::validation_failed(2);
        assert_eq!(
            err.to_string(),
            "POLICYHUB_CLI_VALIDATION_FAILED: payload has 2 violation(s)"
        );
    }

    #[test]
    fn test_schema_error_conversion() {
        let err: CliError = SchemaError::missing_type("age").into();
        assert_eq!(err.code(), &CliErrorCode::InvalidSchema);
        assert!(err.message().contains("age"));
    }
}
