//! Schema error and violation types
//!
//! Two distinct failure families live here:
//! - `SchemaError`: the schema itself is malformed (an authoring bug).
//!   Raised eagerly when a schema is deserialized or merged.
//! - `Violation`: a submitted payload breaks a rule of a well-formed schema.
//!   Collected, never raised, by the validator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Schema authoring error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Field definition has no `type`
    MissingType,
    /// `type` is not one of the supported tags
    UnknownType,
    /// Field definition has no (or an empty) `label`
    MissingLabel,
    /// A constraint that does not apply to the declared type
    ConstraintTypeMismatch,
    /// A constraint with an impossible value (e.g. `step <= 0`, `min > max`)
    InvalidConstraint,
    /// `pattern` does not compile
    InvalidPattern,
    /// `dependsOn.field` does not name a sibling field
    InvalidDependency,
    /// `dependsOn.field` names the field itself
    SelfDependency,
    /// Object/array nesting deeper than the supported maximum
    DepthExceeded,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::MissingType => "SCHEMA_MISSING_TYPE",
            SchemaErrorCode::UnknownType => "SCHEMA_UNKNOWN_TYPE",
            SchemaErrorCode::MissingLabel => "SCHEMA_MISSING_LABEL",
            SchemaErrorCode::ConstraintTypeMismatch => "SCHEMA_CONSTRAINT_TYPE_MISMATCH",
            SchemaErrorCode::InvalidConstraint => "SCHEMA_INVALID_CONSTRAINT",
            SchemaErrorCode::InvalidPattern => "SCHEMA_INVALID_PATTERN",
            SchemaErrorCode::InvalidDependency => "SCHEMA_INVALID_DEPENDENCY",
            SchemaErrorCode::SelfDependency => "SCHEMA_SELF_DEPENDENCY",
            SchemaErrorCode::DepthExceeded => "SCHEMA_DEPTH_EXCEEDED",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema authoring error with the location of the offending definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    code: SchemaErrorCode,
    /// Locator of the field definition (e.g. "address.city", "tags[]")
    path: String,
    message: String,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, path: &str, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub fn missing_type(path: &str) -> Self {
        Self::new(SchemaErrorCode::MissingType, path, "field definition must declare a type")
    }

    pub fn unknown_type(path: &str, found: &str) -> Self {
        Self::new(
            SchemaErrorCode::UnknownType,
            path,
            format!(
                "unknown type '{}' (expected string, number, date, boolean, object or array)",
                found
            ),
        )
    }

    pub fn missing_label(path: &str) -> Self {
        Self::new(SchemaErrorCode::MissingLabel, path, "field definition must have a non-empty label")
    }

    pub fn constraint_mismatch(path: &str, constraint: &str, field_type: &str) -> Self {
        Self::new(
            SchemaErrorCode::ConstraintTypeMismatch,
            path,
            format!("'{}' is not allowed on a {} field", constraint, field_type),
        )
    }

    pub fn invalid_constraint(path: &str, reason: impl Into<String>) -> Self {
        Self::new(SchemaErrorCode::InvalidConstraint, path, reason)
    }

    pub fn invalid_pattern(path: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            SchemaErrorCode::InvalidPattern,
            path,
            format!("pattern does not compile: {}", reason),
        )
    }

    pub fn invalid_dependency(path: &str, target: &str) -> Self {
        Self::new(
            SchemaErrorCode::InvalidDependency,
            path,
            format!("dependsOn references unknown sibling field '{}'", target),
        )
    }

    pub fn self_dependency(path: &str) -> Self {
        Self::new(SchemaErrorCode::SelfDependency, path, "dependsOn must not reference the field itself")
    }

    pub fn depth_exceeded(path: &str, max_depth: usize) -> Self {
        Self::new(
            SchemaErrorCode::DepthExceeded,
            path,
            format!("schema nesting exceeds {} levels", max_depth),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the location of the offending definition
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "[{}] {}", self.code, self.message)
        } else {
            write!(f, "[{}] {}: {}", self.code, self.path, self.message)
        }
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema authoring operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// One rule failure found in a payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Violation {
    /// Locator in the payload (`field`, `field.sub`, `field[0]`)
    pub path: String,
    /// Human-readable description
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn required(path: &str) -> Self {
        Self::new(path, format!("{} is required", path))
    }

    pub fn type_mismatch(path: &str, expected: &str) -> Self {
        Self::new(path, format!("{} must be {}", path, expected))
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Non-empty collection of violations that rejected a write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Wraps a validator result; `None` when there is nothing to report.
    pub fn from_vec(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self(violations))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}
