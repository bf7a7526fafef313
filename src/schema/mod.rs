//! Dynamic schema engine
//!
//! Admin-authored field definitions and the validator that checks record
//! payloads against them.
//!
//! # Design Principles
//!
//! - Schemas are checked once, when authored; a `Schema` value is well-formed
//! - Validation walks schema entries, never payload keys
//! - All violations are collected; the caller decides whether to write
//! - Deterministic, side-effect free validation

mod errors;
mod types;
mod validator;
mod wire;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Violation, Violations};
pub use types::{
    ArrayRules, DependsOn, FieldDef, FieldKind, NumberRules, ObjectRules, Pattern, Payload,
    Schema, StringRules, UiHints, MAX_SCHEMA_DEPTH,
};
pub use validator::{parse_date, validate, SchemaValidator};
pub use wire::{FieldDefWire, SchemaPatch};
