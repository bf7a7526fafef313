//! # Record Model
//!
//! A record is a typed set of scalar attributes plus an optional
//! admin-authored schema and the dynamic payload validated against it.
//!
//! Stored and served as one flat camelCase JSON document:
//!
//! ```json
//! {
//!   "id": "…",
//!   "title": "…",
//!   "schemaDefinition": { "smoker": { "type": "boolean", "label": "Smoker" } },
//!   "dynamicFields": { "smoker": false },
//!   "createdAt": "…",
//!   "updatedAt": "…"
//! }
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{RecordError, RecordResult};
use super::query::FilterExpr;
use crate::schema::{validate, Payload, Schema, SchemaPatch, Violation};

/// Scalar attribute set of one record collection
pub trait RecordAttributes:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Create input (may omit generated attributes)
    type Input: DeserializeOwned + Send + 'static;

    /// Partial update; every attribute optional
    type Patch: DeserializeOwned + Default + Send + 'static;

    /// Store collection name
    const COLLECTION: &'static str;

    /// Human-readable entity name used in messages
    const LABEL: &'static str;

    /// Attribute that must be unique within the collection
    const UNIQUE_FIELD: &'static str;

    /// Build attributes for a new record created by `actor`
    fn from_input(input: Self::Input, actor: &str) -> RecordResult<Self>;

    /// Overlay the present attributes of `patch`
    fn apply_patch(&mut self, patch: Self::Patch) -> RecordResult<()>;

    /// Current value of `UNIQUE_FIELD`
    fn unique_key(&self) -> &str;

    /// Translate one list query parameter; `Ok(None)` for unknown keys
    fn filter(key: &str, value: &str) -> RecordResult<Option<FilterExpr>>;
}

/// Stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<A> {
    pub id: Uuid,

    #[serde(flatten)]
    pub attributes: A,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_definition: Option<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_fields: Option<Payload>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<A> Record<A> {
    /// Violations of the stored payload against the stored schema.
    /// Nothing is checked unless both are present.
    pub fn violations(&self) -> Vec<Violation> {
        match (&self.schema_definition, &self.dynamic_fields) {
            (Some(schema), Some(payload)) => validate(schema, payload),
            _ => Vec::new(),
        }
    }
}

/// Create request: scalar input plus optional schema and payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecord<I> {
    #[serde(flatten)]
    pub attributes: I,

    #[serde(default)]
    pub schema_definition: Option<SchemaPatch>,

    #[serde(default)]
    pub dynamic_fields: Option<Payload>,
}

/// Partial update: schema entries merge by name, payload keys merge by key
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord<P> {
    #[serde(flatten)]
    pub attributes: P,

    #[serde(default)]
    pub schema_definition: Option<SchemaPatch>,

    #[serde(default)]
    pub dynamic_fields: Option<Payload>,
}

/// Body of `PUT /:id/schema`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaUpdate {
    pub schema_definition: SchemaPatch,
}

/// Body of `PUT /:id/fields`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldsUpdate {
    pub dynamic_fields: Payload,
}

/// Rejects blank required text attributes
pub(crate) fn require_text(field: &str, value: &str) -> RecordResult<()> {
    if value.trim().is_empty() {
        Err(RecordError::InvalidInput(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}

/// Accepts the same date spellings as the `date` field type
pub(crate) mod flexible_date {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::schema::parse_date;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date '{}'", raw)))
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) => parse_date(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid date '{}'", raw))),
            }
        }
    }
}
