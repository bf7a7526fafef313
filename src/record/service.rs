//! # Record Service
//!
//! Lifecycle operations for one record collection. Every write follows the
//! same shape: load, apply the change to a copy, validate the copy, write it.
//! A failed validation leaves the stored document untouched.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{RecordError, RecordResult};
use super::model::{CreateRecord, Record, RecordAttributes, UpdateRecord};
use super::query::{FilterExpr, FilterSet, ListQuery, Page};
use super::store::DocumentStore;
use crate::schema::{Payload, Schema, SchemaPatch, Violations};

/// What `updateSchema` does with an already stored payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaChangePolicy {
    /// Replace the schema; the stored payload is re-checked on its next write
    #[default]
    Permissive,
    /// Reject a schema the stored payload does not satisfy
    Revalidate,
}

/// Record behaviour settings (`records` config section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSettings {
    #[serde(default)]
    pub schema_change: SchemaChangePolicy,

    #[serde(default = "default_limit")]
    pub default_limit: usize,

    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    100
}

impl Default for RecordSettings {
    fn default() -> Self {
        Self {
            schema_change: SchemaChangePolicy::default(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

/// Lifecycle operations for records with attribute set `A`
pub struct RecordService<A: RecordAttributes> {
    store: Arc<dyn DocumentStore>,
    settings: RecordSettings,
    _attributes: PhantomData<fn() -> A>,
}

impl<A: RecordAttributes> Clone for RecordService<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            settings: self.settings.clone(),
            _attributes: PhantomData,
        }
    }
}

impl<A: RecordAttributes> RecordService<A> {
    pub fn new(store: Arc<dyn DocumentStore>, settings: RecordSettings) -> Self {
        Self {
            store,
            settings,
            _attributes: PhantomData,
        }
    }

    pub fn settings(&self) -> &RecordSettings {
        &self.settings
    }

    /// Create a record on behalf of `actor`.
    ///
    /// Field defaults fill absent payload keys before validation.
    pub fn create(&self, request: CreateRecord<A::Input>, actor: &str) -> RecordResult<Record<A>> {
        let attributes = A::from_input(request.attributes, actor)?;
        let schema = request.schema_definition.map(Schema::try_from).transpose()?;

        let mut dynamic_fields = request.dynamic_fields;
        if let (Some(schema), Some(payload)) = (&schema, dynamic_fields.as_mut()) {
            schema.apply_defaults(payload);
        }

        let now = Utc::now();
        let record = Record {
            id: Uuid::new_v4(),
            attributes,
            schema_definition: schema,
            dynamic_fields,
            created_at: now,
            updated_at: now,
        };

        self.check(&record)?;
        self.ensure_unique(&record)?;

        self.store
            .insert(A::COLLECTION, record.id, serde_json::to_value(&record)?)?;
        info!(collection = A::COLLECTION, id = %record.id, actor, "record created");
        Ok(record)
    }

    pub fn get(&self, id: Uuid) -> RecordResult<Record<A>> {
        let doc = self
            .store
            .get(A::COLLECTION, id)?
            .ok_or(RecordError::NotFound(A::LABEL))?;
        Ok(serde_json::from_value(doc)?)
    }

    /// Partial update: scalar overlay, schema merge by field name, payload
    /// merge by key. The merged record is validated as a whole.
    pub fn update(&self, id: Uuid, patch: UpdateRecord<A::Patch>) -> RecordResult<Record<A>> {
        let mut record = self.get(id)?;

        record.attributes.apply_patch(patch.attributes)?;

        if let Some(schema_patch) = patch.schema_definition {
            let merged = match &record.schema_definition {
                Some(current) => current.merge(schema_patch)?,
                None => Schema::try_from(schema_patch)?,
            };
            record.schema_definition = Some(merged);
        }

        if let Some(changes) = patch.dynamic_fields {
            record
                .dynamic_fields
                .get_or_insert_with(Payload::new)
                .extend(changes);
        }

        self.check(&record)?;
        self.ensure_unique(&record)?;
        self.persist(record)
    }

    /// Replace the schema wholesale
    pub fn update_schema(&self, id: Uuid, schema: SchemaPatch) -> RecordResult<Record<A>> {
        let mut record = self.get(id)?;
        record.schema_definition = Some(Schema::try_from(schema)?);

        match self.settings.schema_change {
            SchemaChangePolicy::Revalidate => self.check(&record)?,
            SchemaChangePolicy::Permissive => {
                let stale = record.violations().len();
                if stale > 0 {
                    debug!(
                        collection = A::COLLECTION,
                        %id,
                        stale,
                        "stored payload does not satisfy the new schema"
                    );
                }
            }
        }

        self.persist(record)
    }

    /// Replace the payload wholesale, validated against the stored schema
    pub fn update_dynamic_fields(&self, id: Uuid, payload: Payload) -> RecordResult<Record<A>> {
        let mut record = self.get(id)?;
        record.dynamic_fields = Some(payload);
        self.check(&record)?;
        self.persist(record)
    }

    /// Hard delete
    pub fn delete(&self, id: Uuid) -> RecordResult<()> {
        if !self.store.remove(A::COLLECTION, id)? {
            return Err(RecordError::NotFound(A::LABEL));
        }
        info!(collection = A::COLLECTION, %id, "record deleted");
        Ok(())
    }

    /// Filtered page of records, newest first
    pub fn list(&self, query: &ListQuery) -> RecordResult<Page<Record<A>>> {
        let mut records = self
            .store
            .find(A::COLLECTION, &query.filters)?
            .into_iter()
            .map(serde_json::from_value::<Record<A>>)
            .collect::<Result<Vec<_>, _>>()?;

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = records.len();
        let items = records
            .into_iter()
            .skip(query.offset())
            .take(query.limit)
            .collect();

        Ok(Page {
            items,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    /// Parse raw query-string parameters, then list
    pub fn list_params(&self, params: &HashMap<String, String>) -> RecordResult<Page<Record<A>>> {
        let query = ListQuery::parse::<A>(params, &self.settings)?;
        self.list(&query)
    }

    fn check(&self, record: &Record<A>) -> RecordResult<()> {
        match Violations::from_vec(record.violations()) {
            None => Ok(()),
            Some(violations) => {
                warn!(
                    collection = A::COLLECTION,
                    id = %record.id,
                    count = violations.len(),
                    "dynamic fields rejected"
                );
                Err(RecordError::Validation(violations))
            }
        }
    }

    fn ensure_unique(&self, record: &Record<A>) -> RecordResult<()> {
        let key = record.attributes.unique_key();
        let filters = FilterSet::new().and(FilterExpr::eq(A::UNIQUE_FIELD, Value::String(key.to_string())));
        let clash = self
            .store
            .find(A::COLLECTION, &filters)?
            .iter()
            .any(|doc| doc.get("id").and_then(Value::as_str) != Some(record.id.to_string().as_str()));

        if clash {
            return Err(RecordError::Conflict {
                label: A::LABEL,
                field: A::UNIQUE_FIELD,
                value: key.to_string(),
            });
        }
        Ok(())
    }

    fn persist(&self, mut record: Record<A>) -> RecordResult<Record<A>> {
        record.updated_at = Utc::now();
        if !self
            .store
            .replace(A::COLLECTION, record.id, serde_json::to_value(&record)?)?
        {
            return Err(RecordError::NotFound(A::LABEL));
        }
        info!(collection = A::COLLECTION, id = %record.id, "record updated");
        Ok(record)
    }
}
