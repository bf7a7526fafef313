//! # Document Store
//!
//! Persistence collaborator for records. Records cross this boundary as
//! JSON documents keyed by collection and id; the store never validates.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde_json::Value;
use uuid::Uuid;

use super::errors::{RecordError, RecordResult};
use super::query::FilterSet;

/// Key-value document persistence
pub trait DocumentStore: Send + Sync {
    /// Insert a new document; fails if the id is already taken
    fn insert(&self, collection: &str, id: Uuid, doc: Value) -> RecordResult<()>;

    /// Fetch a document by id
    fn get(&self, collection: &str, id: Uuid) -> RecordResult<Option<Value>>;

    /// Replace an existing document; returns false when absent
    fn replace(&self, collection: &str, id: Uuid, doc: Value) -> RecordResult<bool>;

    /// Delete a document; returns false when absent
    fn remove(&self, collection: &str, id: Uuid) -> RecordResult<bool>;

    /// All documents in a collection matching every filter
    fn find(&self, collection: &str, filters: &FilterSet) -> RecordResult<Vec<Value>>;
}

type Collection = BTreeMap<Uuid, Value>;

/// In-process document store
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> RecordResult<usize> {
        let collections = self.read()?;
        Ok(collections.get(collection).map_or(0, BTreeMap::len))
    }

    fn read(&self) -> RecordResult<std::sync::RwLockReadGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .read()
            .map_err(|_| RecordError::Storage("document store lock poisoned".into()))
    }

    fn write(&self) -> RecordResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .write()
            .map_err(|_| RecordError::Storage("document store lock poisoned".into()))
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert(&self, collection: &str, id: Uuid, doc: Value) -> RecordResult<()> {
        let mut collections = self.write()?;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(RecordError::Storage(format!("duplicate document id {}", id)));
        }
        docs.insert(id, doc);
        Ok(())
    }

    fn get(&self, collection: &str, id: Uuid) -> RecordResult<Option<Value>> {
        let collections = self.read()?;
        Ok(collections.get(collection).and_then(|docs| docs.get(&id)).cloned())
    }

    fn replace(&self, collection: &str, id: Uuid, doc: Value) -> RecordResult<bool> {
        let mut collections = self.write()?;
        match collections.get_mut(collection).and_then(|docs| docs.get_mut(&id)) {
            Some(slot) => {
                *slot = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, collection: &str, id: Uuid) -> RecordResult<bool> {
        let mut collections = self.write()?;
        Ok(collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(&id))
            .is_some())
    }

    fn find(&self, collection: &str, filters: &FilterSet) -> RecordResult<Vec<Value>> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| filters.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
