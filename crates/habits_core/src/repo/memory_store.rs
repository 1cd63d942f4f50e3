//! Process-local `DocumentStore`.
//!
//! Same semantics as the SQLite store, kept behind a mutex so one instance
//! can be shared by reference. Contents vanish with the value.

use crate::repo::document_store::{
    Document, DocumentId, DocumentStore, Record, StoreError, StoreResult,
};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Entry {
    id: DocumentId,
    revision: u64,
    record: Record,
}

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<BTreeMap<String, Vec<Entry>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collections(&self) -> MutexGuard<'_, BTreeMap<String, Vec<Entry>>> {
        // Writes never leave an entry half-updated; poisoned data is intact.
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn list_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collections = self.collections();
        Ok(collections
            .get(collection)
            .map(|entries| entries.iter().map(to_document).collect())
            .unwrap_or_default())
    }

    fn insert(&self, collection: &str, record: &Record) -> StoreResult<DocumentId> {
        let id = Uuid::new_v4().to_string();
        self.collections()
            .entry(collection.to_string())
            .or_default()
            .push(Entry {
                id: id.clone(),
                revision: 1,
                record: record.clone(),
            });
        Ok(id)
    }

    fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections();
        Ok(collections
            .get(collection)
            .and_then(|entries| entries.iter().find(|entry| entry.id == id))
            .map(to_document))
    }

    fn replace(
        &self,
        collection: &str,
        id: &str,
        record: &Record,
        expected_revision: Option<u64>,
    ) -> StoreResult<u64> {
        let mut collections = self.collections();
        let entry = collections
            .get_mut(collection)
            .and_then(|entries| entries.iter_mut().find(|entry| entry.id == id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        if let Some(expected) = expected_revision {
            if entry.revision != expected {
                return Err(StoreError::Conflict {
                    id: id.to_string(),
                    expected,
                    actual: entry.revision,
                });
            }
        }

        entry.revision += 1;
        entry.record = record.clone();
        Ok(entry.revision)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut collections = self.collections();
        let entries = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }
}

fn to_document(entry: &Entry) -> Document {
    Document {
        id: entry.id.clone(),
        revision: entry.revision,
        record: entry.record.clone(),
    }
}
