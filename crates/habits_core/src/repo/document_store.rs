//! Document-store contract.
//!
//! A store holds named collections of schemaless records. Ids are assigned
//! by the store on insert. Each write bumps the document's revision, which
//! callers may pass back to `replace` as an optimistic-concurrency token.

use crate::db::DbError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DocumentId = String;

/// One field value inside a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    String(String),
    /// Unix epoch milliseconds.
    Timestamp(i64),
    Array(Vec<FieldValue>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Field name to value mapping.
pub type Record = BTreeMap<String, FieldValue>;

/// A record as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub revision: u64,
    pub record: Record,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    NotFound {
        collection: String,
        id: DocumentId,
    },
    /// Conditional write lost against a concurrent writer.
    Conflict {
        id: DocumentId,
        expected: u64,
        actual: u64,
    },
    Db(DbError),
    InvalidData(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { collection, id } => {
                write!(f, "document not found: {collection}/{id}")
            }
            Self::Conflict {
                id,
                expected,
                actual,
            } => write!(
                f,
                "document {id} was modified concurrently (expected revision {expected}, found {actual})"
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::Conflict { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// Persistence collaborator for schemaless collections.
pub trait DocumentStore {
    /// Returns every document in `collection`, in insertion order.
    fn list_all(&self, collection: &str) -> StoreResult<Vec<Document>>;
    /// Stores a new record and returns its generated id.
    fn insert(&self, collection: &str, record: &Record) -> StoreResult<DocumentId>;
    fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;
    /// Replaces the whole record and returns the new revision.
    ///
    /// With `expected_revision = Some(r)` the write only applies while the
    /// stored revision is still `r`; otherwise `StoreError::Conflict`.
    fn replace(
        &self,
        collection: &str,
        id: &str,
        record: &Record,
        expected_revision: Option<u64>,
    ) -> StoreResult<u64>;
    /// Hard-deletes one document. Missing ids are `NotFound`.
    fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn list_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        (**self).list_all(collection)
    }

    fn insert(&self, collection: &str, record: &Record) -> StoreResult<DocumentId> {
        (**self).insert(collection, record)
    }

    fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        (**self).get_by_id(collection, id)
    }

    fn replace(
        &self,
        collection: &str,
        id: &str,
        record: &Record,
        expected_revision: Option<u64>,
    ) -> StoreResult<u64> {
        (**self).replace(collection, id, record, expected_revision)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        (**self).delete(collection, id)
    }
}
