//! SQLite-backed `DocumentStore`.
//!
//! # Responsibility
//! - Persist schemaless records as JSON bodies in the `documents` table.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - `(collection, id)` is unique; ids are generated UUIDv4 strings.
//! - Every successful `replace` increments `revision` by exactly one.
//! - Read paths reject undecodable bodies instead of masking them.

use crate::repo::document_store::{
    Document, DocumentId, DocumentStore, Record, StoreError, StoreResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const DOCUMENT_SELECT_SQL: &str = "SELECT id, revision, body FROM documents";

/// Document store over a migrated connection from `db::open_db*`.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn current_revision(&self, collection: &str, id: &str) -> StoreResult<Option<u64>> {
        let revision = self
            .conn
            .query_row(
                "SELECT revision FROM documents WHERE collection = ?1 AND id = ?2;",
                params![collection, id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        revision.map(revision_from_db).transpose()
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn list_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DOCUMENT_SELECT_SQL} WHERE collection = ?1 ORDER BY seq ASC;"
        ))?;
        let mut rows = stmt.query([collection])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }
        Ok(documents)
    }

    fn insert(&self, collection: &str, record: &Record) -> StoreResult<DocumentId> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT INTO documents (collection, id, revision, body) VALUES (?1, ?2, 1, ?3);",
            params![collection, id, body],
        )?;
        Ok(id)
    }

    fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DOCUMENT_SELECT_SQL} WHERE collection = ?1 AND id = ?2;"
        ))?;
        let mut rows = stmt.query(params![collection, id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_document_row(row)?)),
            None => Ok(None),
        }
    }

    fn replace(
        &self,
        collection: &str,
        id: &str,
        record: &Record,
        expected_revision: Option<u64>,
    ) -> StoreResult<u64> {
        let body = serde_json::to_string(record)?;
        let expected = expected_revision.map(revision_to_db).transpose()?;

        let new_revision = self
            .conn
            .query_row(
                "UPDATE documents
                 SET
                    body = ?1,
                    revision = revision + 1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE collection = ?2
                   AND id = ?3
                   AND (?4 IS NULL OR revision = ?4)
                 RETURNING revision;",
                params![body, collection, id, expected],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        if let Some(revision) = new_revision {
            return revision_from_db(revision);
        }

        match (self.current_revision(collection, id)?, expected_revision) {
            (Some(actual), Some(expected)) => Err(StoreError::Conflict {
                id: id.to_string(),
                expected,
                actual,
            }),
            _ => Err(StoreError::not_found(collection, id)),
        }
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
            params![collection, id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }
}

fn parse_document_row(row: &Row<'_>) -> StoreResult<Document> {
    let id: String = row.get("id")?;
    let body: String = row.get("body")?;
    let record: Record = serde_json::from_str(&body).map_err(|err| {
        StoreError::InvalidData(format!("document `{id}` has an undecodable body: {err}"))
    })?;
    Ok(Document {
        revision: revision_from_db(row.get("revision")?)?,
        id,
        record,
    })
}

fn revision_from_db(value: i64) -> StoreResult<u64> {
    u64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("negative revision `{value}`")))
}

fn revision_to_db(value: u64) -> StoreResult<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("revision `{value}` out of range")))
}
