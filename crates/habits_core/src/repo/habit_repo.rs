//! Typed habit access over any `DocumentStore`.
//!
//! # Responsibility
//! - Encode/decode the `habits` collection wire schema.
//! - Provide use-case oriented habit reads and writes.
//!
//! # Invariants
//! - Reads are lenient: a missing name decodes as `""`, a missing or
//!   malformed completion field as an empty list.
//! - Writes never drop fields they do not own.
//! - Read-modify-write paths pass the revision they read back to the store.

use crate::model::habit::{CompletionHistory, Habit, HabitDraft, HabitId};
use crate::repo::document_store::{
    Document, DocumentStore, FieldValue, Record, StoreError, StoreResult,
};
use log::warn;

pub const HABITS_COLLECTION: &str = "habits";
pub const FIELD_NAME: &str = "name";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_COMPLETED: &str = "dateHabitCompleted";

/// Repository interface for habit CRUD operations.
pub trait HabitRepository {
    fn list_habits(&self) -> StoreResult<Vec<Habit>>;
    fn get_habit(&self, id: &HabitId) -> StoreResult<Option<Habit>>;
    /// Inserts a habit with an empty completion list.
    fn create_habit(&self, draft: &HabitDraft) -> StoreResult<HabitId>;
    /// Replaces name and description; `history` decides the completion list.
    fn update_habit(
        &self,
        id: &HabitId,
        draft: &HabitDraft,
        history: CompletionHistory,
    ) -> StoreResult<Habit>;
    /// Writes `dates` guarded by `habit.revision`; returns the new revision.
    fn replace_completion_dates(&self, habit: &Habit, dates: &[i64]) -> StoreResult<u64>;
    fn delete_habit(&self, id: &HabitId) -> StoreResult<()>;
}

/// `HabitRepository` backed by one collection of a document store.
pub struct DocumentHabitRepository<S: DocumentStore> {
    store: S,
    collection: String,
}

impl<S: DocumentStore> DocumentHabitRepository<S> {
    /// Uses the default `habits` collection.
    pub fn new(store: S) -> Self {
        Self::with_collection(store, HABITS_COLLECTION)
    }

    pub fn with_collection(store: S, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn fetch_document(&self, id: &HabitId) -> StoreResult<Document> {
        self.store
            .get_by_id(&self.collection, id.as_str())?
            .ok_or_else(|| StoreError::not_found(&self.collection, id.as_str()))
    }
}

impl<S: DocumentStore> HabitRepository for DocumentHabitRepository<S> {
    fn list_habits(&self) -> StoreResult<Vec<Habit>> {
        self.store
            .list_all(&self.collection)?
            .iter()
            .map(habit_from_document)
            .collect()
    }

    fn get_habit(&self, id: &HabitId) -> StoreResult<Option<Habit>> {
        self.store
            .get_by_id(&self.collection, id.as_str())?
            .as_ref()
            .map(habit_from_document)
            .transpose()
    }

    fn create_habit(&self, draft: &HabitDraft) -> StoreResult<HabitId> {
        let mut record = Record::new();
        apply_draft(&mut record, draft);
        record.insert(FIELD_COMPLETED.to_string(), FieldValue::Array(Vec::new()));

        let id = self.store.insert(&self.collection, &record)?;
        HabitId::new(id).map_err(|err| StoreError::InvalidData(err.to_string()))
    }

    fn update_habit(
        &self,
        id: &HabitId,
        draft: &HabitDraft,
        history: CompletionHistory,
    ) -> StoreResult<Habit> {
        let document = self.fetch_document(id)?;
        let mut record = document.record;
        apply_draft(&mut record, draft);
        if history == CompletionHistory::Reset {
            record.insert(FIELD_COMPLETED.to_string(), FieldValue::Array(Vec::new()));
        }

        let revision = self.store.replace(
            &self.collection,
            id.as_str(),
            &record,
            Some(document.revision),
        )?;
        habit_from_document(&Document {
            id: document.id,
            revision,
            record,
        })
    }

    fn replace_completion_dates(&self, habit: &Habit, dates: &[i64]) -> StoreResult<u64> {
        let document = self.fetch_document(&habit.id)?;
        if document.revision != habit.revision {
            return Err(StoreError::Conflict {
                id: habit.id.to_string(),
                expected: habit.revision,
                actual: document.revision,
            });
        }

        let mut record = document.record;
        record.insert(FIELD_COMPLETED.to_string(), completion_field(dates));
        self.store.replace(
            &self.collection,
            habit.id.as_str(),
            &record,
            Some(habit.revision),
        )
    }

    fn delete_habit(&self, id: &HabitId) -> StoreResult<()> {
        self.store.delete(&self.collection, id.as_str())
    }
}

/// Decodes one `habits` document.
pub fn habit_from_document(document: &Document) -> StoreResult<Habit> {
    let id = HabitId::new(document.id.clone())
        .map_err(|err| StoreError::InvalidData(err.to_string()))?;
    let record = &document.record;

    let name = match record.get(FIELD_NAME) {
        Some(FieldValue::String(name)) => name.clone(),
        Some(other) if !other.is_null() => {
            warn!("event=habit_decode module=repo status=degraded habit_id={id} field=name");
            String::new()
        }
        _ => String::new(),
    };

    let description = match record.get(FIELD_DESCRIPTION) {
        Some(FieldValue::String(description)) => Some(description.clone()),
        Some(other) if !other.is_null() => {
            warn!("event=habit_decode module=repo status=degraded habit_id={id} field=description");
            None
        }
        _ => None,
    };

    let completion_dates = match record.get(FIELD_COMPLETED) {
        Some(FieldValue::Array(items)) => completion_dates_from_items(&id, items),
        Some(other) if !other.is_null() => {
            warn!("event=habit_decode module=repo status=degraded habit_id={id} field={FIELD_COMPLETED}");
            Vec::new()
        }
        _ => Vec::new(),
    };

    Ok(Habit {
        id,
        name,
        description,
        completion_dates,
        revision: document.revision,
    })
}

fn completion_dates_from_items(id: &HabitId, items: &[FieldValue]) -> Vec<i64> {
    let mut skipped = 0usize;
    let dates: Vec<i64> = items
        .iter()
        .filter_map(|item| match item {
            FieldValue::Timestamp(at) | FieldValue::Integer(at) => Some(*at),
            _ => {
                skipped += 1;
                None
            }
        })
        .collect();
    if skipped > 0 {
        warn!(
            "event=habit_decode module=repo status=degraded habit_id={id} field={FIELD_COMPLETED} skipped={skipped}"
        );
    }
    dates
}

fn completion_field(dates: &[i64]) -> FieldValue {
    FieldValue::Array(dates.iter().copied().map(FieldValue::Timestamp).collect())
}

fn apply_draft(record: &mut Record, draft: &HabitDraft) {
    record.insert(
        FIELD_NAME.to_string(),
        FieldValue::String(draft.name().to_string()),
    );
    match draft.description() {
        Some(description) => {
            record.insert(
                FIELD_DESCRIPTION.to_string(),
                FieldValue::String(description.to_string()),
            );
        }
        None => {
            record.remove(FIELD_DESCRIPTION);
        }
    }
}
