//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose habit use-cases to Dart via flutter_rust_bridge.
//! - Translate core errors into plain response envelopes.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - Every mutating call answers with the refreshed habit list.

use habits_core::db::open_db;
use habits_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CompletionHistory, DocumentHabitRepository, Habit, HabitId, HabitStore, HabitStoreError,
    SqliteDocumentStore,
};
use std::path::PathBuf;
use std::sync::OnceLock;

const DB_FILE_NAME: &str = "habits.sqlite3";
const DB_PATH_ENV: &str = "HABITS_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

type SqliteHabitStore<'conn> = HabitStore<DocumentHabitRepository<SqliteDocumentStore<'conn>>>;

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the call with the same `level + log_dir` is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One habit row as rendered by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitItem {
    pub id: String,
    pub name: String,
    /// `None` when the habit was saved without a description.
    pub description: Option<String>,
    /// Completion instants in epoch milliseconds.
    pub completion_dates_ms: Vec<i64>,
    /// Evaluated against the device's local calendar day.
    pub completed_today: bool,
}

/// Response envelope shared by every habit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitResponse {
    pub ok: bool,
    /// Machine-readable failure kind (`invalid_habit|habit_not_found|conflict|store_failed`).
    pub error_code: Option<String>,
    /// Id of the habit the call created or touched.
    pub habit_id: Option<String>,
    /// Refreshed snapshot; empty on failure.
    pub items: Vec<HabitItem>,
    pub message: String,
}

impl HabitResponse {
    fn success(
        message: impl Into<String>,
        habit_id: Option<&HabitId>,
        store: &SqliteHabitStore<'_>,
    ) -> Self {
        Self {
            ok: true,
            error_code: None,
            habit_id: habit_id.map(HabitId::to_string),
            items: store
                .snapshot()
                .iter()
                .map(|habit| to_habit_item(habit, store))
                .collect(),
            message: message.into(),
        }
    }

    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: Some(code.to_string()),
            habit_id: None,
            items: Vec::new(),
            message: message.into(),
        }
    }
}

/// Lists every habit.
#[flutter_rust_bridge::frb(sync)]
pub fn habits_list() -> HabitResponse {
    with_habit_store("habits_list", |store| {
        store.list()?;
        Ok(HabitResponse::success("Habits loaded.", None, store))
    })
}

/// Creates a habit. Blank `description` input is stored as absent.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_create(name: String, description: Option<String>) -> HabitResponse {
    with_habit_store("habit_create", |store| {
        let id = store.create(name, normalize_description(description))?;
        Ok(HabitResponse::success("Habit created.", Some(&id), store))
    })
}

/// Replaces name and description. `reset_history` also clears completions.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_update(
    habit_id: String,
    name: String,
    description: Option<String>,
    reset_history: bool,
) -> HabitResponse {
    let history = if reset_history {
        CompletionHistory::Reset
    } else {
        CompletionHistory::Keep
    };
    with_habit_store("habit_update", |store| {
        let id = parse_habit_id(habit_id)?;
        store.update(&id, name, normalize_description(description), history)?;
        Ok(HabitResponse::success("Habit updated.", Some(&id), store))
    })
}

/// Deletes a habit permanently.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_delete(habit_id: String) -> HabitResponse {
    with_habit_store("habit_delete", |store| {
        let id = parse_habit_id(habit_id)?;
        store.delete(&id)?;
        Ok(HabitResponse::success("Habit deleted.", Some(&id), store))
    })
}

/// Marks today complete, or undoes today's completion.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_toggle_completion(habit_id: String) -> HabitResponse {
    with_habit_store("habit_toggle_completion", |store| {
        let id = parse_habit_id(habit_id)?;
        // Toggle only patches habits already in the snapshot.
        store.list()?;
        let habit = store.toggle_completion(&id)?;
        let message = if store.is_completed_today(&habit) {
            "Habit completed."
        } else {
            "Completion undone."
        };
        Ok(HabitResponse::success(message, Some(&id), store))
    })
}

fn with_habit_store(
    operation: &str,
    f: impl FnOnce(&mut SqliteHabitStore<'_>) -> Result<HabitResponse, HabitStoreError>,
) -> HabitResponse {
    let conn = match open_db(resolve_db_path()) {
        Ok(conn) => conn,
        Err(err) => {
            return HabitResponse::failure("store_failed", format!("{operation} failed: {err}"))
        }
    };
    let mut store = HabitStore::new(DocumentHabitRepository::new(SqliteDocumentStore::new(
        &conn,
    )));
    match f(&mut store) {
        Ok(response) => response,
        Err(err) => HabitResponse::failure(err.code(), format!("{operation} failed: {err}")),
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn parse_habit_id(raw: String) -> Result<HabitId, HabitStoreError> {
    HabitId::new(raw.trim()).map_err(HabitStoreError::from)
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|value| !value.trim().is_empty())
}

fn to_habit_item(habit: &Habit, store: &SqliteHabitStore<'_>) -> HabitItem {
    HabitItem {
        id: habit.id.to_string(),
        name: habit.name.clone(),
        description: habit.description.clone(),
        completion_dates_ms: habit.completion_dates.clone(),
        completed_today: store.is_completed_today(habit),
    }
}
