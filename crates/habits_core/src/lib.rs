//! Core domain logic for the habits app.
//! UI and FFI layers call into this crate; it owns every habit invariant.

pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use identity::{
    AuthSession, Credential, IdentityError, IdentityProvider, IdentityResult, SignInMethod,
    SignInState, UserProfile,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::completion::{Clock, FixedClock, SystemClock};
pub use model::habit::{CompletionHistory, Habit, HabitDraft, HabitId, HabitValidationError};
pub use repo::document_store::{
    Document, DocumentId, DocumentStore, FieldValue, Record, StoreError, StoreResult,
};
pub use repo::habit_repo::{DocumentHabitRepository, HabitRepository, HABITS_COLLECTION};
pub use repo::memory_store::MemoryDocumentStore;
pub use repo::sqlite_store::SqliteDocumentStore;
pub use service::habit_store::{HabitStore, HabitStoreError, HabitStoreResult, SubscriptionId};

/// Minimal health-check API for integration probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
