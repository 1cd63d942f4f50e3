//! Persistence collaborator contracts and implementations.
//!
//! # Responsibility
//! - Define the document-store contract habits are persisted through.
//! - Map habit documents to typed `Habit` values.
//!
//! # Invariants
//! - Every stored document carries a revision that increases on each write.
//! - Conditional writes against a stale revision fail with `Conflict`.

pub mod document_store;
pub mod habit_repo;
pub mod memory_store;
pub mod sqlite_store;
