//! Habit domain model.
//!
//! # Responsibility
//! - Define the habit record shared by store, repository and FFI layers.
//! - Own calendar-day completion logic (`completion`).
//!
//! # Invariants
//! - A habit id is assigned by the document store and never changes.
//! - Completion dates are Unix epoch milliseconds (UTC instants); calendar
//!   days are derived through a `Clock`.

pub mod completion;
pub mod habit;
