//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into UI-level habit operations.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod habit_store;
