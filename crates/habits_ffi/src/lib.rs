//! Flutter-facing bindings for `habits_core`.

pub mod api;
