//! Habit record and write-side validation.
//!
//! # Invariants
//! - `HabitId` is never empty.
//! - Names written through `HabitDraft` are trimmed and non-empty.
//! - `description: None` (absent) is distinct from `Some("")`.

use crate::model::completion::{self, Clock};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque habit identifier assigned by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    /// Wraps a store-assigned id, rejecting blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, HabitValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(HabitValidationError::EmptyId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for HabitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validation failures for habit writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitValidationError {
    EmptyId,
    EmptyName,
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "habit id must not be empty"),
            Self::EmptyName => write!(f, "habit name must not be empty"),
        }
    }
}

impl Error for HabitValidationError {}

/// A user-defined recurring task tracked by calendar-day completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    /// Display name. Empty only when the stored document lacks one.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Epoch milliseconds, one per completed day. Order is not meaningful.
    #[serde(rename = "dateHabitCompleted", default)]
    pub completion_dates: Vec<i64>,
    /// Document revision this value was read at.
    #[serde(default)]
    pub revision: u64,
}

impl Habit {
    /// True iff some completion falls on the clock's current local day.
    pub fn is_completed_today(&self, clock: &(impl Clock + ?Sized)) -> bool {
        completion::is_completed_today(&self.completion_dates, clock)
    }

    /// Description for display; absent renders as blank.
    pub fn description_or_blank(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// Latest completion instant, if any.
    pub fn last_completed_at(&self) -> Option<i64> {
        self.completion_dates.iter().copied().max()
    }
}

/// Validated name/description pair used by create and edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDraft {
    name: String,
    description: Option<String>,
}

impl HabitDraft {
    /// Trims `name` and rejects it when empty. `description` is kept verbatim.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, HabitValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(HabitValidationError::EmptyName);
        }
        Ok(Self {
            name: trimmed.to_string(),
            description,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// What an edit does to the habit's completion history.
///
/// Older clients cleared the history on every edit; callers now pick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionHistory {
    /// Leave `completion_dates` untouched.
    #[default]
    Keep,
    /// Clear `completion_dates` as part of the edit.
    Reset,
}
