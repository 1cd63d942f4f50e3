//! Habit store: local snapshot plus mutations against the repository.
//!
//! # Responsibility
//! - Hold the in-memory snapshot every UI view renders from.
//! - Re-derive the snapshot from the repository after each mutation.
//! - Notify subscribers whenever the snapshot changes.
//!
//! # Invariants
//! - The snapshot is a disposable cache; the repository is authoritative.
//! - A failed operation leaves the snapshot exactly as it was.
//! - `toggle_completion` decides from a fresh read, never from the snapshot,
//!   and its write is rejected with a conflict if the habit changed meanwhile.

use crate::model::completion::{self, Clock, SystemClock};
use crate::model::habit::{CompletionHistory, Habit, HabitDraft, HabitId, HabitValidationError};
use crate::repo::document_store::StoreError;
use crate::repo::habit_repo::HabitRepository;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type HabitStoreResult<T> = Result<T, HabitStoreError>;

/// Service error for habit use-cases.
#[derive(Debug)]
pub enum HabitStoreError {
    /// Caller input failed validation; nothing was written.
    InvalidHabit(HabitValidationError),
    HabitNotFound(HabitId),
    /// Persistence-layer failure, including revision conflicts.
    Store(StoreError),
}

impl HabitStoreError {
    /// True when a concurrent writer changed the habit first.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_conflict())
    }

    /// Stable machine-readable kind for logs and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidHabit(_) => "invalid_habit",
            Self::HabitNotFound(_) => "habit_not_found",
            Self::Store(StoreError::Conflict { .. }) => "conflict",
            Self::Store(_) => "store_failed",
        }
    }
}

impl Display for HabitStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHabit(err) => write!(f, "{err}"),
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HabitStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidHabit(err) => Some(err),
            Self::HabitNotFound(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<HabitValidationError> for HabitStoreError {
    fn from(value: HabitValidationError) -> Self {
        Self::InvalidHabit(value)
    }
}

impl From<StoreError> for HabitStoreError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Handle returned by `HabitStore::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&[Habit])>;

/// Snapshot-owning habit service.
pub struct HabitStore<R: HabitRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
    snapshot: Vec<Habit>,
    loaded: bool,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl<R: HabitRepository> HabitStore<R> {
    /// Creates a store on the local wall clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: HabitRepository, C: Clock> HabitStore<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self {
            repo,
            clock,
            snapshot: Vec::new(),
            loaded: false,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn snapshot(&self) -> &[Habit] {
        &self.snapshot
    }

    pub fn get(&self, id: &HabitId) -> Option<&Habit> {
        self.snapshot.iter().find(|habit| &habit.id == id)
    }

    /// True until the first successful `list()`.
    pub fn is_loading(&self) -> bool {
        !self.loaded
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Whether `habit` has a completion on the store clock's current day.
    pub fn is_completed_today(&self, habit: &Habit) -> bool {
        habit.is_completed_today(&self.clock)
    }

    /// Registers a callback invoked with the new snapshot after every change.
    pub fn subscribe(&mut self, callback: impl Fn(&[Habit]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes a subscriber. Returns `false` when `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    /// Replaces the snapshot with every habit in the repository.
    pub fn list(&mut self) -> HabitStoreResult<&[Habit]> {
        let habits = self
            .repo
            .list_habits()
            .map_err(|err| log_failure("habit_list", HabitStoreError::from(err)))?;

        info!(
            "event=habit_list module=service status=ok count={}",
            habits.len()
        );
        self.snapshot = habits;
        self.loaded = true;
        self.notify();
        Ok(&self.snapshot)
    }

    /// Re-derives the snapshot after a mutation.
    pub fn refresh(&mut self) -> HabitStoreResult<()> {
        self.list().map(|_| ())
    }

    /// Creates a habit with no completions, then refreshes.
    ///
    /// An error after the write means the refresh failed; the habit exists.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> HabitStoreResult<HabitId> {
        let draft = HabitDraft::new(name, description)
            .map_err(|err| log_failure("habit_create", err.into()))?;
        let id = self
            .repo
            .create_habit(&draft)
            .map_err(|err| log_failure("habit_create", err.into()))?;

        info!("event=habit_create module=service status=ok habit_id={id}");
        self.refresh()?;
        Ok(id)
    }

    /// Replaces name and description, then refreshes.
    pub fn update(
        &mut self,
        id: &HabitId,
        name: impl Into<String>,
        description: Option<String>,
        history: CompletionHistory,
    ) -> HabitStoreResult<()> {
        let draft = HabitDraft::new(name, description)
            .map_err(|err| log_failure("habit_update", err.into()))?;
        self.repo
            .update_habit(id, &draft, history)
            .map_err(|err| log_failure("habit_update", not_found_as_habit(id, err)))?;

        info!(
            "event=habit_update module=service status=ok habit_id={id} history={}",
            history_label(history)
        );
        self.refresh()
    }

    /// Removes the habit from the repository, then refreshes.
    pub fn delete(&mut self, id: &HabitId) -> HabitStoreResult<()> {
        self.repo
            .delete_habit(id)
            .map_err(|err| log_failure("habit_delete", not_found_as_habit(id, err)))?;

        info!("event=habit_delete module=service status=ok habit_id={id}");
        self.refresh()
    }

    /// Toggles today's completion using the repository's current record.
    ///
    /// Patches the matching snapshot entry in place instead of re-listing and
    /// returns the updated habit.
    pub fn toggle_completion(&mut self, id: &HabitId) -> HabitStoreResult<Habit> {
        let fresh = self
            .repo
            .get_habit(id)
            .map_err(|err| log_failure("habit_toggle", err.into()))?
            .ok_or_else(|| {
                log_failure("habit_toggle", HabitStoreError::HabitNotFound(id.clone()))
            })?;

        let dates = completion::toggle(&fresh.completion_dates, &self.clock);
        let revision = self
            .repo
            .replace_completion_dates(&fresh, &dates)
            .map_err(|err| log_failure("habit_toggle", not_found_as_habit(id, err)))?;

        let updated = Habit {
            completion_dates: dates,
            revision,
            ..fresh
        };
        info!(
            "event=habit_toggle module=service status=ok habit_id={id} completed_today={}",
            updated.is_completed_today(&self.clock)
        );

        if let Some(slot) = self.snapshot.iter_mut().find(|habit| habit.id == updated.id) {
            *slot = updated.clone();
            self.notify();
        }
        Ok(updated)
    }

    fn notify(&self) {
        for (_, subscriber) in &self.subscribers {
            subscriber(&self.snapshot);
        }
    }
}

fn not_found_as_habit(id: &HabitId, err: StoreError) -> HabitStoreError {
    if err.is_not_found() {
        HabitStoreError::HabitNotFound(id.clone())
    } else {
        HabitStoreError::Store(err)
    }
}

fn log_failure(event: &str, err: HabitStoreError) -> HabitStoreError {
    error!(
        "event={event} module=service status=error error_code={} error={err}",
        err.code()
    );
    err
}

fn history_label(history: CompletionHistory) -> &'static str {
    match history {
        CompletionHistory::Keep => "keep",
        CompletionHistory::Reset => "reset",
    }
}
