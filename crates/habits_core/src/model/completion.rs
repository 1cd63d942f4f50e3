//! Calendar-day completion tracking.
//!
//! # Responsibility
//! - Answer "was this habit completed on day X" over a list of instants.
//! - Produce the toggled completion list for "today".
//!
//! # Invariants
//! - Days are local midnight-to-midnight, never a rolling 24 hour window.
//! - Toggling off removes every entry on today's local day and nothing else.
//! - Instants that do not map to a local date never match any day.

use chrono::{Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of "now" plus the local calendar used to bucket instants into days.
pub trait Clock {
    /// Current instant in Unix epoch milliseconds.
    fn now_epoch_ms(&self) -> i64;

    /// Local calendar date of an instant.
    fn local_date(&self, epoch_ms: i64) -> Option<NaiveDate>;

    /// Local calendar date of `now_epoch_ms()`.
    fn today(&self) -> Option<NaiveDate> {
        self.local_date(self.now_epoch_ms())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_epoch_ms(&self) -> i64 {
        (**self).now_epoch_ms()
    }

    fn local_date(&self, epoch_ms: i64) -> Option<NaiveDate> {
        (**self).local_date(epoch_ms)
    }
}

/// Wall clock in the machine's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn local_date(&self, epoch_ms: i64) -> Option<NaiveDate> {
        Local
            .timestamp_millis_opt(epoch_ms)
            .single()
            .map(|at| at.date_naive())
    }
}

/// Manually driven clock with a fixed UTC offset.
#[derive(Debug)]
pub struct FixedClock {
    now_ms: AtomicI64,
    offset: FixedOffset,
}

impl FixedClock {
    pub fn new(now_epoch_ms: i64, offset: FixedOffset) -> Self {
        Self {
            now_ms: AtomicI64::new(now_epoch_ms),
            offset,
        }
    }

    /// Builds a clock whose "now" is `local` wall time at `offset`.
    pub fn at_local(local: NaiveDateTime, offset: FixedOffset) -> Self {
        let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
        Self::new(utc.and_utc().timestamp_millis(), offset)
    }

    pub fn set_now(&self, epoch_ms: i64) {
        self.now_ms.store(epoch_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_epoch_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn local_date(&self, epoch_ms: i64) -> Option<NaiveDate> {
        self.offset
            .timestamp_millis_opt(epoch_ms)
            .single()
            .map(|at| at.date_naive())
    }
}

/// True iff any instant in `dates` falls on local calendar `day`.
pub fn is_completed_on(dates: &[i64], day: NaiveDate, clock: &(impl Clock + ?Sized)) -> bool {
    dates
        .iter()
        .any(|&at| clock.local_date(at) == Some(day))
}

/// True iff any instant in `dates` falls on the clock's current local day.
pub fn is_completed_today(dates: &[i64], clock: &(impl Clock + ?Sized)) -> bool {
    match clock.today() {
        Some(today) => is_completed_on(dates, today, clock),
        None => false,
    }
}

/// Returns `dates` without any entry on local calendar `day`.
pub fn without_day(dates: &[i64], day: NaiveDate, clock: &(impl Clock + ?Sized)) -> Vec<i64> {
    dates
        .iter()
        .copied()
        .filter(|&at| clock.local_date(at) != Some(day))
        .collect()
}

/// Toggles today's completion.
///
/// Completed today: every entry on today's local day is removed.
/// Otherwise: the current instant is appended.
pub fn toggle(dates: &[i64], clock: &(impl Clock + ?Sized)) -> Vec<i64> {
    let now = clock.now_epoch_ms();
    if let Some(today) = clock.local_date(now) {
        if is_completed_on(dates, today, clock) {
            return without_day(dates, today, clock);
        }
    }
    let mut toggled = dates.to_vec();
    toggled.push(now);
    toggled
}

#[cfg(test)]
mod tests {
    use super::{is_completed_today, toggle, Clock, FixedClock};
    use chrono::{Duration, FixedOffset, NaiveDate};

    fn clock_at(day: u32, hour: u32, minute: u32, offset_hours: i32) -> FixedClock {
        let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap();
        let local = NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap();
        FixedClock::at_local(local, offset)
    }

    #[test]
    fn completion_at_2359_is_not_today_at_0001() {
        let clock = clock_at(10, 23, 59, -3);
        let dates = vec![clock.now_epoch_ms()];
        assert!(is_completed_today(&dates, &clock));

        clock.advance(Duration::minutes(2));
        assert!(!is_completed_today(&dates, &clock));
    }

    #[test]
    fn same_day_uses_local_offset_not_utc() {
        // 01:00 local at +09:00 is the previous day in UTC.
        let clock = clock_at(10, 1, 0, 9);
        let earlier_same_local_day = clock.now_epoch_ms() - Duration::minutes(30).num_milliseconds();
        assert!(is_completed_today(&[earlier_same_local_day], &clock));

        let before_local_midnight = clock.now_epoch_ms() - Duration::hours(2).num_milliseconds();
        assert!(!is_completed_today(&[before_local_midnight], &clock));
    }

    #[test]
    fn toggle_off_removes_only_today_entries() {
        let clock = clock_at(10, 12, 0, 0);
        let now = clock.now_epoch_ms();
        let yesterday = now - Duration::days(1).num_milliseconds();
        let dates = vec![yesterday, now - 1_000, now - 2_000];

        assert_eq!(toggle(&dates, &clock), vec![yesterday]);
    }

    #[test]
    fn toggle_on_appends_current_instant() {
        let clock = clock_at(10, 8, 30, 2);
        let yesterday = clock.now_epoch_ms() - Duration::days(1).num_milliseconds();

        let toggled = toggle(&[yesterday], &clock);
        assert_eq!(toggled, vec![yesterday, clock.now_epoch_ms()]);
    }

    #[test]
    fn toggle_twice_restores_original_list() {
        let clock = clock_at(10, 18, 0, 1);
        let older = clock.now_epoch_ms() - Duration::days(3).num_milliseconds();
        let original = vec![older];

        let once = toggle(&original, &clock);
        let twice = toggle(&once, &clock);
        assert_eq!(twice, original);
    }

    #[test]
    fn unmappable_instant_never_matches() {
        let clock = clock_at(10, 12, 0, 0);
        assert!(!is_completed_today(&[i64::MAX], &clock));
    }
}
