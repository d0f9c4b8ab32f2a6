//! Weekend window calendar helpers.
//!
//! All timestamps are cluster-local wall-clock time.

use chrono::{Datelike, Days, NaiveDateTime, NaiveTime, Weekday};

/// Which forecast column applies to a moment in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDay {
    /// Saturday averages apply.
    Saturday,
    /// Sunday averages apply.
    Sunday,
    /// Outside the weekend window.
    Weekday,
}

impl WindowDay {
    /// Classify `now`.
    pub fn of(now: NaiveDateTime) -> Self {
        match now.weekday() {
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
            _ => Self::Weekday,
        }
    }
}

/// Next Monday 00:00 strictly after the current day.
///
/// On a Monday this is the following Monday.
pub fn next_monday_midnight(now: NaiveDateTime) -> NaiveDateTime {
    let days_ahead = 7 - u64::from(now.weekday().num_days_from_monday());
    let date = now
        .date()
        .checked_add_days(Days::new(days_ahead))
        .unwrap_or(now.date());
    date.and_time(NaiveTime::MIN)
}
