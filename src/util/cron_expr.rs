//! Cron expression parsing and fire-time lookup.
//!
//! Expressions follow the `cron` crate's 6-field layout
//! (`sec min hour day-of-month month day-of-week`). Standard 5-field
//! expressions get a `0` seconds field prepended.

use std::str::FromStr;

use chrono::{NaiveDateTime, TimeZone, Utc};
use cron::Schedule;

/// Prepend a seconds field to 5-field expressions; pass others through.
pub fn normalize_cron(expr: &str) -> String {
    let trimmed = expr.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Parse a 5- or 6-field cron expression.
pub fn parse_cron(expr: &str) -> Result<Schedule, String> {
    Schedule::from_str(&normalize_cron(expr)).map_err(|e| format!("invalid cron `{expr}`: {e}"))
}

/// First fire time strictly after `now`.
///
/// Times are cluster-local wall-clock values without an offset, so the
/// schedule is walked on a fixed-offset calendar and no DST shifts apply.
pub fn next_fire_after(schedule: &Schedule, now: NaiveDateTime) -> Option<NaiveDateTime> {
    schedule
        .after(&Utc.from_utc_datetime(&now))
        .next()
        .map(|at| at.naive_utc())
}
