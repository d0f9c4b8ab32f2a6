//! Tests for time sources

use chrono::{NaiveDate, TimeDelta};
use taskshift::util::clock::{now_ms, Clock, ManualClock, SystemClock};

#[test]
fn test_manual_clock_set_and_advance() {
    let start = NaiveDate::from_ymd_opt(2025, 5, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let clock = ManualClock::new(start);
    assert_eq!(clock.now(), start);

    clock.advance(TimeDelta::minutes(10));
    assert_eq!(clock.now(), start + TimeDelta::minutes(10));

    clock.set(start);
    assert_eq!(clock.now(), start);
}

#[test]
fn test_system_clock_moves_forward() {
    let first = SystemClock.now();
    let second = SystemClock.now();
    assert!(second >= first);
    assert!(now_ms() > 0);
}
