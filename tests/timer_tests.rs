// Integration tests for the session countdown
//
// These tests tick a fixed-duration timer with explicit timestamps and
// check the one-minute warning and the single expiry.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use interview_proctor::session::{SessionTimer, TimerEvent};
use std::time::Duration;

#[test]
fn test_warning_and_time_up_fire_once() {
    let start = Utc.with_ymd_and_hms(2025, 10, 27, 9, 0, 0).unwrap();
    let mut timer = SessionTimer::new(Duration::from_secs(300), start);

    let mut warnings = Vec::new();
    let mut time_ups = Vec::new();

    for s in 0..=305 {
        let tick = timer.tick(start + ChronoDuration::seconds(s));
        for event in tick.events {
            match event {
                TimerEvent::Warning { seconds_left } => warnings.push((s, seconds_left)),
                TimerEvent::TimeUp => time_ups.push(s),
            }
        }
    }

    assert_eq!(warnings, vec![(240, 60)]);
    assert_eq!(time_ups, vec![300]);
    assert!(timer.is_expired());
    assert!(timer.has_warned());
}

#[test]
fn test_remaining_rounds_up() {
    let start = Utc.with_ymd_and_hms(2025, 10, 27, 9, 0, 0).unwrap();
    let timer = SessionTimer::new(Duration::from_secs(10), start);

    assert_eq!(timer.remaining_at(start), 10);
    assert_eq!(timer.remaining_at(start + ChronoDuration::milliseconds(500)), 10);
    assert_eq!(timer.remaining_at(start + ChronoDuration::milliseconds(9_001)), 1);
    assert_eq!(timer.remaining_at(start + ChronoDuration::seconds(12)), 0);
}

#[test]
fn test_expired_timer_reports_zero_without_events() {
    let start = Utc.with_ymd_and_hms(2025, 10, 27, 9, 0, 0).unwrap();
    let mut timer = SessionTimer::new(Duration::from_secs(5), start);

    let tick = timer.tick(start + ChronoDuration::seconds(6));
    assert_eq!(tick.events, vec![TimerEvent::TimeUp]);

    let tick = timer.tick(start + ChronoDuration::seconds(7));
    assert_eq!(tick.remaining_seconds, 0);
    assert!(tick.events.is_empty());
}

#[test]
fn test_short_session_warns_on_first_tick() {
    let start = Utc.with_ymd_and_hms(2025, 10, 27, 9, 0, 0).unwrap();
    let mut timer = SessionTimer::new(Duration::from_secs(45), start);

    let tick = timer.tick(start);
    assert_eq!(tick.remaining_seconds, 45);
    assert_eq!(tick.events, vec![TimerEvent::Warning { seconds_left: 45 }]);
}
