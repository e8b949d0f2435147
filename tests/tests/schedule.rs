//! Schedule resolution scenarios across the clock crate.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rstest::rstest;
use simulcast_clock::{
    DEFAULT_EXPIRY_WINDOW, DEFAULT_LIVE_WINDOW, Phase, parse_schedule, parse_schedule_or_live,
};

const START: &str = "2026-03-02T18:00:00+05:30";

fn at(offset_secs: i64) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(START).unwrap().to_utc() + chrono::Duration::seconds(offset_secs)
}

#[rstest]
#[case(-10 * 60, Phase::Upcoming)]
#[case(-1, Phase::Upcoming)]
#[case(0, Phase::Live)]
#[case(90 * 60, Phase::Live)]
#[case(4 * 60 * 60 - 1, Phase::Live)]
#[case(4 * 60 * 60, Phase::Ended)]
#[case(24 * 60 * 60, Phase::Ended)]
fn phase_resolution(#[case] offset_secs: i64, #[case] expected: Phase) {
    let schedule = parse_schedule(START, DEFAULT_LIVE_WINDOW, DEFAULT_EXPIRY_WINDOW).unwrap();
    assert_eq!(schedule.phase_at(at(offset_secs)), expected);
}

#[test]
fn elapsed_tracks_the_wall_clock() {
    let schedule = parse_schedule(START, DEFAULT_LIVE_WINDOW, DEFAULT_EXPIRY_WINDOW).unwrap();
    assert_eq!(schedule.elapsed_at(at(90 * 60)), Duration::from_secs(5400));
    assert_eq!(schedule.elapsed_seconds_at(at(90 * 60)), 5400.0);
    // Before the start the position clamps to zero, it never goes negative.
    assert_eq!(schedule.elapsed_at(at(-600)), Duration::ZERO);
}

#[test]
fn countdown_only_exists_before_the_start() {
    let schedule = parse_schedule(START, DEFAULT_LIVE_WINDOW, DEFAULT_EXPIRY_WINDOW).unwrap();
    assert_eq!(
        schedule.countdown_at(at(-600)),
        Some(Duration::from_secs(600))
    );
    assert_eq!(schedule.countdown_at(at(0)), None);
    assert_eq!(schedule.countdown_at(at(60)), None);
}

#[test]
fn expiry_window_is_honored() {
    let schedule = parse_schedule(START, DEFAULT_LIVE_WINDOW, DEFAULT_EXPIRY_WINDOW).unwrap();
    assert!(!schedule.is_expired_at(at(7 * 24 * 60 * 60 - 1)));
    assert!(schedule.is_expired_at(at(7 * 24 * 60 * 60)));
}

#[test]
fn transport_mangled_offset_still_parses() {
    // `+` arrives as a space after URL decoding.
    let schedule = parse_schedule(
        "2026-03-02T18:00:00 05:30",
        DEFAULT_LIVE_WINDOW,
        DEFAULT_EXPIRY_WINDOW,
    )
    .unwrap();
    assert_eq!(schedule.phase_at(at(60)), Phase::Live);
}

#[test]
fn malformed_timestamp_fails_open_to_live() {
    let now = at(0);
    let schedule =
        parse_schedule_or_live("not-a-timestamp", now, DEFAULT_LIVE_WINDOW, DEFAULT_EXPIRY_WINDOW);
    assert_eq!(schedule.phase_at(now), Phase::Live);
    assert_eq!(schedule.elapsed_seconds_at(now), 0.0);
    assert!(!schedule.is_expired_at(now));
}
