#![forbid(unsafe_code)]

//! Schedule resolution and canonical position math.
//!
//! Everything in this crate is a pure function of `(schedule, now)` so the
//! drift corrector and the waiting-room countdown can be tested without a
//! player. The only side effect lives in [`parse_schedule_or_live`], which
//! logs the fail-open path.

mod phase;
mod schedule;

pub use phase::Phase;
pub use schedule::{
    BroadcastSchedule, ClockError, ClockResult, DEFAULT_EXPIRY_WINDOW, DEFAULT_LIVE_WINDOW,
    normalize_timestamp, parse_schedule, parse_schedule_or_live,
};
