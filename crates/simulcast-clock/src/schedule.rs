use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use thiserror::Error;
use tracing::error;

use crate::Phase;

/// Default duration after the scheduled start during which the session is
/// treated as live. Observed call sites range 3-6 hours; 4 is the median.
pub const DEFAULT_LIVE_WINDOW: Duration = Duration::from_secs(4 * 60 * 60);

/// Default duration after which the session is no longer viewable at all.
pub const DEFAULT_EXPIRY_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("malformed schedule timestamp {raw:?}: {source}")]
    MalformedTimestamp {
        raw: String,
        #[source]
        source: chrono::ParseError,
    },
}

pub type ClockResult<T> = Result<T, ClockError>;

/// Immutable schedule metadata for one broadcast session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BroadcastSchedule {
    /// Absolute scheduled start, with the timezone offset it was published in.
    pub scheduled_start: DateTime<FixedOffset>,
    /// How long after `scheduled_start` the session counts as live.
    pub live_window: Duration,
    /// How long after `scheduled_start` the session stays viewable.
    pub expiry_window: Duration,
}

impl BroadcastSchedule {
    #[must_use]
    pub fn new(scheduled_start: DateTime<FixedOffset>) -> Self {
        Self {
            scheduled_start,
            live_window: DEFAULT_LIVE_WINDOW,
            expiry_window: DEFAULT_EXPIRY_WINDOW,
        }
    }

    #[must_use]
    pub fn with_live_window(mut self, window: Duration) -> Self {
        self.live_window = window;
        self
    }

    #[must_use]
    pub fn with_expiry_window(mut self, window: Duration) -> Self {
        self.expiry_window = window;
        self
    }

    /// Resolve the lifecycle phase at `now`.
    #[must_use]
    pub fn phase_at(&self, now: DateTime<Utc>) -> Phase {
        let since_start = now.signed_duration_since(self.scheduled_start);
        if since_start < chrono::Duration::zero() {
            Phase::Upcoming
        } else if since_start.to_std().is_ok_and(|d| d < self.live_window) {
            Phase::Live
        } else {
            Phase::Ended
        }
    }

    /// Canonical broadcast position at `now`, clamped to zero.
    #[must_use]
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.scheduled_start)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// [`Self::elapsed_at`] in seconds, the unit playback engines speak.
    #[must_use]
    pub fn elapsed_seconds_at(&self, now: DateTime<Utc>) -> f64 {
        self.elapsed_at(now).as_secs_f64()
    }

    /// Remaining time until the scheduled start, while still upcoming.
    #[must_use]
    pub fn countdown_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.scheduled_start
            .signed_duration_since(now)
            .to_std()
            .ok()
            .filter(|d| !d.is_zero())
    }

    /// Whether the session has passed its expiry window entirely.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.scheduled_start)
            .to_std()
            .is_ok_and(|d| d >= self.expiry_window)
    }
}

/// Undo the transport-level substitution of `+` by a space in the timezone
/// offset (`2026-03-02T18:00:00 05:30` -> `2026-03-02T18:00:00+05:30`).
#[must_use]
pub fn normalize_timestamp(raw: &str) -> String {
    raw.trim().replace(' ', "+")
}

/// Parse a schedule from a raw RFC 3339 timestamp with timezone offset.
///
/// # Errors
///
/// Returns [`ClockError::MalformedTimestamp`] when the input (after
/// normalization) is not a valid RFC 3339 timestamp.
pub fn parse_schedule(
    raw: &str,
    live_window: Duration,
    expiry_window: Duration,
) -> ClockResult<BroadcastSchedule> {
    let normalized = normalize_timestamp(raw);
    let scheduled_start = DateTime::parse_from_rfc3339(&normalized).map_err(|source| {
        ClockError::MalformedTimestamp {
            raw: raw.to_owned(),
            source,
        }
    })?;
    Ok(BroadcastSchedule::new(scheduled_start)
        .with_live_window(live_window)
        .with_expiry_window(expiry_window))
}

/// Fail-open schedule parsing: a malformed timestamp must not block access.
///
/// On parse failure the schedule degrades to "started at `now`", which
/// resolves `Live` with elapsed zero. The degradation is an error condition
/// and is logged as one, never silently swallowed.
#[must_use]
pub fn parse_schedule_or_live(
    raw: &str,
    now: DateTime<Utc>,
    live_window: Duration,
    expiry_window: Duration,
) -> BroadcastSchedule {
    match parse_schedule(raw, live_window, expiry_window) {
        Ok(schedule) => schedule,
        Err(err) => {
            error!(raw, %err, "schedule timestamp unparsable, failing open to live");
            BroadcastSchedule::new(now.fixed_offset())
                .with_live_window(live_window)
                .with_expiry_window(expiry_window)
        }
    }
}
