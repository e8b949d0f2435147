use std::time::Duration;

use derive_setters::Setters;

/// Tuning knobs for live-lock and recovery.
///
/// Defaults match the observed production behavior; the buffered-append
/// pass deliberately keeps a looser threshold than the periodic pass so a
/// burst of segment appends does not trigger a seek storm.
#[derive(Clone, Copy, Debug, Setters)]
#[setters(prefix = "with_")]
pub struct SyncOptions {
    /// Maximum tolerated |actual - target| before a corrective seek.
    pub drift_threshold: Duration,
    /// Period of the drift-corrector interval task.
    pub drift_interval: Duration,
    /// Looser threshold for the pass run on each segment append.
    pub buffered_drift_threshold: Duration,
    /// Deadline for an adaptive load before escalating to the direct engine.
    pub load_timeout: Duration,
    /// Delay before resuming loading after a transient network failure.
    pub network_retry_delay: Duration,
    /// Period of the waiting-room countdown tick.
    pub countdown_interval: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            drift_threshold: Duration::from_secs(2),
            drift_interval: Duration::from_secs(5),
            buffered_drift_threshold: Duration::from_secs(10),
            load_timeout: Duration::from_secs(10),
            network_retry_delay: Duration::from_secs(2),
            countdown_interval: Duration::from_secs(1),
        }
    }
}

impl SyncOptions {
    pub(crate) fn drift_threshold_secs(&self) -> f64 {
        self.drift_threshold.as_secs_f64()
    }

    pub(crate) fn buffered_drift_threshold_secs(&self) -> f64 {
        self.buffered_drift_threshold.as_secs_f64()
    }
}
