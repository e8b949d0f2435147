use std::sync::Arc;

use parking_lot::Mutex;
use simulcast_clock::Phase;
use simulcast_core::EngineMode;
use simulcast_events::ErrorCategory;
use tracing::warn;

/// Snapshot of the session's externally visible state, for UI polling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackState {
    pub phase: Phase,
    /// Mode of the active engine; `None` before the first initialization.
    pub engine_mode: Option<EngineMode>,
    pub is_loading: bool,
    pub last_error: Option<ErrorCategory>,
    pub is_muted: bool,
    /// Last computed elapsed position in seconds.
    pub elapsed_seconds: f64,
}

/// Shared mutable state, written only by the session's dispatch loop.
#[derive(Clone, Default)]
pub(crate) struct SharedState {
    inner: Arc<Mutex<PlaybackState>>,
}

impl SharedState {
    pub(crate) fn new(phase: Phase, muted: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PlaybackState {
                phase,
                engine_mode: None,
                is_loading: false,
                last_error: None,
                is_muted: muted,
                elapsed_seconds: 0.0,
            })),
        }
    }

    pub(crate) fn snapshot(&self) -> PlaybackState {
        *self.inner.lock()
    }

    /// Advance the phase. The lifecycle is one-way; a regression is a logic
    /// error upstream and is dropped with a warning.
    pub(crate) fn set_phase(&self, phase: Phase) -> bool {
        let mut state = self.inner.lock();
        if phase < state.phase {
            warn!(current = ?state.phase, requested = ?phase, "phase regression dropped");
            return false;
        }
        if phase == state.phase {
            return false;
        }
        state.phase = phase;
        true
    }

    pub(crate) fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    pub(crate) fn set_engine_mode(&self, mode: EngineMode) {
        self.inner.lock().engine_mode = Some(mode);
    }

    pub(crate) fn set_loading(&self, loading: bool) -> bool {
        let mut state = self.inner.lock();
        let changed = state.is_loading != loading;
        state.is_loading = loading;
        changed
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.inner.lock().is_loading
    }

    pub(crate) fn set_error(&self, category: ErrorCategory) {
        self.inner.lock().last_error = Some(category);
    }

    pub(crate) fn clear_error(&self) {
        self.inner.lock().last_error = None;
    }

    pub(crate) fn set_muted(&self, muted: bool) {
        self.inner.lock().is_muted = muted;
    }

    pub(crate) fn set_elapsed_seconds(&self, seconds: f64) {
        self.inner.lock().elapsed_seconds = seconds;
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            phase: Phase::Upcoming,
            engine_mode: None,
            is_loading: false,
            last_error: None,
            is_muted: true,
            elapsed_seconds: 0.0,
        }
    }
}
