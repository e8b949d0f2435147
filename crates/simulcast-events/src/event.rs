use std::time::Duration;

use simulcast_clock::Phase;
use simulcast_core::EngineMode;

use crate::failure::{EngineFailure, ErrorCategory};

/// Unified event for the whole playback pipeline.
///
/// Engine events are tagged with the mode and generation of the engine that
/// produced them, so a dispatcher can discard events queued by an engine
/// that has since been torn down. The generation disambiguates same-mode
/// swaps (a retry that rebuilds the direct engine), which the mode alone
/// cannot.
#[derive(Clone, Debug)]
pub enum Event {
    /// Event from the currently (or formerly) active playback engine.
    Engine {
        mode: EngineMode,
        /// Monotonic engine incarnation, assigned at construction.
        generation: u64,
        event: EngineEvent,
    },
    /// Event from the session orchestrator, for UI-facing layers.
    Session(SessionEvent),
}

impl Event {
    #[must_use]
    pub fn engine(mode: EngineMode, generation: u64, event: EngineEvent) -> Self {
        Self::Engine {
            mode,
            generation,
            event,
        }
    }
}

impl From<SessionEvent> for Event {
    fn from(e: SessionEvent) -> Self {
        Self::Session(e)
    }
}

/// Events emitted by a playback engine.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum EngineEvent {
    /// The engine started loading its media description.
    LoadingStarted,
    /// Media description loaded; playback can be seeded and started.
    MediaReady { duration: Option<Duration> },
    /// Playback started or resumed.
    Playing,
    /// Playback paused (user action or stall).
    Paused,
    /// A seek completed at the engine level.
    Seeked { to_seconds: f64 },
    /// The adaptive engine appended a buffered segment.
    SegmentBuffered { sequence: u64 },
    /// The runtime's autoplay policy refused an unmuted start.
    AutoplayBlocked,
    /// Playback stalled waiting for data.
    Stalled,
    /// Fatal engine failure; input to the error classifier.
    Fatal { failure: EngineFailure },
    /// The underlying asset played to its end.
    EndOfStream,
}

/// Events emitted by the session orchestrator for UI-facing layers.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum SessionEvent {
    PhaseChanged { phase: Phase },
    /// Waiting-room countdown tick.
    Countdown { remaining: Duration },
    EngineSwapped { from: EngineMode, to: EngineMode },
    LoadingChanged { loading: bool },
    DriftCorrected { from_seconds: f64, to_seconds: f64 },
    PlaybackFailed { category: ErrorCategory },
    MuteChanged { muted: bool },
    FullscreenRequested,
    Ended,
}
