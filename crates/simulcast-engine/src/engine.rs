use std::sync::Arc;

use simulcast_core::EngineMode;
use simulcast_events::{EngineEvent, EventBus};
use tracing::debug;

use crate::{error::EngineResult, surface::VideoSurface};

/// Common contract both playback engines implement.
///
/// Control methods are synchronous; anything that takes time (manifest
/// fetch, media probe) runs on a spawned task and reports back through the
/// event bus. Consumers hold the engine through
/// [`EngineSelector::active`](crate::EngineSelector::active), never through
/// a second, stale handle held across a swap.
#[cfg_attr(
    any(test, feature = "test-utils"),
    unimock::unimock(api = MediaEngineMock)
)]
pub trait MediaEngine: Send + Sync + 'static {
    fn mode(&self) -> EngineMode;

    /// Begin (or restart) loading the media description.
    fn start_load(&self);

    /// Attempt to start playback. A refusal by the runtime's autoplay
    /// policy is reported as [`EngineEvent::AutoplayBlocked`], not an error.
    fn play(&self);

    fn pause(&self);

    /// Seek to an absolute position in seconds.
    fn seek(&self, seconds: f64);

    /// Current playback position in seconds.
    fn position(&self) -> f64;

    /// The engine's built-in media-error recovery path, when it has one.
    fn recover_media_error(&self) -> EngineResult<()>;

    /// Resume data loading after a transient network error.
    fn resume_loading(&self);

    /// Tear the engine down: stop background work and release the surface.
    /// Idempotent.
    fn shutdown(&self);
}

/// Transport plumbing shared by both engines: the surface writes plus the
/// matching events.
pub(crate) struct Transport {
    pub(crate) surface: Arc<VideoSurface>,
    pub(crate) bus: EventBus,
    pub(crate) mode: EngineMode,
    pub(crate) generation: u64,
}

impl Transport {
    pub(crate) fn emit(&self, event: EngineEvent) {
        self.bus.publish_engine(self.mode, self.generation, event);
    }

    pub(crate) fn play(&self) {
        if self.surface.autoplay_blocked() {
            debug!(mode = %self.mode, "autoplay refused by runtime policy");
            self.emit(EngineEvent::AutoplayBlocked);
            return;
        }
        if self.surface.is_paused() {
            self.surface.set_paused(false);
            self.emit(EngineEvent::Playing);
        }
    }

    pub(crate) fn pause(&self) {
        if !self.surface.is_paused() {
            self.surface.set_paused(true);
            self.emit(EngineEvent::Paused);
        }
    }

    pub(crate) fn seek(&self, seconds: f64) {
        let clamped = seconds.max(0.0);
        self.surface.set_position(clamped);
        self.emit(EngineEvent::Seeked {
            to_seconds: clamped,
        });
    }

    pub(crate) fn position(&self) -> f64 {
        self.surface.position()
    }
}
