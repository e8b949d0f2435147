use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;
use portable_atomic::AtomicF64;
use simulcast_core::EngineMode;
use simulcast_events::{EventBus, SessionEvent};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Runtime playback policy for the surface.
#[derive(Clone, Copy, Debug)]
pub struct SurfacePolicy {
    /// Autoplay is only permitted while muted (the common browser policy).
    pub autoplay_requires_mute: bool,
}

impl Default for SurfacePolicy {
    fn default() -> Self {
        Self {
            autoplay_requires_mute: true,
        }
    }
}

/// The single shared video-output resource for one viewer session.
///
/// Exactly one engine may be attached at a time; [`VideoSurface::attach`]
/// fails while another engine holds the surface, which makes
/// "fully tear down before constructing the next engine" checkable instead
/// of a convention. Position and transport flags live here so that a swap
/// from adaptive to direct keeps the viewer's state.
#[derive(Debug)]
pub struct VideoSurface {
    position: AtomicF64,
    paused: AtomicBool,
    muted: AtomicBool,
    user_activated: AtomicBool,
    attached: Mutex<Option<EngineMode>>,
    policy: SurfacePolicy,
    bus: EventBus,
}

impl VideoSurface {
    #[must_use]
    pub fn new(policy: SurfacePolicy, bus: EventBus) -> Arc<Self> {
        Arc::new(Self {
            position: AtomicF64::new(0.0),
            paused: AtomicBool::new(true),
            muted: AtomicBool::new(true),
            user_activated: AtomicBool::new(false),
            attached: Mutex::new(None),
            policy,
            bus,
        })
    }

    /// Attach an engine. Fails while another engine holds the surface.
    pub fn attach(&self, mode: EngineMode) -> EngineResult<()> {
        let mut attached = self.attached.lock();
        if let Some(held_by) = *attached {
            return Err(EngineError::SurfaceBusy(held_by));
        }
        *attached = Some(mode);
        debug!(%mode, "engine attached to surface");
        Ok(())
    }

    /// Release the surface. Safe to call when already detached.
    pub fn detach(&self) {
        let mut attached = self.attached.lock();
        if let Some(mode) = attached.take() {
            debug!(%mode, "engine detached from surface");
        }
    }

    #[must_use]
    pub fn attached_mode(&self) -> Option<EngineMode> {
        *self.attached.lock()
    }

    /// Current playback position in seconds.
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position.load(Ordering::Relaxed)
    }

    /// Set the playback position, clamped to zero.
    pub fn set_position(&self, seconds: f64) {
        self.position.store(seconds.max(0.0), Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    /// Mute or unmute, publishing the change for UI layers.
    pub fn set_muted(&self, muted: bool) {
        let was = self.muted.swap(muted, Ordering::AcqRel);
        if was != muted {
            self.bus.publish(SessionEvent::MuteChanged { muted });
        }
    }

    /// Record a user gesture. After activation the autoplay policy no
    /// longer restricts unmuted playback.
    pub fn mark_user_activation(&self) {
        self.user_activated.store(true, Ordering::Release);
    }

    /// Whether the runtime's autoplay policy would refuse a play right now.
    #[must_use]
    pub fn autoplay_blocked(&self) -> bool {
        self.policy.autoplay_requires_mute
            && !self.is_muted()
            && !self.user_activated.load(Ordering::Acquire)
    }

    /// Ask the host runtime for fullscreen. Delegated upward as an event.
    pub fn request_fullscreen(&self) {
        self.bus.publish(SessionEvent::FullscreenRequested);
    }
}
