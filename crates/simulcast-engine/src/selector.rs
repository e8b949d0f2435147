//! Engine selection and the one-directional adaptive-to-direct fallback.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use parking_lot::Mutex;
use simulcast_core::{ContentLocator, EngineMode, SourceKind};
use simulcast_events::{EngineEvent, EventBus};
use tracing::{debug, info};

use crate::{
    adaptive::AdaptiveEngine,
    direct::DirectEngine,
    engine::MediaEngine,
    error::EngineResult,
    loader::MediaLoader,
    probe::AdaptiveProbe,
    surface::VideoSurface,
};

/// Owns the surface and the currently active engine.
///
/// Selection favours the adaptive engine whenever the source is a manifest
/// URL and the runtime supports adaptive playback; everything else gets the
/// direct engine. Once a direct engine has been active for this source the
/// choice is latched: later (re)initializations never promote back to
/// adaptive, so a fallback decision sticks across retries.
///
/// Every engine built here gets a fresh generation number, stamped onto the
/// events it publishes. Consumers compare against [`EngineSelector::generation`]
/// to discard events queued by a torn-down predecessor, including one of the
/// same mode.
pub struct EngineSelector {
    surface: Arc<VideoSurface>,
    locator: ContentLocator,
    loader: Arc<dyn MediaLoader>,
    probe: Arc<dyn AdaptiveProbe>,
    bus: EventBus,
    active: Mutex<Option<Arc<dyn MediaEngine>>>,
    direct_latched: AtomicBool,
    generation: AtomicU64,
}

impl EngineSelector {
    pub fn new(
        surface: Arc<VideoSurface>,
        locator: ContentLocator,
        loader: Arc<dyn MediaLoader>,
        probe: Arc<dyn AdaptiveProbe>,
        bus: EventBus,
    ) -> Self {
        Self {
            surface,
            locator,
            loader,
            probe,
            bus,
            active: Mutex::new(None),
            direct_latched: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Pick the mode for the next engine. The runtime probe is consulted
    /// fresh on every call; the direct latch overrides everything.
    fn decide(&self, hint: Option<EngineMode>) -> EngineMode {
        if self.direct_latched.load(Ordering::Acquire) {
            return EngineMode::Direct;
        }
        if hint == Some(EngineMode::Direct) {
            return EngineMode::Direct;
        }
        let is_manifest_url = self.locator.kind() == SourceKind::AdaptiveManifest
            && self.locator.as_url().is_some();
        if is_manifest_url && self.probe.adaptive_supported() {
            EngineMode::Adaptive
        } else {
            EngineMode::Direct
        }
    }

    /// Tear down the previous engine (if any), build the selected one, and
    /// kick off its load. Returns the mode that was activated.
    pub fn initialize(&self, hint: Option<EngineMode>) -> EngineResult<EngineMode> {
        if let Some(old) = self.active.lock().take() {
            old.shutdown();
        }

        let mode = self.decide(hint);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let engine: Arc<dyn MediaEngine> = match mode {
            EngineMode::Adaptive => AdaptiveEngine::new(
                Arc::clone(&self.surface),
                &self.locator,
                Arc::clone(&self.loader),
                self.bus.clone(),
                generation,
            )?,
            EngineMode::Direct => {
                self.direct_latched.store(true, Ordering::Release);
                DirectEngine::new(
                    Arc::clone(&self.surface),
                    self.locator.clone(),
                    Arc::clone(&self.loader),
                    self.bus.clone(),
                    generation,
                )?
            }
        };

        debug!(%mode, generation, locator = %self.locator, "engine initialized");
        self.bus
            .publish_engine(mode, generation, EngineEvent::LoadingStarted);
        engine.start_load();
        *self.active.lock() = Some(engine);
        Ok(mode)
    }

    /// Swap a failing adaptive engine for a direct one.
    ///
    /// Returns `Ok(true)` when a swap happened and `Ok(false)` when the
    /// direct engine was already active, so repeated escalations are
    /// harmless.
    pub fn force_fallback_to_direct(&self) -> EngineResult<bool> {
        if self.mode() == Some(EngineMode::Direct) {
            return Ok(false);
        }
        info!(locator = %self.locator, "falling back to the direct engine");
        self.initialize(Some(EngineMode::Direct))?;
        Ok(true)
    }

    /// Mode of the currently active engine.
    #[must_use]
    pub fn mode(&self) -> Option<EngineMode> {
        self.active.lock().as_ref().map(|engine| engine.mode())
    }

    /// Handle to the currently active engine.
    #[must_use]
    pub fn active(&self) -> Option<Arc<dyn MediaEngine>> {
        self.active.lock().clone()
    }

    /// Generation of the most recently built engine. Engine events carrying
    /// any other generation come from a torn-down predecessor.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn surface(&self) -> &Arc<VideoSurface> {
        &self.surface
    }

    /// Shut down the active engine and release the surface.
    pub fn shutdown(&self) {
        if let Some(engine) = self.active.lock().take() {
            engine.shutdown();
        }
    }
}

impl Drop for EngineSelector {
    fn drop(&mut self) {
        self.shutdown();
    }
}
