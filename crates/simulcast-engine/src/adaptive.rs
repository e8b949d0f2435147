//! Manifest-based adaptive playback engine.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;
use simulcast_core::{ContentLocator, EngineMode};
use simulcast_events::{EngineEvent, EngineFailure, EventBus};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::{
    engine::{MediaEngine, Transport},
    error::{EngineError, EngineResult},
    loader::{LoaderError, MediaLoader},
    surface::VideoSurface,
};

/// Playback engine consuming a segmented streaming manifest.
///
/// The manifest fetch runs on a spawned task and reports back through the
/// bus: [`EngineEvent::MediaReady`] on success, followed by one
/// [`EngineEvent::SegmentBuffered`] per segment the manifest named, or
/// [`EngineEvent::Fatal`] with a manifest or network failure. Construction
/// attaches the engine to the surface; [`MediaEngine::shutdown`] detaches
/// it exactly once.
pub struct AdaptiveEngine {
    transport: Transport,
    manifest_url: Url,
    loader: Arc<dyn MediaLoader>,
    cancel: CancellationToken,
    load_task: Mutex<Option<JoinHandle<()>>>,
    shut: AtomicBool,
}

impl AdaptiveEngine {
    /// Construct and attach to the surface.
    pub fn new(
        surface: Arc<VideoSurface>,
        locator: &ContentLocator,
        loader: Arc<dyn MediaLoader>,
        bus: EventBus,
        generation: u64,
    ) -> EngineResult<Arc<Self>> {
        let manifest_url = locator
            .as_url()
            .cloned()
            .ok_or_else(|| EngineError::NotAdaptive(locator.to_string()))?;
        surface.attach(EngineMode::Adaptive)?;
        Ok(Arc::new(Self {
            transport: Transport {
                surface,
                bus,
                mode: EngineMode::Adaptive,
                generation,
            },
            manifest_url,
            loader,
            cancel: CancellationToken::new(),
            load_task: Mutex::new(None),
            shut: AtomicBool::new(false),
        }))
    }

    fn map_failure(err: &LoaderError) -> EngineFailure {
        match err {
            LoaderError::Timeout | LoaderError::Connect(_) => EngineFailure::Network {
                reason: err.to_string(),
            },
            LoaderError::Http { .. } | LoaderError::InvalidManifest(_) => {
                EngineFailure::ManifestLoad {
                    reason: err.to_string(),
                }
            }
            _ => EngineFailure::Other {
                reason: err.to_string(),
            },
        }
    }
}

impl MediaEngine for AdaptiveEngine {
    fn mode(&self) -> EngineMode {
        EngineMode::Adaptive
    }

    fn start_load(&self) {
        let loader = Arc::clone(&self.loader);
        let url = self.manifest_url.clone();
        let bus = self.transport.bus.clone();
        let generation = self.transport.generation;
        let cancel = self.cancel.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                result = loader.load_manifest(url.clone()) => match result {
                    Ok(desc) => {
                        debug!(%url, ?desc.duration, variants = desc.variant_count, "manifest loaded");
                        bus.publish_engine(
                            EngineMode::Adaptive,
                            generation,
                            EngineEvent::MediaReady { duration: desc.duration },
                        );
                        // The initial buffer fill, reported segment by
                        // segment so the session can run its loose drift
                        // pass on each append.
                        for sequence in 0..desc.segment_count as u64 {
                            bus.publish_engine(
                                EngineMode::Adaptive,
                                generation,
                                EngineEvent::SegmentBuffered { sequence },
                            );
                        }
                    }
                    Err(err) => {
                        warn!(%url, %err, "manifest load failed");
                        bus.publish_engine(
                            EngineMode::Adaptive,
                            generation,
                            EngineEvent::Fatal { failure: Self::map_failure(&err) },
                        );
                    }
                }
            }
        });

        // One outstanding load at a time.
        if let Some(prev) = self.load_task.lock().replace(handle) {
            prev.abort();
        }
    }

    fn play(&self) {
        self.transport.play();
    }

    fn pause(&self) {
        self.transport.pause();
    }

    fn seek(&self, seconds: f64) {
        self.transport.seek(seconds);
    }

    fn position(&self) -> f64 {
        self.transport.position()
    }

    fn recover_media_error(&self) -> EngineResult<()> {
        debug!("adaptive media-error recovery: reloading manifest");
        self.start_load();
        Ok(())
    }

    fn resume_loading(&self) {
        debug!("adaptive engine resuming data loading");
        self.start_load();
    }

    fn shutdown(&self) {
        if self.shut.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cancel.cancel();
        if let Some(task) = self.load_task.lock().take() {
            task.abort();
        }
        self.transport.surface.detach();
        debug!("adaptive engine shut down");
    }
}

impl Drop for AdaptiveEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
