//! Direct playback engine for plain media files.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;
use simulcast_core::{ContentLocator, EngineMode};
use simulcast_events::{EngineEvent, EngineFailure, EventBus, NativeErrorCode};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    engine::{MediaEngine, Transport},
    error::EngineResult,
    loader::{LoaderError, MediaLoader},
    surface::VideoSurface,
};

/// Playback engine that hands the media source straight to the runtime.
///
/// Failures surface as native media-element error codes rather than the
/// adaptive engine's structured manifest/network failures, and there is no
/// built-in media-error recovery: a decode failure here is terminal for
/// the engine.
pub struct DirectEngine {
    transport: Transport,
    locator: ContentLocator,
    loader: Arc<dyn MediaLoader>,
    cancel: CancellationToken,
    load_task: Mutex<Option<JoinHandle<()>>>,
    shut: AtomicBool,
}

impl DirectEngine {
    /// Construct and attach to the surface.
    pub fn new(
        surface: Arc<VideoSurface>,
        locator: ContentLocator,
        loader: Arc<dyn MediaLoader>,
        bus: EventBus,
        generation: u64,
    ) -> EngineResult<Arc<Self>> {
        surface.attach(EngineMode::Direct)?;
        Ok(Arc::new(Self {
            transport: Transport {
                surface,
                bus,
                mode: EngineMode::Direct,
                generation,
            },
            locator,
            loader,
            cancel: CancellationToken::new(),
            load_task: Mutex::new(None),
            shut: AtomicBool::new(false),
        }))
    }

    fn native_code(err: &LoaderError) -> NativeErrorCode {
        match err {
            LoaderError::Timeout | LoaderError::Connect(_) => NativeErrorCode::Network,
            LoaderError::Http { status, .. } if *status >= 500 => NativeErrorCode::Network,
            LoaderError::Http { .. } | LoaderError::Unreadable(_) => {
                NativeErrorCode::SourceNotSupported
            }
            _ => NativeErrorCode::Unknown,
        }
    }
}

impl MediaEngine for DirectEngine {
    fn mode(&self) -> EngineMode {
        EngineMode::Direct
    }

    fn start_load(&self) {
        let loader = Arc::clone(&self.loader);
        let locator = self.locator.clone();
        let bus = self.transport.bus.clone();
        let generation = self.transport.generation;
        let cancel = self.cancel.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                result = loader.probe_media(locator.clone()) => match result {
                    Ok(desc) => {
                        debug!(%locator, ?desc.duration, "media source probed");
                        bus.publish_engine(
                            EngineMode::Direct,
                            generation,
                            EngineEvent::MediaReady { duration: desc.duration },
                        );
                    }
                    Err(err) => {
                        warn!(%locator, %err, "media probe failed");
                        bus.publish_engine(
                            EngineMode::Direct,
                            generation,
                            EngineEvent::Fatal {
                                failure: EngineFailure::Native {
                                    code: Self::native_code(&err),
                                },
                            },
                        );
                    }
                }
            }
        });

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
        Err(crate::error::EngineError::RecoveryUnavailable(
            EngineMode::Direct,
        ))
    }

    fn resume_loading(&self) {
        debug!("direct engine resuming data loading");
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
        debug!("direct engine shut down");
    }
}

impl Drop for DirectEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
