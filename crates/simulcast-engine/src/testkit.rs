//! In-memory loader for exercising the engines without a network.

use std::{collections::VecDeque, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use simulcast_core::ContentLocator;
use url::Url;

use crate::loader::{LoaderResult, MediaDescription, MediaLoader};

/// Scripted [`MediaLoader`]: queued responses are returned in order, and an
/// empty queue yields a successful 30-minute description. An optional delay
/// makes load-timeout paths reachable under `tokio::time::pause`.
#[derive(Default)]
pub struct FakeLoader {
    manifests: Mutex<VecDeque<LoaderResult<MediaDescription>>>,
    probes: Mutex<VecDeque<LoaderResult<MediaDescription>>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next `load_manifest` response.
    pub fn push_manifest(&self, response: LoaderResult<MediaDescription>) {
        self.manifests.lock().push_back(response);
    }

    /// Queue the next `probe_media` response.
    pub fn push_probe(&self, response: LoaderResult<MediaDescription>) {
        self.probes.lock().push_back(response);
    }

    /// Delay every response by `delay`; pair with `tokio::time::pause`.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    fn default_description() -> MediaDescription {
        MediaDescription {
            duration: Some(Duration::from_secs(30 * 60)),
            variant_count: 1,
            segment_count: 3,
        }
    }

    async fn maybe_delay(&self) {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl MediaLoader for FakeLoader {
    async fn load_manifest(&self, _url: Url) -> LoaderResult<MediaDescription> {
        self.maybe_delay().await;
        let queued = self.manifests.lock().pop_front();
        queued.unwrap_or_else(|| Ok(Self::default_description()))
    }

    async fn probe_media(&self, _locator: ContentLocator) -> LoaderResult<MediaDescription> {
        self.maybe_delay().await;
        let queued = self.probes.lock().pop_front();
        queued.unwrap_or_else(|| Ok(Self::default_description()))
    }
}
