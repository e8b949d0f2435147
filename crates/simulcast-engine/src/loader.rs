//! Media description loading behind a trait, so engines can be exercised
//! without a network.

use std::time::Duration;

use async_trait::async_trait;
use hls_m3u8::{MasterPlaylist, MediaPlaylist};
use simulcast_core::ContentLocator;
use thiserror::Error;
use url::Url;

#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum LoaderError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {status} for {url}")]
    Http { url: Url, status: u16 },

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("media unreadable: {0}")]
    Unreadable(String),
}

pub type LoaderResult<T> = Result<T, LoaderError>;

/// What the loader learned about the media before playback starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaDescription {
    /// Total asset duration, when the description reveals it.
    pub duration: Option<Duration>,
    /// Number of quality variants (1 for direct media).
    pub variant_count: usize,
    /// Number of segments named by a media playlist (0 when the description
    /// has none, as with master playlists and direct media).
    pub segment_count: usize,
}

impl MediaDescription {
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            duration: None,
            variant_count: 1,
            segment_count: 0,
        }
    }
}

/// Loads media descriptions for both engines: the adaptive manifest for the
/// adaptive engine, a reachability probe for the direct engine.
#[async_trait]
pub trait MediaLoader: Send + Sync + 'static {
    async fn load_manifest(&self, url: Url) -> LoaderResult<MediaDescription>;

    async fn probe_media(&self, locator: ContentLocator) -> LoaderResult<MediaDescription>;
}

/// Options for [`HttpLoader`].
#[derive(Clone, Copy, Debug)]
pub struct LoaderOptions {
    /// Per-request timeout (manifest fetch, media probe).
    pub request_timeout: Duration,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl LoaderOptions {
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// [`MediaLoader`] over HTTP.
#[derive(Clone, Debug)]
pub struct HttpLoader {
    inner: reqwest::Client,
    options: LoaderOptions,
}

impl HttpLoader {
    /// # Panics
    ///
    /// Panics if the `reqwest::Client` builder fails to build.
    #[must_use]
    pub fn new(options: LoaderOptions) -> Self {
        let inner = reqwest::Client::builder()
            .build()
            .expect("failed to build reqwest client");
        Self { inner, options }
    }

    fn map_request_error(url: &Url, err: &reqwest::Error) -> LoaderError {
        if err.is_timeout() {
            LoaderError::Timeout
        } else if let Some(status) = err.status() {
            LoaderError::Http {
                url: url.clone(),
                status: status.as_u16(),
            }
        } else {
            LoaderError::Connect(err.to_string())
        }
    }
}

impl Default for HttpLoader {
    fn default() -> Self {
        Self::new(LoaderOptions::default())
    }
}

#[async_trait]
impl MediaLoader for HttpLoader {
    async fn load_manifest(&self, url: Url) -> LoaderResult<MediaDescription> {
        let resp = self
            .inner
            .get(url.clone())
            .timeout(self.options.request_timeout)
            .send()
            .await
            .map_err(|e| Self::map_request_error(&url, &e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LoaderError::Http {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Self::map_request_error(&url, &e))?;
        parse_manifest(&body)
    }

    async fn probe_media(&self, locator: ContentLocator) -> LoaderResult<MediaDescription> {
        match locator {
            ContentLocator::Url(url) => {
                let resp = self
                    .inner
                    .head(url.clone())
                    .timeout(self.options.request_timeout)
                    .send()
                    .await
                    .map_err(|e| Self::map_request_error(&url, &e))?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(LoaderError::Http {
                        url,
                        status: status.as_u16(),
                    });
                }
                Ok(MediaDescription::unknown())
            }
            ContentLocator::Path(path) => {
                tokio::fs::metadata(&path)
                    .await
                    .map_err(|e| LoaderError::Unreadable(format!("{}: {e}", path.display())))?;
                Ok(MediaDescription::unknown())
            }
        }
    }
}

/// Parse an M3U8 manifest into a [`MediaDescription`].
///
/// A media playlist yields the summed segment duration; a master playlist
/// yields the variant count with an unknown duration (the variant playlist
/// would carry it).
pub(crate) fn parse_manifest(input: &str) -> LoaderResult<MediaDescription> {
    if let Ok(media) = MediaPlaylist::try_from(input) {
        let duration: Duration = media
            .segments
            .values()
            .map(|seg| seg.duration.duration())
            .sum();
        return Ok(MediaDescription {
            duration: Some(duration),
            variant_count: 1,
            segment_count: media.segments.num_elements(),
        });
    }

    let master =
        MasterPlaylist::try_from(input).map_err(|e| LoaderError::InvalidManifest(e.to_string()))?;
    Ok(MediaDescription {
        duration: None,
        variant_count: master.variant_streams.len().max(1),
        segment_count: 0,
    })
}
