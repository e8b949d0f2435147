#![forbid(unsafe_code)]

//! Shared primitives for the simulcast workspace: content locators,
//! source-kind detection, and the playback-engine mode tag.

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid content locator: {0}")]
    InvalidLocator(String),

    #[error("file path must be absolute: {0}")]
    RelativePath(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Which playback engine is driving the video surface.
///
/// Within one viewer session the mode only ever moves `Adaptive -> Direct`;
/// the reverse transition requires a full session restart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineMode {
    /// Manifest-based adaptive streaming engine.
    Adaptive,
    /// Direct playback of a plain media resource.
    Direct,
}

impl std::fmt::Display for EngineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Adaptive => write!(f, "adaptive"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

/// What the content locator denotes, by extension heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A segmented streaming manifest (`.m3u8`, `.mpd`).
    AdaptiveManifest,
    /// A plain media file played directly.
    MediaFile,
}

/// Where the broadcast asset lives: a remote URL or a local file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentLocator {
    Url(Url),
    Path(PathBuf),
}

impl ContentLocator {
    /// Parse a locator from a URL string or an absolute file path.
    ///
    /// `file://` URLs are normalized to a `Path`. Relative paths are
    /// rejected rather than resolved against an unknowable working
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] for invalid `file://` URLs and relative paths.
    pub fn parse<S: AsRef<str>>(input: S) -> CoreResult<Self> {
        let trimmed = input.as_ref().trim();

        match Url::parse(trimmed) {
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| CoreError::InvalidLocator(trimmed.to_owned()))?;
                Ok(Self::Path(path))
            }
            Ok(url) => Ok(Self::Url(url)),
            Err(_) => {
                let path = PathBuf::from(trimmed);
                if !path.is_absolute() {
                    return Err(CoreError::RelativePath(trimmed.to_owned()));
                }
                Ok(Self::Path(path))
            }
        }
    }

    /// Detect the source kind from the locator's extension.
    ///
    /// Queries and fragments never confuse the heuristic: only the URL path
    /// (or file path) is inspected. Anything that does not look like a
    /// manifest is treated as a plain media file, so the selector can skip
    /// adaptive parsing on content that cannot be adaptive.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        let path = match self {
            Self::Url(url) => url.path().to_ascii_lowercase(),
            Self::Path(path) => path.to_string_lossy().to_ascii_lowercase(),
        };
        if path.ends_with(".m3u8") || path.ends_with(".mpd") {
            SourceKind::AdaptiveManifest
        } else {
            SourceKind::MediaFile
        }
    }

    /// The locator as a URL, when it is one.
    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Self::Url(url) => Some(url),
            Self::Path(_) => None,
        }
    }
}

impl From<Url> for ContentLocator {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl From<PathBuf> for ContentLocator {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl std::fmt::Display for ContentLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}
