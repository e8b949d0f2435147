/// Error code reported by the direct engine's underlying media element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum NativeErrorCode {
    Aborted,
    Network,
    Decode,
    SourceNotSupported,
    Unknown,
}

impl NativeErrorCode {
    /// Map a raw media-element error code to a category.
    #[must_use]
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::Aborted,
            2 => Self::Network,
            3 => Self::Decode,
            4 => Self::SourceNotSupported,
            _ => Self::Unknown,
        }
    }

    /// Human-readable category for the failure banner.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Aborted => "playback aborted",
            Self::Network => "network error",
            Self::Decode => "decode error",
            Self::SourceNotSupported => "source not supported",
            Self::Unknown => "unknown playback error",
        }
    }
}

/// Fatal failure signal from a playback engine, before classification.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineFailure {
    /// The adaptive manifest could not be loaded (404, unreachable, invalid).
    ManifestLoad { reason: String },
    /// Transient network failure reported by the adaptive engine.
    Network { reason: String },
    /// Media/decode failure; `recoverable` means the engine offers a
    /// built-in recovery path.
    Media { reason: String, recoverable: bool },
    /// The direct engine's media element reported an error code.
    Native { code: NativeErrorCode },
    /// Anything else fatal.
    Other { reason: String },
}

/// Classified error category, as surfaced to status banners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCategory {
    ManifestLoad,
    TransientNetwork,
    Media,
    Native(NativeErrorCode),
    Unclassified,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManifestLoad => write!(f, "stream manifest unavailable"),
            Self::TransientNetwork => write!(f, "network interruption"),
            Self::Media => write!(f, "media playback error"),
            Self::Native(code) => write!(f, "{}", code.describe()),
            Self::Unclassified => write!(f, "playback failed"),
        }
    }
}
