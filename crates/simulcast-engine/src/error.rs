use simulcast_core::EngineMode;
use thiserror::Error;

use crate::loader::LoaderError;

/// Engine construction and control errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("video surface already attached to the {0} engine")]
    SurfaceBusy(EngineMode),

    #[error("no engine attached to the surface")]
    Detached,

    #[error("adaptive engine requires a manifest URL, got {0}")]
    NotAdaptive(String),

    #[error("media-error recovery unavailable on the {0} engine")]
    RecoveryUnavailable(EngineMode),

    #[error("loader error: {0}")]
    Loader(#[from] LoaderError),
}

pub type EngineResult<T> = Result<T, EngineError>;
