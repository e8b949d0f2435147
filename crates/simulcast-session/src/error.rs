use simulcast_engine::EngineError;
use thiserror::Error;

/// Session construction and control errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The broadcast's expiry window has passed; playback is refused.
    #[error("broadcast expired: scheduled start {scheduled_start} is past the expiry window")]
    Expired { scheduled_start: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type SessionResult<T> = Result<T, SessionError>;
