#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc)]

//! Viewer-session orchestration for pseudo-live broadcasts.
//!
//! A [`LiveSession`] ties the schedule clock, the engine selector, and the
//! event bus together: it resolves the broadcast phase, keeps live playback
//! locked to the wall-clock elapsed position, classifies engine failures
//! into recovery actions, and escalates a stuck adaptive load to the direct
//! engine. All reactions run on one serialized task, so no two corrections
//! ever race.

mod classify;
mod error;
mod options;
mod session;
mod state;

pub use classify::{Recovery, classify_failure};
pub use error::{SessionError, SessionResult};
pub use options::SyncOptions;
pub use session::{BroadcastSession, LiveSession};
pub use state::PlaybackState;
