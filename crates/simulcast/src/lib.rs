#![forbid(unsafe_code)]

//! # Simulcast
//!
//! Facade crate for pseudo-live broadcast playback: scheduled content is
//! presented as if it were live, with the playback position locked to the
//! wall clock and seeking and pausing suppressed while the broadcast runs.
//!
//! ## Quick start
//!
//! ```no_run
//! use simulcast::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let descriptor = BroadcastSession::new(
//!         "2026-03-02T18:00:00+05:30",
//!         ContentLocator::parse("https://cdn.example.com/class.m3u8")?,
//!     )
//!     .with_subject("physics".to_owned());
//!
//!     let session = LiveSession::start(descriptor, SyncOptions::default())?;
//!     let mut events = session.subscribe();
//!     while let Ok(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod clock {
    pub use simulcast_clock::*;
}

pub mod core {
    pub use simulcast_core::*;
}

pub mod engine {
    pub use simulcast_engine::*;
}

pub mod events {
    pub use simulcast_events::*;
}

pub mod session {
    pub use simulcast_session::*;
}

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    pub use simulcast_clock::{BroadcastSchedule, Phase, parse_schedule};
    pub use simulcast_core::{ContentLocator, EngineMode, SourceKind};
    pub use simulcast_engine::{EngineSelector, MediaEngine, VideoSurface};
    pub use simulcast_events::{EngineEvent, ErrorCategory, Event, EventBus, SessionEvent};
    pub use simulcast_session::{
        BroadcastSession, LiveSession, PlaybackState, SessionError, SyncOptions,
    };
}
