#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc)]

//! Playback engines for the simulcast pipeline.
//!
//! The [`VideoSurface`] is the single shared output resource; exactly one
//! engine (adaptive [`AdaptiveEngine`] or direct [`DirectEngine`]) may be
//! attached to it at a time. The [`EngineSelector`] owns both the surface
//! and the active engine and enforces the one-directional
//! adaptive-to-direct fallback.

mod adaptive;
mod direct;
mod engine;
mod error;
mod loader;
mod probe;
mod selector;
mod surface;

#[cfg(any(test, feature = "test-utils"))]
pub mod testkit;

pub use adaptive::AdaptiveEngine;
pub use direct::DirectEngine;
pub use engine::MediaEngine;
#[cfg(any(test, feature = "test-utils"))]
pub use engine::MediaEngineMock;
pub use error::{EngineError, EngineResult};
pub use loader::{HttpLoader, LoaderError, LoaderOptions, LoaderResult, MediaDescription, MediaLoader};
pub use probe::{AdaptiveProbe, RuntimeProbe};
#[cfg(any(test, feature = "test-utils"))]
pub use probe::AdaptiveProbeMock;
pub use selector::EngineSelector;
pub use surface::{SurfacePolicy, VideoSurface};
