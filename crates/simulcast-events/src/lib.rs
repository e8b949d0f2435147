#![forbid(unsafe_code)]

//! Event vocabulary and bus for the simulcast pipeline.
//!
//! Engine implementations publish [`EngineEvent`]s, the session orchestrator
//! publishes [`SessionEvent`]s, and every consumer subscribes to the same
//! [`EventBus`]. There are no ad hoc callbacks anywhere in the workspace:
//! if something happened, it is on the bus.

mod bus;
mod event;
mod failure;

pub use bus::EventBus;
pub use event::{Event, EngineEvent, SessionEvent};
pub use failure::{EngineFailure, ErrorCategory, NativeErrorCode};
