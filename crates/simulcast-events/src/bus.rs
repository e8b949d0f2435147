use simulcast_core::EngineMode;
use tokio::sync::broadcast;

use crate::{EngineEvent, Event};

/// Unified event bus for one viewer session.
///
/// Every component receives a cloned `EventBus` and publishes directly;
/// subscribers see all events from all components. `publish()` is a sync
/// call so engines can emit from any context. With no subscribers, events
/// are silently dropped.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to all subscribers.
    ///
    /// Accepts anything that converts `Into<Event>`, so session events can
    /// be passed directly: `bus.publish(SessionEvent::Ended)`.
    pub fn publish<E: Into<Event>>(&self, event: E) {
        let _ = self.tx.send(event.into());
    }

    /// Publish an engine event tagged with the producing engine's mode and
    /// generation.
    pub fn publish_engine(&self, mode: EngineMode, generation: u64, event: EngineEvent) {
        let _ = self.tx.send(Event::engine(mode, generation, event));
    }

    /// Subscribe to all future events.
    ///
    /// Each subscriber gets an independent receiver; slow subscribers
    /// receive `RecvError::Lagged(n)` instead of blocking producers.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
