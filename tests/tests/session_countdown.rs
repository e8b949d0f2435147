//! Waiting-room behavior: countdown ticks and the flip to live.
//!
//! These run on the real clock because the phase boundary is wall-clock
//! time; the scheduled start sits one second out so the flip happens fast.

use std::sync::Arc;

use chrono::Utc;
use simulcast_clock::Phase;
use simulcast_core::{ContentLocator, EngineMode};
use simulcast_engine::{RuntimeProbe, testkit::FakeLoader};
use simulcast_events::{Event, SessionEvent};
use simulcast_session::{BroadcastSession, LiveSession, SyncOptions};
use tokio::sync::broadcast;

async fn wait_for(
    rx: &mut broadcast::Receiver<Event>,
    pred: impl Fn(&Event) -> bool,
) -> Event {
    loop {
        match rx.recv().await {
            Ok(event) if pred(&event) => return event,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => panic!("bus closed"),
        }
    }
}

#[tokio::test]
async fn countdown_flips_to_live_at_the_boundary() {
    simulcast_tests::init_tracing();
    let start = Utc::now() + chrono::Duration::seconds(1);
    let descriptor = BroadcastSession::new(
        start.to_rfc3339(),
        ContentLocator::parse("https://cdn.example.com/class.m3u8").unwrap(),
    );
    let session = LiveSession::start_with(
        descriptor,
        SyncOptions::default(),
        Arc::new(FakeLoader::new()),
        Arc::new(RuntimeProbe),
    )
    .unwrap();
    assert_eq!(session.state().phase, Phase::Upcoming);
    let mut rx = session.subscribe();

    // Countdown ticks arrive while waiting.
    wait_for(&mut rx, |e| {
        matches!(e, Event::Session(SessionEvent::Countdown { .. }))
    })
    .await;

    // Then the phase flips and the engine comes up.
    let event = wait_for(&mut rx, |e| {
        matches!(e, Event::Session(SessionEvent::PhaseChanged { .. }))
    })
    .await;
    assert!(matches!(
        event,
        Event::Session(SessionEvent::PhaseChanged { phase: Phase::Live })
    ));

    wait_for(&mut rx, |e| {
        matches!(e, Event::Session(SessionEvent::LoadingChanged { loading: true }))
    })
    .await;
    assert_eq!(session.state().engine_mode, Some(EngineMode::Adaptive));
}
