//! Sessions joined after the live window: replay semantics and expiry.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use simulcast_clock::Phase;
use simulcast_core::ContentLocator;
use simulcast_engine::{RuntimeProbe, testkit::FakeLoader};
use simulcast_events::{EngineEvent, Event, SessionEvent};
use simulcast_session::{BroadcastSession, LiveSession, SessionError, SyncOptions};
use tokio::sync::broadcast;

fn descriptor(hours_ago: i64) -> BroadcastSession {
    let start = Utc::now() - chrono::Duration::hours(hours_ago);
    BroadcastSession::new(
        start.to_rfc3339(),
        ContentLocator::parse("https://cdn.example.com/class.m3u8").unwrap(),
    )
}

fn start(descriptor: BroadcastSession) -> LiveSession {
    simulcast_tests::init_tracing();
    LiveSession::start_with(
        descriptor,
        SyncOptions::default(),
        Arc::new(FakeLoader::new()),
        Arc::new(RuntimeProbe),
    )
    .unwrap()
}

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

#[tokio::test(start_paused = true)]
async fn ended_broadcast_plays_as_a_replay() {
    let session = start(descriptor(5));
    assert_eq!(session.state().phase, Phase::Ended);

    let mut rx = session.subscribe();
    wait_for(&mut rx, |e| {
        matches!(
            e,
            Event::Engine {
                event: EngineEvent::Playing,
                ..
            }
        )
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn pause_and_seek_are_honored_after_the_broadcast_ends() {
    let session = start(descriptor(5));
    let mut rx = session.subscribe();
    wait_for(&mut rx, |e| {
        matches!(
            e,
            Event::Engine {
                event: EngineEvent::Playing,
                ..
            }
        )
    })
    .await;

    session.seek(42.0);
    wait_for(&mut rx, |e| {
        matches!(
            e,
            Event::Engine {
                event: EngineEvent::Seeked { to_seconds },
                ..
            } if *to_seconds == 42.0
        )
    })
    .await;

    session.pause();
    wait_for(&mut rx, |e| {
        matches!(
            e,
            Event::Engine {
                event: EngineEvent::Paused,
                ..
            }
        )
    })
    .await;

    // No corrective play or snap-back follows; the next activity the bus
    // sees is the mute toggle we issue.
    session.toggle_mute();
    loop {
        match rx.recv().await.unwrap() {
            Event::Engine {
                event: EngineEvent::Playing | EngineEvent::Seeked { .. },
                ..
            } => panic!("replay controls were overridden after the broadcast ended"),
            Event::Session(SessionEvent::MuteChanged { .. }) => break,
            _ => {}
        }
    }
}

/// Runs on the real clock: the live window closes one second after the
/// session starts, which needs wall time to pass.
#[tokio::test]
async fn the_live_window_closing_flips_the_phase_to_ended() {
    simulcast_tests::init_tracing();
    let start = Utc::now() - chrono::Duration::seconds(60);
    let descriptor = BroadcastSession::new(
        start.to_rfc3339(),
        ContentLocator::parse("https://cdn.example.com/class.m3u8").unwrap(),
    )
    .with_live_window(Duration::from_secs(61));
    let options = SyncOptions::default().with_drift_interval(Duration::from_millis(200));
    let session = LiveSession::start_with(
        descriptor,
        options,
        Arc::new(FakeLoader::new()),
        Arc::new(RuntimeProbe),
    )
    .unwrap();
    assert_eq!(session.state().phase, Phase::Live);
    let mut rx = session.subscribe();

    let event = wait_for(&mut rx, |e| {
        matches!(e, Event::Session(SessionEvent::PhaseChanged { .. }))
    })
    .await;
    assert!(matches!(
        event,
        Event::Session(SessionEvent::PhaseChanged { phase: Phase::Ended })
    ));
    assert_eq!(session.state().phase, Phase::Ended);

    // Replay controls now stick, and the sync timers stay quiet: no
    // correction lands between the pause and the mute toggle we issue.
    session.pause();
    wait_for(&mut rx, |e| {
        matches!(
            e,
            Event::Engine {
                event: EngineEvent::Paused,
                ..
            }
        )
    })
    .await;
    session.toggle_mute();
    loop {
        match rx.recv().await.unwrap() {
            Event::Session(SessionEvent::DriftCorrected { .. })
            | Event::Session(SessionEvent::Countdown { .. }) => {
                panic!("sync timers kept running after the broadcast ended")
            }
            Event::Session(SessionEvent::MuteChanged { .. }) => break,
            _ => {}
        }
    }
}

#[tokio::test(start_paused = true)]
async fn expired_broadcast_refuses_playback() {
    simulcast_tests::init_tracing();
    let result = LiveSession::start_with(
        descriptor(8 * 24),
        SyncOptions::default(),
        Arc::new(FakeLoader::new()),
        Arc::new(RuntimeProbe),
    );
    assert!(matches!(result, Err(SessionError::Expired { .. })));
}
