//! End-to-end behavior of a session joined mid-broadcast.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use simulcast_core::{ContentLocator, EngineMode};
use simulcast_engine::{LoaderError, RuntimeProbe, testkit::FakeLoader};
use simulcast_events::{EngineEvent, ErrorCategory, Event, SessionEvent};
use simulcast_session::{BroadcastSession, LiveSession, SyncOptions};
use tokio::sync::broadcast;
use url::Url;

fn live_descriptor(seconds_ago: i64, locator: &str) -> BroadcastSession {
    let start = Utc::now() - chrono::Duration::seconds(seconds_ago);
    BroadcastSession::new(start.to_rfc3339(), ContentLocator::parse(locator).unwrap())
}

fn start(descriptor: BroadcastSession, loader: FakeLoader) -> LiveSession {
    simulcast_tests::init_tracing();
    LiveSession::start_with(
        descriptor,
        SyncOptions::default(),
        Arc::new(loader),
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

fn is_playing(event: &Event) -> bool {
    matches!(
        event,
        Event::Engine {
            event: EngineEvent::Playing,
            ..
        }
    )
}

#[tokio::test(start_paused = true)]
async fn joins_at_the_elapsed_position_and_plays() {
    let session = start(
        live_descriptor(300, "https://cdn.example.com/class.m3u8"),
        FakeLoader::new(),
    );
    let mut rx = session.subscribe();

    wait_for(&mut rx, is_playing).await;

    let state = session.state();
    assert_eq!(state.engine_mode, Some(EngineMode::Adaptive));
    assert!(state.elapsed_seconds >= 299.0);
    assert!(!state.is_loading);
    assert!(state.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn viewer_seek_snaps_back_while_live() {
    let session = start(
        live_descriptor(300, "https://cdn.example.com/class.m3u8"),
        FakeLoader::new(),
    );
    let mut rx = session.subscribe();
    wait_for(&mut rx, is_playing).await;

    session.seek(5000.0);

    // The viewer's seek lands first, then the live-lock snaps it back.
    wait_for(&mut rx, |e| {
        matches!(
            e,
            Event::Engine {
                event: EngineEvent::Seeked { to_seconds },
                ..
            } if *to_seconds == 5000.0
        )
    })
    .await;
    let snapped = wait_for(&mut rx, |e| {
        matches!(
            e,
            Event::Engine {
                event: EngineEvent::Seeked { to_seconds },
                ..
            } if *to_seconds < 4000.0
        )
    })
    .await;
    let Event::Engine {
        event: EngineEvent::Seeked { to_seconds },
        ..
    } = snapped
    else {
        unreachable!()
    };
    assert!((299.0..400.0).contains(&to_seconds));
}

#[tokio::test(start_paused = true)]
async fn transient_network_failure_resumes_on_the_same_engine() {
    let loader = FakeLoader::new();
    loader.push_manifest(Err(LoaderError::Timeout));
    let session = start(
        live_descriptor(300, "https://cdn.example.com/class.m3u8"),
        loader,
    );
    let mut rx = session.subscribe();

    // The retry happens after the delay, on the adaptive engine, with no
    // engine swap and no user-facing failure.
    let mut saw_swap = false;
    let mut saw_failure = false;
    loop {
        match rx.recv().await.unwrap() {
            Event::Session(SessionEvent::EngineSwapped { .. }) => saw_swap = true,
            Event::Session(SessionEvent::PlaybackFailed { .. }) => saw_failure = true,
            Event::Engine {
                mode,
                event: EngineEvent::MediaReady { .. },
                ..
            } => {
                assert_eq!(mode, EngineMode::Adaptive);
                break;
            }
            _ => {}
        }
    }
    assert!(!saw_swap);
    assert!(!saw_failure);
}

#[tokio::test(start_paused = true)]
async fn manifest_failure_swaps_then_direct_failure_is_surfaced() {
    let loader = FakeLoader::new();
    loader.push_manifest(Err(LoaderError::Http {
        url: Url::parse("https://cdn.example.com/class.m3u8").unwrap(),
        status: 404,
    }));
    loader.push_probe(Err(LoaderError::Unreadable("gone".into())));
    let session = start(
        live_descriptor(300, "https://cdn.example.com/class.m3u8"),
        loader,
    );
    let mut rx = session.subscribe();

    wait_for(&mut rx, |e| {
        matches!(e, Event::Session(SessionEvent::EngineSwapped { .. }))
    })
    .await;

    // The direct engine's failure has no further fallback.
    let event = wait_for(&mut rx, |e| {
        matches!(e, Event::Session(SessionEvent::PlaybackFailed { .. }))
    })
    .await;
    assert!(matches!(
        event,
        Event::Session(SessionEvent::PlaybackFailed {
            category: ErrorCategory::Native(_),
        })
    ));
    assert_eq!(session.state().engine_mode, Some(EngineMode::Direct));
    assert!(session.state().last_error.is_some());
}

#[tokio::test(start_paused = true)]
async fn stuck_adaptive_load_escalates_to_direct() {
    let loader = FakeLoader::new();
    loader.set_delay(Duration::from_secs(120));
    let session = start(
        live_descriptor(300, "https://cdn.example.com/class.m3u8"),
        loader,
    );
    let mut rx = session.subscribe();

    let event = wait_for(&mut rx, |e| {
        matches!(e, Event::Session(SessionEvent::EngineSwapped { .. }))
    })
    .await;
    assert!(matches!(
        event,
        Event::Session(SessionEvent::EngineSwapped {
            from: EngineMode::Adaptive,
            to: EngineMode::Direct,
        })
    ));
    assert_eq!(session.state().engine_mode, Some(EngineMode::Direct));
}

#[tokio::test(start_paused = true)]
async fn pause_is_reverted_while_live() {
    let session = start(
        live_descriptor(300, "https://cdn.example.com/class.m3u8"),
        FakeLoader::new(),
    );
    let mut rx = session.subscribe();
    wait_for(&mut rx, is_playing).await;

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
    wait_for(&mut rx, is_playing).await;
}
