//! Engine selection, surface exclusivity, and the one-way fallback.

use std::sync::Arc;

use rstest::rstest;
use simulcast_core::{ContentLocator, EngineMode};
use simulcast_engine::{
    EngineSelector, RuntimeProbe, SurfacePolicy, VideoSurface, testkit::FakeLoader,
};
use simulcast_events::{EngineEvent, Event, EventBus};

fn selector_for(locator: &str) -> (EngineSelector, EventBus) {
    let bus = EventBus::default();
    let surface = VideoSurface::new(SurfacePolicy::default(), bus.clone());
    let selector = EngineSelector::new(
        surface,
        ContentLocator::parse(locator).unwrap(),
        Arc::new(FakeLoader::new()),
        Arc::new(RuntimeProbe),
        bus.clone(),
    );
    (selector, bus)
}

#[rstest]
#[case("https://cdn.example.com/live/class.m3u8", EngineMode::Adaptive)]
#[case("https://cdn.example.com/live/class.mpd", EngineMode::Adaptive)]
#[case("https://cdn.example.com/vod/class.mp4", EngineMode::Direct)]
#[case("https://cdn.example.com/class.m3u8?token=abc", EngineMode::Adaptive)]
#[case("/srv/media/class.mp4", EngineMode::Direct)]
#[tokio::test]
async fn source_kind_drives_selection(#[case] locator: &str, #[case] expected: EngineMode) {
    let (selector, _bus) = selector_for(locator);
    assert_eq!(selector.initialize(None).unwrap(), expected);
}

#[tokio::test]
async fn fallback_is_one_directional() {
    let (selector, _bus) = selector_for("https://cdn.example.com/class.m3u8");
    selector.initialize(None).unwrap();
    assert_eq!(selector.mode(), Some(EngineMode::Adaptive));

    assert!(selector.force_fallback_to_direct().unwrap());
    assert_eq!(selector.mode(), Some(EngineMode::Direct));

    // Every later decision stays direct, hints included.
    assert_eq!(selector.initialize(None).unwrap(), EngineMode::Direct);
    assert_eq!(
        selector.initialize(Some(EngineMode::Adaptive)).unwrap(),
        EngineMode::Direct
    );
}

#[tokio::test]
async fn surface_is_exclusively_owned_across_swaps() {
    let (selector, _bus) = selector_for("https://cdn.example.com/class.m3u8");
    selector.initialize(None).unwrap();
    assert_eq!(selector.surface().attached_mode(), Some(EngineMode::Adaptive));

    // A second attach while the adaptive engine holds the surface fails.
    assert!(selector.surface().attach(EngineMode::Direct).is_err());

    selector.force_fallback_to_direct().unwrap();
    assert_eq!(selector.surface().attached_mode(), Some(EngineMode::Direct));

    selector.shutdown();
    assert_eq!(selector.surface().attached_mode(), None);
}

#[tokio::test]
async fn each_initialize_announces_loading() {
    let (selector, bus) = selector_for("https://cdn.example.com/class.m3u8");
    let mut rx = bus.subscribe();
    selector.initialize(None).unwrap();

    let event = rx.recv().await.unwrap();
    assert!(matches!(
        event,
        Event::Engine {
            mode: EngineMode::Adaptive,
            event: EngineEvent::LoadingStarted,
            ..
        }
    ));
}
