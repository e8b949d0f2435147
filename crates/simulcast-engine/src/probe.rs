/// Whether adaptive (manifest-based) playback is available in this runtime.
///
/// The selector calls this fresh on every `initialize`; support is never
/// cached from a prior session, because the runtime can change underneath
/// (codecs unloaded, media source extensions disabled).
#[cfg_attr(
    any(test, feature = "test-utils"),
    unimock::unimock(api = AdaptiveProbeMock)
)]
pub trait AdaptiveProbe: Send + Sync + 'static {
    fn adaptive_supported(&self) -> bool;
}

/// Default probe: adaptive playback is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuntimeProbe;

impl AdaptiveProbe for RuntimeProbe {
    fn adaptive_supported(&self) -> bool {
        true
    }
}
