//! Fatal-failure classification and the recovery policy table.

use std::time::Duration;

use simulcast_events::{EngineFailure, ErrorCategory};

/// What the session does about a classified failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recovery {
    /// Swap the adaptive engine for the direct one.
    FallbackToDirect,
    /// Wait, then resume data loading on the current engine.
    RetryAfter(Duration),
    /// Invoke the engine's built-in media-error recovery.
    EngineRecover,
    /// No automatic path: surface the failure to the viewer.
    Surface,
}

/// Classify a fatal engine failure and pick its recovery action.
///
/// Manifest failures fall back to the direct engine, transient network
/// failures get a delayed resume, recoverable media errors use the engine's
/// own recovery path, and everything else is surfaced. Classification never
/// fails: an unknown failure shape surfaces as `Unclassified`.
#[must_use]
pub fn classify_failure(
    failure: &EngineFailure,
    network_retry_delay: Duration,
) -> (ErrorCategory, Recovery) {
    match failure {
        EngineFailure::ManifestLoad { .. } => {
            (ErrorCategory::ManifestLoad, Recovery::FallbackToDirect)
        }
        EngineFailure::Network { .. } => (
            ErrorCategory::TransientNetwork,
            Recovery::RetryAfter(network_retry_delay),
        ),
        EngineFailure::Media { recoverable, .. } => {
            let recovery = if *recoverable {
                Recovery::EngineRecover
            } else {
                Recovery::Surface
            };
            (ErrorCategory::Media, recovery)
        }
        EngineFailure::Native { code } => (ErrorCategory::Native(*code), Recovery::Surface),
        _ => (ErrorCategory::Unclassified, Recovery::Surface),
    }
}
