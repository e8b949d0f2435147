//! The viewer-session orchestrator.
//!
//! One [`LiveSession`] per viewer per broadcast. The session runs a single
//! dispatch task that consumes bus events, viewer commands, and the drift
//! and countdown timers through one `select!` loop, so corrections are
//! serialized and never observe each other mid-flight. Timer escalations
//! re-enter the loop as commands instead of acting from their own tasks.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use derive_setters::Setters;
use parking_lot::Mutex;
use simulcast_clock::{
    BroadcastSchedule, DEFAULT_EXPIRY_WINDOW, DEFAULT_LIVE_WINDOW, Phase, parse_schedule_or_live,
};
use simulcast_core::{ContentLocator, EngineMode};
use simulcast_engine::{
    AdaptiveProbe, EngineSelector, HttpLoader, LoaderOptions, MediaLoader, RuntimeProbe,
    SurfacePolicy, VideoSurface,
};
use simulcast_events::{
    EngineEvent, ErrorCategory, Event, EventBus, SessionEvent,
};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    classify::{Recovery, classify_failure},
    error::{SessionError, SessionResult},
    options::SyncOptions,
    state::{PlaybackState, SharedState},
};

/// Descriptor of one scheduled broadcast, as published by the backend.
#[derive(Clone, Debug, Setters)]
#[setters(prefix = "with_", strip_option)]
pub struct BroadcastSession {
    /// Raw scheduled-start timestamp, exactly as published.
    #[setters(skip)]
    pub scheduled_start: String,
    /// Where the media lives.
    #[setters(skip)]
    pub locator: ContentLocator,
    /// Display metadata for the viewer chrome.
    pub subject: Option<String>,
    pub grade: Option<String>,
    /// How long after the scheduled start the broadcast counts as live.
    pub live_window: Duration,
    /// How long after the scheduled start access is refused entirely.
    pub expiry_window: Duration,
}

impl BroadcastSession {
    #[must_use]
    pub fn new(scheduled_start: impl Into<String>, locator: ContentLocator) -> Self {
        Self {
            scheduled_start: scheduled_start.into(),
            locator,
            subject: None,
            grade: None,
            live_window: DEFAULT_LIVE_WINDOW,
            expiry_window: DEFAULT_EXPIRY_WINDOW,
        }
    }
}

/// Commands routed into the dispatch loop. Viewer actions and timer
/// escalations both arrive here so everything mutates state from one task.
#[derive(Debug)]
enum SessionCmd {
    Retry,
    ForceDirect,
    SetMuted(bool),
    ToggleMute,
    Fullscreen,
    Play,
    Pause,
    Seek(f64),
    ResumeLoading,
    LoadDeadline { generation: u64 },
}

/// Handle to a running viewer session.
///
/// Control methods enqueue commands for the dispatch loop and never block.
/// Dropping the handle tears the whole session down, engine and timers
/// included.
pub struct LiveSession {
    cmd_tx: mpsc::UnboundedSender<SessionCmd>,
    state: SharedState,
    bus: EventBus,
    cancel: CancellationToken,
    selector: Arc<EngineSelector>,
    runner: Mutex<Option<JoinHandle<()>>>,
}

impl LiveSession {
    /// Start a session with the production loader and runtime probe.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(descriptor: BroadcastSession, options: SyncOptions) -> SessionResult<Self> {
        Self::start_with(
            descriptor,
            options,
            Arc::new(HttpLoader::new(LoaderOptions::default())),
            Arc::new(RuntimeProbe),
        )
    }

    /// Start a session with injected loader and probe implementations.
    pub fn start_with(
        descriptor: BroadcastSession,
        options: SyncOptions,
        loader: Arc<dyn MediaLoader>,
        probe: Arc<dyn AdaptiveProbe>,
    ) -> SessionResult<Self> {
        let now = Utc::now();
        let schedule = parse_schedule_or_live(
            &descriptor.scheduled_start,
            now,
            descriptor.live_window,
            descriptor.expiry_window,
        );
        if schedule.is_expired_at(now) {
            return Err(SessionError::Expired {
                scheduled_start: descriptor.scheduled_start,
            });
        }

        let bus = EventBus::default();
        let surface = VideoSurface::new(SurfacePolicy::default(), bus.clone());
        let selector = Arc::new(EngineSelector::new(
            surface,
            descriptor.locator.clone(),
            loader,
            probe,
            bus.clone(),
        ));

        let phase = schedule.phase_at(now);
        let state = SharedState::new(phase, selector.surface().is_muted());
        let cancel = CancellationToken::new();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        info!(
            subject = descriptor.subject.as_deref().unwrap_or("?"),
            locator = %descriptor.locator,
            ?phase,
            "session starting"
        );

        let events = bus.subscribe();
        let runner = Runner {
            schedule,
            options,
            selector: Arc::clone(&selector),
            state: state.clone(),
            bus: bus.clone(),
            cancel: cancel.clone(),
            cmd_tx: cmd_tx.clone(),
            escalation: None,
            escalation_generation: 0,
            retry_timer: None,
        };
        let handle = tokio::spawn(runner.run(events, cmd_rx));

        Ok(Self {
            cmd_tx,
            state,
            bus,
            cancel,
            selector,
            runner: Mutex::new(Some(handle)),
        })
    }

    /// Snapshot of the externally visible state.
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state.snapshot()
    }

    /// Subscribe to all session and engine events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Re-initialize the current engine after a surfaced failure.
    pub fn retry(&self) {
        self.send(SessionCmd::Retry);
    }

    /// Force the direct engine, regardless of the current mode.
    pub fn force_direct(&self) {
        self.send(SessionCmd::ForceDirect);
    }

    pub fn set_muted(&self, muted: bool) {
        self.send(SessionCmd::SetMuted(muted));
    }

    pub fn toggle_mute(&self) {
        self.send(SessionCmd::ToggleMute);
    }

    pub fn request_fullscreen(&self) {
        self.send(SessionCmd::Fullscreen);
    }

    pub fn play(&self) {
        self.send(SessionCmd::Play);
    }

    /// Request a pause. While live the corrector reverts it on the next
    /// dispatch; once the broadcast has ended it sticks.
    pub fn pause(&self) {
        self.send(SessionCmd::Pause);
    }

    /// Request an absolute seek. While live the corrector snaps playback
    /// back to the elapsed position; once ended the seek is honored.
    pub fn seek(&self, seconds: f64) {
        self.send(SessionCmd::Seek(seconds));
    }

    /// Tear the session down: cancel timers, stop the dispatch loop, shut
    /// the engine down, release the surface. Idempotent.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.runner.lock().take() {
            handle.abort();
        }
        self.selector.shutdown();
    }

    fn send(&self, cmd: SessionCmd) {
        // A closed channel means the session is already torn down.
        let _ = self.cmd_tx.send(cmd);
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Runner {
    schedule: BroadcastSchedule,
    options: SyncOptions,
    selector: Arc<EngineSelector>,
    state: SharedState,
    bus: EventBus,
    cancel: CancellationToken,
    cmd_tx: mpsc::UnboundedSender<SessionCmd>,
    /// Cancels the armed load-deadline timer, if any.
    escalation: Option<CancellationToken>,
    /// Discards deadline commands from timers that were since disarmed.
    escalation_generation: u64,
    /// Cancels the pending network-retry timer, if any.
    retry_timer: Option<CancellationToken>,
}

impl Runner {
    async fn run(
        mut self,
        mut events: broadcast::Receiver<Event>,
        mut cmd_rx: mpsc::UnboundedReceiver<SessionCmd>,
    ) {
        if self.state.phase() != Phase::Upcoming {
            self.activate();
        }

        let mut drift = tokio::time::interval(self.options.drift_interval);
        drift.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut countdown = tokio::time::interval(self.options.countdown_interval);
        countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let cancel = self.cancel.clone();

        loop {
            // The timer arms are phase-gated: the countdown only matters in
            // the waiting room, and nothing is corrected once the broadcast
            // has ended.
            let phase = self.state.phase();
            tokio::select! {
                () = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(Event::Engine { mode, generation, event }) => {
                        self.on_engine_event(mode, generation, event);
                    }
                    Ok(Event::Session(_)) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "dispatch loop lagged behind the bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                Some(cmd) = cmd_rx.recv() => self.on_cmd(cmd),
                _ = drift.tick(), if phase != Phase::Ended => self.on_drift_tick(),
                _ = countdown.tick(), if phase == Phase::Upcoming => self.on_countdown_tick(),
            }
        }

        self.disarm_escalation();
        if let Some(timer) = self.retry_timer.take() {
            timer.cancel();
        }
        self.selector.shutdown();
        debug!("session dispatch loop stopped");
    }

    /// (Re)initialize the engine for the current source.
    fn activate(&self) {
        match self.selector.initialize(None) {
            Ok(mode) => self.state.set_engine_mode(mode),
            Err(err) => {
                warn!(%err, "engine initialization failed");
                self.surface_failure(ErrorCategory::Unclassified);
            }
        }
    }

    fn on_engine_event(&mut self, mode: EngineMode, generation: u64, event: EngineEvent) {
        // An engine torn down by a swap may still have events queued. The
        // generation also catches a same-mode rebuild, which the mode alone
        // cannot.
        if generation != self.selector.generation() {
            debug!(%mode, generation, ?event, "event from a replaced engine dropped");
            return;
        }
        match event {
            EngineEvent::LoadingStarted => {
                if self.state.set_loading(true) {
                    self.bus.publish(SessionEvent::LoadingChanged { loading: true });
                }
                self.arm_escalation();
            }
            EngineEvent::MediaReady { duration } => {
                debug!(?duration, %mode, "media ready");
                self.disarm_escalation();
                self.set_loading_done();
                self.state.clear_error();
                if self.state.phase() == Phase::Live {
                    self.seed_live_position();
                }
                if let Some(engine) = self.selector.active() {
                    engine.play();
                }
            }
            EngineEvent::Paused => {
                // A pause during the live phase is reverted, not honored.
                if self.state.phase() == Phase::Live
                    && let Some(engine) = self.selector.active()
                {
                    debug!("pause suppressed while live");
                    engine.play();
                }
            }
            EngineEvent::Seeked { to_seconds } => {
                if self.state.phase() == Phase::Live {
                    self.snap_after_seek(to_seconds);
                }
            }
            EngineEvent::SegmentBuffered { .. } => {
                // A burst of appends tolerates more drift than the
                // periodic pass.
                if self.state.phase() == Phase::Live && !self.state.is_loading() {
                    self.drift_pass(self.options.buffered_drift_threshold_secs());
                }
            }
            EngineEvent::AutoplayBlocked => {
                info!("autoplay blocked; waiting for a viewer gesture");
            }
            EngineEvent::Stalled => debug!("playback stalled"),
            EngineEvent::Fatal { failure } => {
                self.disarm_escalation();
                self.set_loading_done();
                let (category, recovery) =
                    classify_failure(&failure, self.options.network_retry_delay);
                warn!(?failure, %category, ?recovery, "fatal engine failure");
                match recovery {
                    Recovery::FallbackToDirect => self.fallback(category),
                    Recovery::RetryAfter(delay) => self.schedule_resume(delay),
                    Recovery::EngineRecover => {
                        let recovered = self
                            .selector
                            .active()
                            .is_some_and(|engine| engine.recover_media_error().is_ok());
                        if !recovered {
                            self.surface_failure(category);
                        }
                    }
                    Recovery::Surface => self.surface_failure(category),
                }
            }
            EngineEvent::EndOfStream => {
                info!("end of stream");
                self.bus.publish(SessionEvent::Ended);
            }
            EngineEvent::Playing => {}
            _ => {}
        }
    }

    fn on_cmd(&mut self, cmd: SessionCmd) {
        match cmd {
            SessionCmd::Retry => {
                self.viewer_gesture();
                self.state.clear_error();
                self.activate();
            }
            SessionCmd::ForceDirect => {
                self.viewer_gesture();
                self.fallback_quiet();
            }
            SessionCmd::SetMuted(muted) => {
                self.viewer_gesture();
                self.selector.surface().set_muted(muted);
                self.state.set_muted(muted);
            }
            SessionCmd::ToggleMute => {
                self.viewer_gesture();
                let muted = !self.selector.surface().is_muted();
                self.selector.surface().set_muted(muted);
                self.state.set_muted(muted);
            }
            SessionCmd::Fullscreen => {
                self.viewer_gesture();
                self.selector.surface().request_fullscreen();
            }
            SessionCmd::Play => {
                self.viewer_gesture();
                if let Some(engine) = self.selector.active() {
                    engine.play();
                }
            }
            SessionCmd::Pause => {
                self.viewer_gesture();
                if let Some(engine) = self.selector.active() {
                    engine.pause();
                }
            }
            SessionCmd::Seek(seconds) => {
                self.viewer_gesture();
                if let Some(engine) = self.selector.active() {
                    engine.seek(seconds);
                }
            }
            SessionCmd::ResumeLoading => {
                if let Some(engine) = self.selector.active() {
                    debug!("resuming loading after network retry delay");
                    self.bus.publish_engine(
                        engine.mode(),
                        self.selector.generation(),
                        EngineEvent::LoadingStarted,
                    );
                    engine.resume_loading();
                }
            }
            SessionCmd::LoadDeadline { generation } => {
                let armed = generation == self.escalation_generation;
                if armed
                    && self.state.is_loading()
                    && self.selector.mode() == Some(EngineMode::Adaptive)
                {
                    warn!(
                        timeout = ?self.options.load_timeout,
                        "adaptive load deadline passed, escalating to direct"
                    );
                    self.fallback(ErrorCategory::ManifestLoad);
                }
            }
        }
    }

    /// Waiting-room tick: publish the remaining time, flip to live at the
    /// boundary.
    fn on_countdown_tick(&mut self) {
        if self.state.phase() != Phase::Upcoming {
            return;
        }
        let now = Utc::now();
        match self.schedule.countdown_at(now) {
            Some(remaining) => self.bus.publish(SessionEvent::Countdown { remaining }),
            None => {
                if self.state.set_phase(Phase::Live) {
                    info!("broadcast went live");
                    self.bus
                        .publish(SessionEvent::PhaseChanged { phase: Phase::Live });
                    self.activate();
                }
            }
        }
    }

    /// Periodic live-lock pass, plus the live-to-ended transition.
    fn on_drift_tick(&mut self) {
        let now = Utc::now();
        let phase = self.schedule.phase_at(now);
        if phase == Phase::Ended && self.state.set_phase(Phase::Ended) {
            info!("broadcast ended");
            self.bus
                .publish(SessionEvent::PhaseChanged { phase: Phase::Ended });
            return;
        }
        if self.state.phase() == Phase::Live && !self.state.is_loading() {
            self.drift_pass(self.options.drift_threshold_secs());
        }
    }

    /// Compare the engine position with the wall-clock elapsed position and
    /// seek when the gap exceeds `threshold` seconds.
    fn drift_pass(&self, threshold: f64) {
        let target = self.schedule.elapsed_seconds_at(Utc::now());
        self.state.set_elapsed_seconds(target);
        if target <= 0.0 {
            return;
        }
        let Some(engine) = self.selector.active() else {
            return;
        };
        if self.selector.surface().is_paused() {
            return;
        }
        let actual = engine.position();
        if needs_correction(actual, target, threshold) {
            info!(actual, target, "correcting live drift");
            engine.seek(target);
            self.bus.publish(SessionEvent::DriftCorrected {
                from_seconds: actual,
                to_seconds: target,
            });
        }
    }

    /// Seed playback at the elapsed position when media becomes ready
    /// mid-broadcast.
    fn seed_live_position(&self) {
        let target = self.schedule.elapsed_seconds_at(Utc::now());
        self.state.set_elapsed_seconds(target);
        if target > 0.0
            && let Some(engine) = self.selector.active()
        {
            debug!(target, "seeding live position");
            engine.seek(target);
        }
    }

    /// A viewer-initiated seek while live snaps back to the elapsed
    /// position, within the drift tolerance so our own corrective seeks
    /// pass through.
    fn snap_after_seek(&self, to_seconds: f64) {
        let target = self.schedule.elapsed_seconds_at(Utc::now());
        if target <= 0.0 {
            return;
        }
        if needs_correction(to_seconds, target, self.options.drift_threshold_secs()) {
            let Some(engine) = self.selector.active() else {
                return;
            };
            debug!(to_seconds, target, "seek while live snapped back");
            engine.seek(target);
        }
    }

    /// Fallback in response to a classified failure; surfaces the failure
    /// when no swap is possible.
    fn fallback(&mut self, category: ErrorCategory) {
        match self.selector.force_fallback_to_direct() {
            Ok(true) => {
                self.state.set_engine_mode(EngineMode::Direct);
                self.state.clear_error();
                self.bus.publish(SessionEvent::EngineSwapped {
                    from: EngineMode::Adaptive,
                    to: EngineMode::Direct,
                });
            }
            Ok(false) => self.surface_failure(category),
            Err(err) => {
                warn!(%err, "fallback to direct failed");
                self.surface_failure(category);
            }
        }
    }

    /// Viewer-requested fallback: already-direct is fine, not a failure.
    fn fallback_quiet(&mut self) {
        match self.selector.force_fallback_to_direct() {
            Ok(true) => {
                self.state.set_engine_mode(EngineMode::Direct);
                self.bus.publish(SessionEvent::EngineSwapped {
                    from: EngineMode::Adaptive,
                    to: EngineMode::Direct,
                });
            }
            Ok(false) => {}
            Err(err) => {
                warn!(%err, "forced fallback failed");
                self.surface_failure(ErrorCategory::Unclassified);
            }
        }
    }

    fn surface_failure(&self, category: ErrorCategory) {
        self.state.set_error(category);
        self.bus.publish(SessionEvent::PlaybackFailed { category });
    }

    fn set_loading_done(&self) {
        if self.state.set_loading(false) {
            self.bus
                .publish(SessionEvent::LoadingChanged { loading: false });
        }
    }

    /// Any explicit viewer command counts as the activation gesture the
    /// autoplay policy wants.
    fn viewer_gesture(&self) {
        self.selector.surface().mark_user_activation();
    }

    /// Arm (or re-arm) the load-deadline timer. At most one timer is armed;
    /// re-arming cancels the previous one and bumps the generation so a
    /// stale firing is discarded.
    fn arm_escalation(&mut self) {
        self.disarm_escalation();
        self.escalation_generation += 1;
        let generation = self.escalation_generation;
        let token = self.cancel.child_token();
        let deadline = self.options.load_timeout;
        let tx = self.cmd_tx.clone();
        let timer = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = timer.cancelled() => {}
                () = tokio::time::sleep(deadline) => {
                    let _ = tx.send(SessionCmd::LoadDeadline { generation });
                }
            }
        });
        self.escalation = Some(token);
    }

    fn disarm_escalation(&mut self) {
        if let Some(token) = self.escalation.take() {
            token.cancel();
        }
    }

    /// Resume loading after a transient network failure. One pending
    /// resume at a time.
    fn schedule_resume(&mut self, delay: Duration) {
        if let Some(previous) = self.retry_timer.take() {
            previous.cancel();
        }
        let token = self.cancel.child_token();
        let tx = self.cmd_tx.clone();
        let timer = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = timer.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let _ = tx.send(SessionCmd::ResumeLoading);
                }
            }
        });
        self.retry_timer = Some(token);
    }
}

/// Drift at the threshold is tolerated; only beyond it is corrected.
fn needs_correction(actual: f64, target: f64, threshold: f64) -> bool {
    (actual - target).abs() > threshold
}
