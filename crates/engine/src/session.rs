//! Controller session runtime.
//!
//! A [`ControllerSession`] owns one transport, one [`ProtocolMachine`] and the
//! current [`InputState`]. Once connected it runs a single task made of two
//! loops:
//!
//! - the inbound loop reads console frames from both HID channels, feeds them
//!   to the machine and queues subcommand replies;
//! - the outbound loop wakes every tick and sends either the oldest queued
//!   reply or, while streaming, a full input report.
//!
//! Both loops and every input producer share one `parking_lot` mutex. It is
//! never held across an `.await`.

use std::sync::Arc;

use nxbridge_errors::{SessionError, TransportError};
use nxbridge_hid_switch_protocol::hidp::{self, Message};
use nxbridge_hid_switch_protocol::{
    ControllerProfile, InputState, SubcommandReply, decode_output_report,
};
use nxbridge_input::{DeviceCalibration, InputMap, InputNormalizer, RawInputEvent};
use nxbridge_transport::{AdapterHandle, ChannelKind, HidChannels, TransportAdapter};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{Instrument, debug, error, info, instrument, trace, warn};

use crate::config::SessionConfig;
use crate::handshake::{HandshakeWatchdog, WatchdogVerdict};
use crate::machine::{ControllerStatus, Handled, ProtocolMachine};
use crate::state::{SessionEvent, SessionState, Transition};

/// Capacity of the event broadcast channel.
const EVENT_CAPACITY: usize = 256;

type Outcome = Option<Result<(), SessionError>>;

/// Everything guarded by the session lock.
struct Core {
    machine: ProtocolMachine,
    input: InputState,
    keepalive: bool,
}

/// State shared between the session handle, its task and input handles.
struct Shared {
    config: SessionConfig,
    normalizer: InputNormalizer,
    core: Mutex<Core>,
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    outcome: watch::Sender<Outcome>,
}

enum Lifecycle {
    Idle,
    Running {
        cancel: Arc<watch::Sender<bool>>,
        task: JoinHandle<()>,
    },
}

/// Cancels the session task unless disarmed. Held by [`ControllerSession::start`]
/// so that dropping its future abandons pairing instead of leaving the
/// controller advertised.
struct CancelOnDrop {
    cancel: Option<Arc<watch::Sender<bool>>>,
}

impl CancelOnDrop {
    fn disarm(&mut self) {
        self.cancel = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            debug!("start abandoned, cancelling session");
            cancel.send_replace(true);
        }
    }
}

/// One emulated controller connected to one console.
pub struct ControllerSession {
    transport: TransportAdapter,
    profile: ControllerProfile,
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

impl std::fmt::Debug for ControllerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerSession")
            .field("transport", &self.transport)
            .field("profile", &self.profile.name)
            .field("state", &self.state())
            .finish()
    }
}

impl ControllerSession {
    /// Create a session. Nothing touches the radio until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidConfig`] if `config` or `input_map` fails
    /// validation.
    pub fn new(
        adapter: AdapterHandle,
        profile: ControllerProfile,
        input_map: &InputMap,
        calibration: DeviceCalibration,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        input_map
            .validate()
            .map_err(|e| SessionError::config(e.to_string()))?;
        calibration
            .validate()
            .map_err(|e| SessionError::config(e.to_string()))?;

        let machine = ProtocolMachine::new(profile.clone(), &config);
        let (state, _) = watch::channel(SessionState::Disconnected);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (outcome, _) = watch::channel(None);
        Ok(Self {
            transport: TransportAdapter::new(adapter),
            profile,
            shared: Arc::new(Shared {
                normalizer: InputNormalizer::new(input_map, calibration),
                config,
                core: Mutex::new(Core {
                    machine,
                    input: InputState::NEUTRAL,
                    keepalive: false,
                }),
                state,
                events,
                outcome,
            }),
            lifecycle: Mutex::new(Lifecycle::Idle),
        })
    }

    /// Session with the default mapping and calibration.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new).
    pub fn with_defaults(
        adapter: AdapterHandle,
        profile: ControllerProfile,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        Self::new(
            adapter,
            profile,
            &InputMap::default(),
            DeviceCalibration::default(),
            config,
        )
    }

    /// Advertise the controller, wait for a console and drive it to `Active`.
    ///
    /// Returns once the handshake completes. The session keeps running in
    /// the background until [`stop`](Self::stop) or a fatal error; use
    /// [`closed`](Self::closed) to wait for that.
    ///
    /// # Errors
    ///
    /// - [`SessionError::AlreadyStarted`] while a previous start is running
    /// - transport errors from opening the channels
    /// - [`SessionError::HandshakeTimeout`] if the console stalls
    /// - [`TransportError::TransportClosed`] if the link drops or
    ///   [`stop`](Self::stop) is called before the handshake completes
    #[instrument(skip(self), fields(controller = %self.profile.name))]
    pub async fn start(&self) -> Result<(), SessionError> {
        self.reap_finished().await;

        let (cancel, cancel_rx) = watch::channel(false);
        let cancel = Arc::new(cancel);
        let (state_rx, outcome_rx) = {
            let mut lifecycle = self.lifecycle.lock();
            if matches!(&*lifecycle, Lifecycle::Running { task, .. } if !task.is_finished()) {
                return Err(SessionError::AlreadyStarted);
            }
            self.shared.reset();
            let task = tokio::spawn(
                run(
                    Arc::clone(&self.shared),
                    self.transport.clone(),
                    self.profile.clone(),
                    cancel_rx,
                )
                .in_current_span(),
            );
            *lifecycle = Lifecycle::Running {
                cancel: Arc::clone(&cancel),
                task,
            };
            (self.shared.state.subscribe(), self.shared.outcome.subscribe())
        };

        let mut abandon = CancelOnDrop {
            cancel: Some(cancel),
        };
        let result = tokio::select! {
            biased;
            outcome = wait_outcome(outcome_rx) => match outcome {
                Ok(()) => Err(ChannelKind::Control.closed().into()),
                Err(e) => Err(e),
            },
            () = wait_for_state(state_rx, SessionState::Active) => {
                info!(peer = ?self.shared.status().host_address, "controller active");
                Ok(())
            }
        };
        abandon.disarm();
        result
    }

    /// Apply one raw input event to the current input state.
    ///
    /// Returns `false` if the event's code is not mapped.
    pub fn feed_input(&self, event: &RawInputEvent) -> bool {
        self.shared.feed(event)
    }

    /// Cloneable producer handle for input threads.
    pub fn input_handle(&self) -> InputHandle {
        InputHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Request a graceful close and wait until the transport is released.
    ///
    /// Before a console connects this withdraws the advertisement. Calling
    /// `stop` on an idle or already stopped session does nothing.
    ///
    /// # Errors
    ///
    /// Currently infallible; the session's own outcome is available from
    /// [`closed`](Self::closed).
    #[instrument(skip(self), fields(controller = %self.profile.name))]
    pub async fn stop(&self) -> Result<(), SessionError> {
        let previous = std::mem::replace(&mut *self.lifecycle.lock(), Lifecycle::Idle);
        match previous {
            Lifecycle::Idle => Ok(()),
            Lifecycle::Running { cancel, task } => {
                cancel.send_replace(true);
                if let Err(e) = task.await {
                    warn!(error = %e, "session task ended abnormally");
                }
                Ok(())
            }
        }
    }

    /// Wait for the session to end.
    ///
    /// # Errors
    ///
    /// The fatal error that ended the session, or
    /// [`SessionError::NotStarted`] if it was never started.
    pub async fn closed(&self) -> Result<(), SessionError> {
        let outcome = self.shared.outcome.subscribe();
        if outcome.borrow().is_none() && matches!(*self.lifecycle.lock(), Lifecycle::Idle) {
            return Err(SessionError::NotStarted);
        }
        wait_outcome(outcome).await
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    /// Watch state changes.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Input state the next report will carry.
    pub fn input_snapshot(&self) -> InputState {
        self.shared.core.lock().input
    }

    /// Settings the console has requested so far.
    pub fn status(&self) -> ControllerStatus {
        self.shared.status()
    }

    /// Emulated controller identity.
    pub fn profile(&self) -> &ControllerProfile {
        &self.profile
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Wait out a task that has been cancelled or has already reported its
    /// outcome, so a new start does not see it as running.
    async fn reap_finished(&self) {
        let stale = {
            let mut lifecycle = self.lifecycle.lock();
            let ended = match &*lifecycle {
                Lifecycle::Running { cancel, .. } => {
                    *cancel.borrow() || self.shared.outcome.borrow().is_some()
                }
                Lifecycle::Idle => false,
            };
            if ended {
                std::mem::replace(&mut *lifecycle, Lifecycle::Idle)
            } else {
                Lifecycle::Idle
            }
        };
        if let Lifecycle::Running { task, .. } = stale
            && let Err(e) = task.await
        {
            warn!(error = %e, "previous session task ended abnormally");
        }
    }
}

/// Producer handle writing into a session's input state.
///
/// Last writer wins; events are applied immediately and never queued.
#[derive(Clone)]
pub struct InputHandle {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for InputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHandle").finish_non_exhaustive()
    }
}

impl InputHandle {
    /// Apply one raw event. Returns `false` if its code is not mapped.
    pub fn feed(&self, event: &RawInputEvent) -> bool {
        self.shared.feed(event)
    }

    /// Replace the whole input state.
    pub fn set_state(&self, state: InputState) {
        self.shared.core.lock().input = state;
    }

    /// Current input state.
    pub fn snapshot(&self) -> InputState {
        self.shared.core.lock().input
    }
}

impl Shared {
    fn feed(&self, event: &RawInputEvent) -> bool {
        let mut core = self.core.lock();
        self.normalizer.apply(&mut core.input, event)
    }

    fn status(&self) -> ControllerStatus {
        self.core.lock().machine.status()
    }

    fn emit(&self, event: SessionEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn publish(&self, transitions: Vec<Transition>) {
        for transition in transitions {
            self.state.send_replace(transition.to);
            self.emit(transition.into());
        }
    }

    /// Run `f` on the machine under the lock, then publish its transitions.
    fn with_machine<T>(&self, f: impl FnOnce(&mut ProtocolMachine) -> T) -> T {
        let (out, transitions) = {
            let mut core = self.core.lock();
            let out = f(&mut core.machine);
            (out, core.machine.take_transitions())
        };
        self.publish(transitions);
        out
    }

    fn reset(&self) {
        self.with_machine(ProtocolMachine::reset);
        {
            let mut core = self.core.lock();
            core.keepalive = false;
        }
        self.state.send_replace(SessionState::Disconnected);
        self.outcome.send_replace(None);
    }

    /// Release the transport and record how the session ended.
    async fn shutdown(&self, channels: &HidChannels, result: Result<(), SessionError>) {
        match &result {
            Ok(()) => info!(peer = %channels.peer(), "session closing"),
            Err(e) => error!(
                peer = %channels.peer(),
                error = %e,
                category = %e.category(),
                "session failed"
            ),
        }
        self.with_machine(|machine| machine.transition(SessionState::Closing));
        if let Err(e) = channels.close().await {
            warn!(error = %e, "transport did not close cleanly");
        }
        self.with_machine(|machine| machine.transition(SessionState::Disconnected));
        self.outcome.send_replace(Some(result));
    }
}

/// Session task: open the transport, then serve the console until a loop
/// fails or the session is cancelled.
async fn run(
    shared: Arc<Shared>,
    transport: TransportAdapter,
    profile: ControllerProfile,
    cancel: watch::Receiver<bool>,
) {
    let opened = tokio::select! {
        biased;
        () = cancelled(cancel.clone()) => None,
        opened = transport.open(&profile) => Some(opened),
    };
    let channels = match opened {
        Some(Ok(channels)) => channels,
        Some(Err(e)) => {
            error!(error = %e, "failed to open transport");
            shared.outcome.send_replace(Some(Err(e.into())));
            return;
        }
        None => {
            if let Err(e) = transport.withdraw().await {
                debug!(error = %e, "withdraw after cancelled open");
            }
            info!("cancelled before a console connected");
            shared
                .outcome
                .send_replace(Some(Err(ChannelKind::Control.closed().into())));
            return;
        }
    };

    shared.with_machine(|machine| machine.on_connected(channels.peer()));
    serve(shared, channels, cancel).await;
}

/// Both loops until one fails or the session is cancelled.
async fn serve(shared: Arc<Shared>, channels: HidChannels, cancel: watch::Receiver<bool>) {
    let (reply_tx, reply_rx) = mpsc::channel(shared.config.reply_queue_depth);
    let result = tokio::select! {
        biased;
        () = cancelled(cancel) => {
            info!("stop requested");
            Ok(())
        }
        result = inbound(&shared, &channels, reply_tx) => result,
        result = outbound(&shared, &channels, reply_rx) => result,
    };
    shared.shutdown(&channels, result).await;
}

enum Inbound {
    Interrupt(Vec<u8>),
    Control(Vec<u8>),
    Deadline,
}

/// Read console frames until the link drops, the console unplugs or the
/// handshake times out. `Ok(())` means a graceful unplug.
async fn inbound(
    shared: &Shared,
    channels: &HidChannels,
    replies: mpsc::Sender<SubcommandReply>,
) -> Result<(), SessionError> {
    let mut watchdog = HandshakeWatchdog::new(&shared.config, Instant::now());
    loop {
        let handshaking = shared.state.borrow().is_handshaking();
        let deadline = watchdog.deadline();
        let next = tokio::select! {
            frame = channels.receive(ChannelKind::Interrupt) => Inbound::Interrupt(frame?),
            frame = channels.receive(ChannelKind::Control) => Inbound::Control(frame?),
            () = tokio::time::sleep_until(deadline), if handshaking => Inbound::Deadline,
        };

        match next {
            Inbound::Interrupt(frame) => {
                on_output_report(shared, &frame, &replies, &mut watchdog).await?;
            }
            Inbound::Control(frame) => {
                let message = match Message::parse(&frame) {
                    Ok(message) => message,
                    Err(error) => {
                        warn!(channel = "control", %error, "dropping malformed frame");
                        shared.emit(SessionEvent::MalformedReport { error });
                        continue;
                    }
                };
                trace!(?message, "control message");
                match message {
                    m if m.is_virtual_cable_unplug() => {
                        info!("console sent virtual cable unplug");
                        return Ok(());
                    }
                    Message::SetReport(report_type, report) => {
                        channels
                            .send_bytes(
                                ChannelKind::Control,
                                &hidp::handshake(hidp::result::SUCCESSFUL),
                            )
                            .await?;
                        if report_type == hidp::report_type::OUTPUT {
                            on_output_report(shared, report, &replies, &mut watchdog).await?;
                        }
                    }
                    Message::Data(hidp::report_type::OUTPUT, report) => {
                        on_output_report(shared, report, &replies, &mut watchdog).await?;
                    }
                    Message::GetReport(_) | Message::GetProtocol | Message::SetProtocol(_) => {
                        channels
                            .send_bytes(
                                ChannelKind::Control,
                                &hidp::handshake(hidp::result::ERR_UNSUPPORTED_REQUEST),
                            )
                            .await?;
                    }
                    other => debug!(?other, "ignoring control message"),
                }
            }
            Inbound::Deadline => match watchdog.on_deadline(Instant::now()) {
                WatchdogVerdict::Nudge { retries_left } => {
                    warn!(retries_left, "console idle during handshake, sending keep-alive");
                    shared.core.lock().keepalive = true;
                    shared.emit(SessionEvent::HandshakeNudge { retries_left });
                }
                WatchdogVerdict::Expired(e) => return Err(e),
            },
        }
    }
}

/// Decode one output report, run it through the machine and queue its reply.
async fn on_output_report(
    shared: &Shared,
    frame: &[u8],
    replies: &mpsc::Sender<SubcommandReply>,
    watchdog: &mut HandshakeWatchdog,
) -> Result<(), SessionError> {
    let report = match decode_output_report(frame) {
        Ok(report) => report,
        Err(error) => {
            warn!(len = frame.len(), %error, "dropping malformed output report");
            shared.emit(SessionEvent::MalformedReport { error });
            return Ok(());
        }
    };

    let Some(Handled::Reply { request, reply }) =
        shared.with_machine(|machine| machine.handle_output(report))
    else {
        return Ok(());
    };
    watchdog.on_activity(Instant::now());
    shared.emit(SessionEvent::SubcommandReceived {
        subcommand_id: reply.subcommand_id,
        sequence: request.sequence,
    });
    if replies.send(reply).await.is_err() {
        return Err(ChannelKind::Interrupt.closed().into());
    }
    Ok(())
}

/// Emit one report per tick: a queued reply first, otherwise the current
/// input while streaming.
async fn outbound(
    shared: &Shared,
    channels: &HidChannels,
    mut replies: mpsc::Receiver<SubcommandReply>,
) -> Result<(), SessionError> {
    let mut ticker = tokio::time::interval(shared.config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let reply = replies.try_recv().ok();
        let frame = {
            let mut core = shared.core.lock();
            let keepalive = std::mem::take(&mut core.keepalive);
            let input = core.input;
            core.machine.next_report(&input, reply.as_ref(), keepalive)
        };
        let Some(frame) = frame else {
            continue;
        };
        channels.send(ChannelKind::Interrupt, &frame).await?;
        if let Some(reply) = reply {
            debug!(
                subcommand = format_args!("{:#04x}", reply.subcommand_id),
                sequence = reply.sequence,
                "reply sent"
            );
            shared.emit(SessionEvent::ReplySent {
                subcommand_id: reply.subcommand_id,
                sequence: reply.sequence,
            });
        }
    }
}

async fn cancelled(mut cancel: watch::Receiver<bool>) {
    // a dropped sender also means stop
    let _ = cancel.wait_for(|stop| *stop).await;
}

async fn wait_outcome(mut outcome: watch::Receiver<Outcome>) -> Result<(), SessionError> {
    let result = match outcome.wait_for(Option::is_some).await {
        Ok(done) => done.clone(),
        Err(_) => None,
    };
    result.unwrap_or_else(|| Err(TransportError::closed("session").into()))
}

async fn wait_for_state(mut state: watch::Receiver<SessionState>, target: SessionState) {
    let reached = state.wait_for(|s| *s == target).await.is_ok();
    if !reached {
        std::future::pending::<()>().await;
    }
}
