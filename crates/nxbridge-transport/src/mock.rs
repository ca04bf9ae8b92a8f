//! In-memory adapter and console for tests and dry runs.
//!
//! [`MockAdapter::connect_console`] creates a linked pair of channel sets:
//! the emulator side is handed out by the next [`accept`](BluetoothAdapter::accept)
//! and the returned [`ConsoleEndpoint`] plays the console.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use nxbridge_errors::{SessionError, TransportError};
use nxbridge_hid_switch_protocol::ids::input_report_ids;
use nxbridge_hid_switch_protocol::{
    BdAddr, InputReport, RUMBLE_NEUTRAL, SdpRecord, Subcommand, SubcommandReply,
    decode_input_report, encode_rumble_report, encode_subcommand_report,
};
use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc, watch};

use crate::traits::{BluetoothAdapter, ChannelHandle, ChannelKind, L2capChannel, TransportResult};

/// Frames buffered per direction before `send` waits.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Console address used by [`MockAdapter::connect_console`].
pub const CONSOLE_ADDRESS: BdAddr = BdAddr([0x98, 0xB6, 0xE9, 0x01, 0x02, 0x03]);

/// One end of an in-memory L2CAP channel.
pub struct MockChannel {
    kind: ChannelKind,
    tx: mpsc::Sender<Vec<u8>>,
    rx: tokio::sync::Mutex<mpsc::Receiver<Vec<u8>>>,
    link: Arc<watch::Sender<bool>>,
}

impl MockChannel {
    /// Two connected ends.
    pub fn pair(kind: ChannelKind, capacity: usize) -> (MockChannel, MockChannel) {
        let (a_tx, b_rx) = mpsc::channel(capacity);
        let (b_tx, a_rx) = mpsc::channel(capacity);
        let link = Arc::new(watch::Sender::new(false));
        (
            MockChannel {
                kind,
                tx: a_tx,
                rx: tokio::sync::Mutex::new(a_rx),
                link: Arc::clone(&link),
            },
            MockChannel {
                kind,
                tx: b_tx,
                rx: tokio::sync::Mutex::new(b_rx),
                link,
            },
        )
    }

    fn is_closed(&self) -> bool {
        *self.link.borrow()
    }

    /// Frames delivered to this end but never received. Works after close.
    pub fn drain(&self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        if let Ok(mut rx) = self.rx.try_lock() {
            while let Ok(frame) = rx.try_recv() {
                frames.push(frame);
            }
        }
        frames
    }
}

async fn wait_closed(mut link: watch::Receiver<bool>) {
    // the sender is shared by both ends and outlives them
    let _ = link.wait_for(|closed| *closed).await;
}

#[async_trait]
impl L2capChannel for MockChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, frame: &[u8]) -> TransportResult<()> {
        if self.is_closed() {
            return Err(self.kind.closed());
        }
        tokio::select! {
            biased;
            () = wait_closed(self.link.subscribe()) => Err(self.kind.closed()),
            sent = self.tx.send(frame.to_vec()) => sent.map_err(|_unsent| self.kind.closed()),
        }
    }

    async fn receive(&self) -> TransportResult<Vec<u8>> {
        let closed = self.link.subscribe();
        let mut rx = self.rx.lock().await;
        tokio::select! {
            biased;
            () = wait_closed(closed) => Err(self.kind.closed()),
            frame = rx.recv() => frame.ok_or_else(|| self.kind.closed()),
        }
    }

    async fn close(&self) -> TransportResult<()> {
        self.link.send_replace(true);
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.is_closed()
    }
}

struct MockAdapterState {
    powered: bool,
    reject: Option<String>,
    advertise_failure: Option<String>,
    advertised: Option<(SdpRecord, String)>,
    pending: VecDeque<(MockChannel, MockChannel)>,
    accepted: usize,
    withdrawn: usize,
}

/// Adapter backed by in-memory channels.
#[derive(Clone)]
pub struct MockAdapter {
    name: String,
    capacity: usize,
    state: Arc<Mutex<MockAdapterState>>,
    connected: Arc<Notify>,
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAdapter {
    /// Powered adapter named `mock0`.
    pub fn new() -> Self {
        Self {
            name: "mock0".to_string(),
            capacity: DEFAULT_CHANNEL_CAPACITY,
            state: Arc::new(Mutex::new(MockAdapterState {
                powered: true,
                reject: None,
                advertise_failure: None,
                advertised: None,
                pending: VecDeque::new(),
                accepted: 0,
                withdrawn: 0,
            })),
            connected: Arc::new(Notify::new()),
        }
    }

    /// Adapter whose radio is missing.
    #[must_use]
    pub fn unpowered(self) -> Self {
        self.state.lock().powered = false;
        self
    }

    /// Adapter whose console declines pairing.
    #[must_use]
    pub fn rejecting(self, reason: impl Into<String>) -> Self {
        self.state.lock().reject = Some(reason.into());
        self
    }

    /// Adapter that records the advertisement and then fails, like a stack
    /// that registered the SDP record but could not bind a PSM.
    #[must_use]
    pub fn failing_advertise(self, reason: impl Into<String>) -> Self {
        self.state.lock().advertise_failure = Some(reason.into());
        self
    }

    /// Per-direction channel capacity for consoles connected afterwards.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Queue a console connection; the next `accept` returns its peer ends.
    pub fn connect_console(&self) -> ConsoleEndpoint {
        let (ctrl_emu, ctrl_console) = MockChannel::pair(ChannelKind::Control, self.capacity);
        let (intr_emu, intr_console) = MockChannel::pair(ChannelKind::Interrupt, self.capacity);
        self.state.lock().pending.push_back((ctrl_emu, intr_emu));
        self.connected.notify_one();
        ConsoleEndpoint {
            control: ctrl_console,
            interrupt: intr_console,
            packet_counter: AtomicU8::new(0),
        }
    }

    /// Record and device name last advertised.
    pub fn advertised(&self) -> Option<(SdpRecord, String)> {
        self.state.lock().advertised.clone()
    }

    /// Number of connections handed out.
    pub fn accepted_count(&self) -> usize {
        self.state.lock().accepted
    }

    /// Number of times the advertisement was withdrawn.
    pub fn withdrawn_count(&self) -> usize {
        self.state.lock().withdrawn
    }
}

#[async_trait]
impl BluetoothAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn advertise(&self, record: &SdpRecord, device_name: &str) -> TransportResult<()> {
        let mut state = self.state.lock();
        if !state.powered {
            return Err(TransportError::adapter_unavailable(format!(
                "{} is powered off",
                self.name
            )));
        }
        state.advertised = Some((record.clone(), device_name.to_string()));
        match state.advertise_failure.clone() {
            Some(reason) => Err(TransportError::adapter_unavailable(reason)),
            None => Ok(()),
        }
    }

    async fn accept(&self) -> TransportResult<(ChannelHandle, ChannelHandle, BdAddr)> {
        loop {
            let notified = self.connected.notified();
            {
                let mut state = self.state.lock();
                if !state.powered {
                    return Err(TransportError::adapter_unavailable(format!(
                        "{} is powered off",
                        self.name
                    )));
                }
                if let Some(reason) = state.reject.clone() {
                    return Err(TransportError::pairing_rejected(reason));
                }
                if let Some((control, interrupt)) = state.pending.pop_front() {
                    state.accepted += 1;
                    let control: ChannelHandle = Arc::new(control);
                    let interrupt: ChannelHandle = Arc::new(interrupt);
                    return Ok((control, interrupt, CONSOLE_ADDRESS));
                }
            }
            notified.await;
        }
    }

    async fn withdraw(&self) -> TransportResult<()> {
        let mut state = self.state.lock();
        state.advertised = None;
        state.withdrawn += 1;
        Ok(())
    }
}

/// The console's side of a mock connection.
pub struct ConsoleEndpoint {
    control: MockChannel,
    interrupt: MockChannel,
    packet_counter: AtomicU8,
}

impl ConsoleEndpoint {
    /// Send a subcommand as output report 0x01 with neutral rumble.
    ///
    /// # Errors
    ///
    /// [`TransportError::TransportClosed`] if the emulator hung up.
    pub async fn send_subcommand(&self, subcommand: &Subcommand) -> TransportResult<()> {
        let counter = self.next_counter();
        self.interrupt
            .send(&encode_subcommand_report(counter, subcommand))
            .await
    }

    /// Send a rumble-only output report 0x10.
    ///
    /// # Errors
    ///
    /// [`TransportError::TransportClosed`] if the emulator hung up.
    pub async fn send_rumble(&self) -> TransportResult<()> {
        let counter = self.next_counter();
        self.interrupt
            .send(&encode_rumble_report(counter, RUMBLE_NEUTRAL))
            .await
    }

    /// Send arbitrary bytes on the interrupt channel.
    ///
    /// # Errors
    ///
    /// [`TransportError::TransportClosed`] if the emulator hung up.
    pub async fn send_raw(&self, bytes: &[u8]) -> TransportResult<()> {
        self.interrupt.send(bytes).await
    }

    /// Send arbitrary bytes on the control channel.
    ///
    /// # Errors
    ///
    /// [`TransportError::TransportClosed`] if the emulator hung up.
    pub async fn send_control(&self, bytes: &[u8]) -> TransportResult<()> {
        self.control.send(bytes).await
    }

    /// Next raw frame on the interrupt channel.
    ///
    /// # Errors
    ///
    /// [`TransportError::TransportClosed`] once the link is down.
    pub async fn next_frame(&self) -> TransportResult<Vec<u8>> {
        self.interrupt.receive().await
    }

    /// Next raw frame on the control channel.
    ///
    /// # Errors
    ///
    /// [`TransportError::TransportClosed`] once the link is down.
    pub async fn next_control(&self) -> TransportResult<Vec<u8>> {
        self.control.receive().await
    }

    /// Next decoded input report.
    ///
    /// # Errors
    ///
    /// Transport errors, or [`SessionError::MalformedReport`] if the emulator
    /// sent bytes that do not decode.
    pub async fn next_report(&self) -> Result<InputReport, SessionError> {
        let frame = self.next_frame().await?;
        Ok(decode_input_report(&frame)?)
    }

    /// Next subcommand reply, skipping periodic input reports.
    ///
    /// # Errors
    ///
    /// As [`next_report`](Self::next_report).
    pub async fn next_reply(&self) -> Result<SubcommandReply, SessionError> {
        loop {
            let report = self.next_report().await?;
            if report.report_id == input_report_ids::SUBCOMMAND_REPLY
                && let Some(reply) = report.reply
            {
                return Ok(reply);
            }
        }
    }

    /// Interrupt frames the emulator sent that were never read.
    pub fn unread_frames(&self) -> Vec<Vec<u8>> {
        self.interrupt.drain()
    }

    /// Close both channels from the console side.
    pub async fn disconnect(&self) {
        // MockChannel::close is infallible
        let _ = self.interrupt.close().await;
        let _ = self.control.close().await;
    }

    /// Whether both channels are still up.
    pub fn is_connected(&self) -> bool {
        self.control.is_open() && self.interrupt.is_open()
    }

    fn next_counter(&self) -> u8 {
        self.packet_counter.fetch_add(1, Ordering::Relaxed) & 0x0F
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_send_receive() -> Result<(), TransportError> {
        let (a, b) = MockChannel::pair(ChannelKind::Interrupt, 4);
        a.send(&[0xA2, 0x01]).await?;
        assert_eq!(b.receive().await?, vec![0xA2, 0x01]);
        b.send(&[0xA1]).await?;
        assert_eq!(a.receive().await?, vec![0xA1]);
        Ok(())
    }

    #[tokio::test]
    async fn test_close_wakes_pending_receive() {
        let (a, b) = MockChannel::pair(ChannelKind::Control, 4);
        let b = Arc::new(b);
        let waiter = {
            let b = Arc::clone(&b);
            tokio::spawn(async move { b.receive().await })
        };
        tokio::task::yield_now().await;
        let _ = a.close().await;
        let result = waiter.await;
        assert!(matches!(
            result,
            Ok(Err(TransportError::TransportClosed { ref channel })) if channel == "control"
        ));
        assert!(!b.is_open());
        assert!(b.send(&[0]).await.is_err());
    }

    #[tokio::test]
    async fn test_unpowered_adapter() {
        let adapter = MockAdapter::new().unpowered();
        let record = SdpRecord::for_profile(&nxbridge_hid_switch_protocol::ControllerProfile::default());
        let result = adapter.advertise(&record, "Pro Controller").await;
        assert!(matches!(result, Err(TransportError::AdapterUnavailable(_))));
    }

    #[tokio::test]
    async fn test_accept_waits_for_console() -> Result<(), TransportError> {
        let adapter = MockAdapter::new();
        let accepting = {
            let adapter = adapter.clone();
            tokio::spawn(async move { adapter.accept().await })
        };
        tokio::task::yield_now().await;
        let console = adapter.connect_console();
        let accepted = accepting.await;
        let Ok(Ok((control, _interrupt, peer))) = accepted else {
            panic!("accept failed");
        };
        assert_eq!(peer, CONSOLE_ADDRESS);
        console.send_control(&[0x52, 0x01]).await?;
        assert_eq!(control.receive().await?, vec![0x52, 0x01]);
        assert_eq!(adapter.accepted_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_counter_wraps_at_16() -> Result<(), TransportError> {
        let adapter = MockAdapter::new();
        let console = adapter.connect_console();
        let (_control, interrupt, _) = adapter.accept().await?;
        for expected in (0..16).chain(0..2) {
            console.send_rumble().await?;
            let frame = interrupt.receive().await?;
            assert_eq!(frame[2], expected);
        }
        Ok(())
    }
}
