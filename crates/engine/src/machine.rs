//! Protocol state machine.
//!
//! [`ProtocolMachine`] is I/O-free. It answers subcommands, tracks handshake
//! progress and session state, and builds the next input report for each
//! tick. The session runtime owns the timing and the channels.

use nxbridge_hid_switch_protocol::ids::ack;
use nxbridge_hid_switch_protocol::{
    BatteryStatus, BdAddr, ControllerProfile, InputReportMode, InputState, OutputReport,
    ReportFrame, ReportKind, SpiFlash, Subcommand, SubcommandReply, SubcommandRequest,
    encode_input_report,
};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::handshake::{HandshakeProgress, step_for};
use crate::state::{SessionState, Transition};

/// Reply payload of the NFC/IR MCU configuration subcommand.
const NFC_IR_CONFIG_REPLY: [u8; 8] = [0x01, 0x00, 0xFF, 0x00, 0x08, 0x00, 0x1B, 0x01];

/// Checksum byte closing the NFC/IR MCU configuration reply.
const NFC_IR_CONFIG_CRC: u8 = 0xC8;
const NFC_IR_CONFIG_CRC_OFFSET: usize = 33;

/// Controller settings requested by the console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ControllerStatus {
    /// Selected input report mode, `None` until the console picks one
    pub input_mode: Option<InputReportMode>,
    /// Player lights pattern (low nibble on, high nibble flashing)
    pub player_lights: u8,
    /// HOME light configured
    pub home_light: bool,
    /// Rumble enabled
    pub vibration_enabled: bool,
    /// 6-axis sensor enabled (no IMU data is streamed)
    pub imu_enabled: bool,
    /// Shipment low-power mode requested
    pub low_power: bool,
    /// NFC/IR MCU state
    pub nfc_ir_state: u8,
    /// Console address from Bluetooth pairing
    pub host_address: Option<BdAddr>,
}

/// What handling one output report produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// Rumble-only report; nothing to send
    Rumble,
    /// A subcommand and the reply to emit for it
    Reply {
        /// The request with its assigned sequence number
        request: SubcommandRequest,
        /// The reply
        reply: SubcommandReply,
    },
}

/// Switch controller protocol state machine.
#[derive(Debug, Clone)]
pub struct ProtocolMachine {
    state: SessionState,
    profile: ControllerProfile,
    spi: SpiFlash,
    battery: BatteryStatus,
    progress: HandshakeProgress,
    status: ControllerStatus,
    next_sequence: u64,
    timer: u8,
    transitions: Vec<Transition>,
}

impl ProtocolMachine {
    /// New machine in `Disconnected`.
    pub fn new(profile: ControllerProfile, config: &SessionConfig) -> Self {
        let battery = BatteryStatus {
            connection_info: profile.kind.connection_info(),
            ..config.battery
        };
        Self {
            state: SessionState::Disconnected,
            spi: SpiFlash::from_profile(&profile),
            profile,
            battery,
            progress: HandshakeProgress::new(&config.required_handshake_steps),
            status: ControllerStatus::default(),
            next_sequence: 0,
            timer: 0,
            transitions: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Emulated controller identity.
    pub fn profile(&self) -> &ControllerProfile {
        &self.profile
    }

    /// Settings requested by the console so far.
    pub fn status(&self) -> ControllerStatus {
        self.status
    }

    /// Timer byte of the next input report.
    pub fn timer(&self) -> u8 {
        self.timer
    }

    /// Handshake progress.
    pub fn progress(&self) -> &HandshakeProgress {
        &self.progress
    }

    /// Move to `to` if the transition is legal. Returns whether it happened.
    pub fn transition(&mut self, to: SessionState) -> bool {
        let from = self.state;
        if !from.can_transition_to(to) {
            if from != to {
                warn!(%from, %to, "ignoring illegal state transition");
            }
            return false;
        }
        self.state = to;
        info!(%from, %to, "session state changed");
        self.transitions.push(Transition { from, to });
        true
    }

    /// Drain transitions made since the last call.
    pub fn take_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.transitions)
    }

    /// Forget everything learned from the previous console and return to
    /// `Disconnected`.
    pub fn reset(&mut self) {
        if self.state != SessionState::Disconnected {
            self.transition(SessionState::Disconnected);
        }
        self.progress.reset();
        self.status = ControllerStatus::default();
    }

    /// Both channels are up: `Disconnected -> Pairing`.
    pub fn on_connected(&mut self, peer: BdAddr) {
        debug!(%peer, "console link up");
        self.transition(SessionState::Pairing);
    }

    /// Whether input reports are streamed every tick.
    pub fn is_streaming(&self) -> bool {
        let mode_selected = self
            .status
            .input_mode
            .is_some_and(InputReportMode::is_streaming);
        match self.state {
            SessionState::Active => true,
            SessionState::Pairing | SessionState::Handshaking => mode_selected,
            _ => false,
        }
    }

    /// Handle one decoded output report.
    ///
    /// Subcommands get the next sequence number and exactly one reply.
    /// Returns `None` when the machine is not connected.
    pub fn handle_output(&mut self, report: OutputReport) -> Option<Handled> {
        if !self.state.is_connected() {
            debug!(state = %self.state, "output report outside a connection dropped");
            return None;
        }
        let mut request = match report {
            OutputReport::Rumble { packet_counter, .. } => {
                trace!(packet_counter, "rumble");
                return Some(Handled::Rumble);
            }
            OutputReport::Subcommand(request) => request,
        };
        request.sequence = self.next_sequence;
        self.next_sequence += 1;

        if self.state == SessionState::Pairing {
            self.transition(SessionState::Handshaking);
        }

        let reply = self.reply_for(&request);
        debug!(
            subcommand = format_args!("{:#04x}", request.subcommand.id()),
            sequence = request.sequence,
            ack = format_args!("{:#04x}", reply.ack),
            "subcommand"
        );

        if let Some(step) = step_for(&request.subcommand)
            && self.progress.complete(step)
        {
            debug!(?step, remaining = ?self.progress.remaining(), "handshake step done");
        }
        if self.state == SessionState::Handshaking && self.progress.is_complete() {
            self.transition(SessionState::Active);
        }
        Some(Handled::Reply { request, reply })
    }

    /// Answer one subcommand, updating controller status.
    pub fn reply_for(&mut self, request: &SubcommandRequest) -> SubcommandReply {
        match request.subcommand {
            Subcommand::BluetoothPairing { step, host_address } => {
                if step == 1 {
                    self.status.host_address = Some(BdAddr(host_address));
                }
                SubcommandReply::new(request, ack::BLUETOOTH_PAIRING, &[0x03])
            }
            Subcommand::RequestDeviceInfo => {
                SubcommandReply::new(request, ack::DEVICE_INFO, &self.profile.device_info())
            }
            Subcommand::SetInputReportMode(mode) => {
                match InputReportMode::from_id(mode) {
                    Some(mode) => self.status.input_mode = Some(mode),
                    None => warn!(mode = format_args!("{mode:#04x}"), "unknown input report mode"),
                }
                SubcommandReply::ack(request)
            }
            Subcommand::TriggerButtonsElapsedTime => {
                SubcommandReply::new(request, ack::TRIGGER_ELAPSED, &[])
            }
            Subcommand::SetShipmentLowPower(on) => {
                self.status.low_power = on;
                SubcommandReply::ack(request)
            }
            Subcommand::SpiFlashRead { address, length } => {
                SubcommandReply::new(request, ack::SPI_READ, &self.spi.read_reply(address, length))
            }
            Subcommand::SetNfcIrConfig => {
                let mut data = [0u8; NFC_IR_CONFIG_CRC_OFFSET + 1];
                data[..NFC_IR_CONFIG_REPLY.len()].copy_from_slice(&NFC_IR_CONFIG_REPLY);
                data[NFC_IR_CONFIG_CRC_OFFSET] = NFC_IR_CONFIG_CRC;
                SubcommandReply::new(request, ack::NFC_IR_CONFIG, &data)
            }
            Subcommand::SetNfcIrState(state) => {
                self.status.nfc_ir_state = state;
                SubcommandReply::ack(request)
            }
            Subcommand::SetPlayerLights(pattern) => {
                self.status.player_lights = pattern;
                SubcommandReply::ack(request)
            }
            Subcommand::SetHomeLight => {
                self.status.home_light = true;
                SubcommandReply::ack(request)
            }
            Subcommand::EnableImu(on) => {
                self.status.imu_enabled = on;
                SubcommandReply::ack(request)
            }
            Subcommand::SetImuSensitivity => SubcommandReply::ack(request),
            Subcommand::EnableVibration(on) => {
                self.status.vibration_enabled = on;
                SubcommandReply::ack(request)
            }
            Subcommand::Unrecognized(id) => {
                debug!(subcommand = format_args!("{id:#04x}"), "unrecognized subcommand acked");
                SubcommandReply::ack(request)
            }
        }
    }

    /// Build the report for this tick, if any, and advance the timer.
    ///
    /// A pending reply always goes first. Otherwise a full report is sent
    /// while streaming, or once when `keepalive` is set.
    pub fn next_report(
        &mut self,
        input: &InputState,
        reply: Option<&SubcommandReply>,
        keepalive: bool,
    ) -> Option<ReportFrame> {
        let kind = match reply {
            Some(reply) => ReportKind::SubcommandReply(*reply),
            None if self.is_streaming() || keepalive => match self.status.input_mode {
                Some(InputReportMode::NfcIr) => ReportKind::NfcIr,
                // no 0x3F encoder; stream the full report instead
                Some(InputReportMode::SimpleHid) => {
                    trace!("simple HID mode requested, streaming full reports");
                    ReportKind::Full
                }
                _ => ReportKind::Full,
            },
            None => return None,
        };
        let frame = encode_input_report(&kind, input, self.timer, self.battery);
        self.timer = self.timer.wrapping_add(1);
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandshakeStep;
    use nxbridge_hid_switch_protocol::{Buttons, RUMBLE_NEUTRAL};

    fn machine() -> ProtocolMachine {
        let mut m = ProtocolMachine::new(ControllerProfile::default(), &SessionConfig::default());
        m.on_connected(BdAddr::ANY);
        m
    }

    fn sub(subcommand: Subcommand) -> OutputReport {
        OutputReport::Subcommand(SubcommandRequest {
            packet_counter: 0,
            rumble: RUMBLE_NEUTRAL,
            subcommand,
            sequence: 0,
        })
    }

    fn reply(m: &mut ProtocolMachine, subcommand: Subcommand) -> Option<SubcommandReply> {
        match m.handle_output(sub(subcommand)) {
            Some(Handled::Reply { reply, .. }) => Some(reply),
            _ => None,
        }
    }

    #[test]
    fn test_first_subcommand_starts_handshake() {
        let mut m = machine();
        assert_eq!(m.state(), SessionState::Pairing);
        let r = reply(&mut m, Subcommand::RequestDeviceInfo);
        assert_eq!(m.state(), SessionState::Handshaking);
        let r = r.unwrap_or_else(|| SubcommandReply::with_id(0, 0, 0, &[]));
        assert_eq!(r.ack, 0x82);
        assert_eq!(r.subcommand_id, 0x02);
        assert_eq!(r.data(), &ControllerProfile::default().device_info());
    }

    #[test]
    fn test_full_handshake_reaches_active() {
        let mut m = machine();
        for s in [
            Subcommand::RequestDeviceInfo,
            Subcommand::SetShipmentLowPower(false),
            Subcommand::SpiFlashRead {
                address: 0x6000,
                length: 16,
            },
            Subcommand::SetInputReportMode(0x30),
            Subcommand::EnableVibration(true),
        ] {
            assert!(reply(&mut m, s).is_some());
            assert_eq!(m.state(), SessionState::Handshaking);
        }
        assert!(reply(&mut m, Subcommand::SetPlayerLights(0x01)).is_some());
        assert_eq!(m.state(), SessionState::Active);
        assert_eq!(m.status().player_lights, 0x01);
        assert!(m.status().vibration_enabled);

        let from_to: Vec<_> = m
            .take_transitions()
            .into_iter()
            .map(|t| (t.from, t.to))
            .collect();
        assert_eq!(
            from_to,
            vec![
                (SessionState::Disconnected, SessionState::Pairing),
                (SessionState::Pairing, SessionState::Handshaking),
                (SessionState::Handshaking, SessionState::Active),
            ]
        );
    }

    #[test]
    fn test_reduced_required_steps() {
        let config = SessionConfig {
            required_handshake_steps: vec![HandshakeStep::DeviceInfo],
            ..SessionConfig::default()
        };
        let mut m = ProtocolMachine::new(ControllerProfile::default(), &config);
        m.on_connected(BdAddr::ANY);
        reply(&mut m, Subcommand::RequestDeviceInfo);
        assert_eq!(m.state(), SessionState::Active);
    }

    #[test]
    fn test_sequence_numbers_increase() {
        let mut m = machine();
        let mut last = None;
        for _ in 0..5 {
            let Some(Handled::Reply { request, reply }) =
                m.handle_output(sub(Subcommand::SetHomeLight))
            else {
                panic!("expected a reply");
            };
            assert_eq!(request.sequence, reply.sequence);
            if let Some(last) = last {
                assert_eq!(reply.sequence, last + 1);
            }
            last = Some(reply.sequence);
        }
    }

    #[test]
    fn test_rumble_needs_no_reply() {
        let mut m = machine();
        let handled = m.handle_output(OutputReport::Rumble {
            packet_counter: 3,
            rumble: RUMBLE_NEUTRAL,
        });
        assert_eq!(handled, Some(Handled::Rumble));
        assert_eq!(m.state(), SessionState::Pairing);
    }

    #[test]
    fn test_disconnected_drops_reports() {
        let mut m = ProtocolMachine::new(ControllerProfile::default(), &SessionConfig::default());
        assert!(m.handle_output(sub(Subcommand::RequestDeviceInfo)).is_none());
    }

    #[test]
    fn test_spi_read_reply_layout() {
        let mut m = machine();
        let r = reply(
            &mut m,
            Subcommand::SpiFlashRead {
                address: 0x6050,
                length: 3,
            },
        );
        let r = r.unwrap_or_else(|| SubcommandReply::with_id(0, 0, 0, &[]));
        assert_eq!(r.ack, 0x90);
        assert_eq!(&r.data()[..5], &[0x50, 0x60, 0x00, 0x00, 0x03]);
        assert_eq!(&r.data()[5..], &ControllerProfile::default().colors.body);
    }

    #[test]
    fn test_pairing_records_host() {
        let mut m = machine();
        reply(
            &mut m,
            Subcommand::BluetoothPairing {
                step: 1,
                host_address: [1, 2, 3, 4, 5, 6],
            },
        );
        assert_eq!(m.status().host_address, Some(BdAddr([1, 2, 3, 4, 5, 6])));
    }

    #[test]
    fn test_no_stream_before_mode_selected() {
        let mut m = machine();
        reply(&mut m, Subcommand::RequestDeviceInfo);
        assert!(m.next_report(&InputState::NEUTRAL, None, false).is_none());
        reply(&mut m, Subcommand::SetInputReportMode(0x30));
        let frame = m.next_report(&InputState::NEUTRAL, None, false);
        assert_eq!(frame.map(|f| f.report_id()), Some(0x30));
    }

    #[test]
    fn test_keepalive_sends_one_report() {
        let mut m = machine();
        let frame = m.next_report(&InputState::NEUTRAL, None, true);
        assert_eq!(frame.map(|f| f.report_id()), Some(0x30));
        assert_eq!(m.timer(), 1);
    }

    #[test]
    fn test_reply_takes_precedence_and_timer_wraps() {
        let mut m = machine();
        reply(&mut m, Subcommand::SetInputReportMode(0x30));
        let mut state = InputState::NEUTRAL;
        state.set_buttons(Buttons::A, true);
        for _ in 0..255 {
            m.next_report(&state, None, false);
        }
        assert_eq!(m.timer(), 255);
        let r = SubcommandReply::with_id(9, 0x30, 0x80, &[]);
        let frame = m.next_report(&state, Some(&r), false);
        assert_eq!(frame.map(|f| f.report_id()), Some(0x21));
        assert_eq!(m.timer(), 0);
    }

    #[test]
    fn test_nfc_ir_mode_uses_0x31() {
        let mut m = machine();
        reply(&mut m, Subcommand::SetInputReportMode(0x31));
        let frame = m.next_report(&InputState::NEUTRAL, None, false);
        assert_eq!(frame.map(|f| f.report_id()), Some(0x31));
    }

    #[test]
    fn test_simple_hid_mode_streams_full_reports_once_active() {
        let mut m = machine();
        reply(&mut m, Subcommand::SetInputReportMode(0x3F));
        assert!(m.next_report(&InputState::NEUTRAL, None, false).is_none());

        for s in [
            Subcommand::RequestDeviceInfo,
            Subcommand::SpiFlashRead {
                address: 0x6000,
                length: 16,
            },
            Subcommand::EnableVibration(true),
            Subcommand::SetPlayerLights(0x01),
        ] {
            assert!(reply(&mut m, s).is_some());
        }
        assert_eq!(m.state(), SessionState::Active);
        let frame = m.next_report(&InputState::NEUTRAL, None, false);
        assert_eq!(frame.map(|f| f.report_id()), Some(0x30));
    }

    #[test]
    fn test_joycon_battery_connection_info() {
        let profile = ControllerProfile::for_kind(nxbridge_hid_switch_protocol::ControllerKind::JoyconL);
        let mut m = ProtocolMachine::new(profile, &SessionConfig::default());
        m.on_connected(BdAddr::ANY);
        let frame = m.next_report(&InputState::NEUTRAL, None, true);
        let battery = frame.map(|f| f.as_bytes()[2]);
        assert_eq!(battery, Some(0x9E));
    }

    #[test]
    fn test_reset_clears_status() {
        let mut m = machine();
        reply(&mut m, Subcommand::SetPlayerLights(0x0F));
        m.reset();
        assert_eq!(m.state(), SessionState::Disconnected);
        assert_eq!(m.status(), ControllerStatus::default());
        assert!(!m.progress().is_complete());
    }
}
