//! Input report encoding (controller to console).
//!
//! All offsets below are relative to the report id, i.e. without the HIDP
//! `0xA1` header. They are fixed by console firmware.

use nxbridge_errors::ReportError;

use crate::buttons::Buttons;
use crate::hidp;
use crate::ids::{VIBRATOR_IDLE, input_report_ids};
use crate::input::{BatteryStatus, InputState};
use crate::stick::StickPosition;
use crate::subcommand::{MAX_REPLY_DATA, SubcommandReply};

/// Input report byte offsets.
pub mod offsets {
    /// Report id
    pub const REPORT_ID: usize = 0;
    /// Timer byte
    pub const TIMER: usize = 1;
    /// Battery and connection info
    pub const BATTERY: usize = 2;
    /// Three button bytes
    pub const BUTTONS: usize = 3;
    /// Left stick (3 bytes)
    pub const LEFT_STICK: usize = 6;
    /// Right stick (3 bytes)
    pub const RIGHT_STICK: usize = 9;
    /// Vibrator input report byte
    pub const VIBRATOR: usize = 12;
    /// Subcommand ack (0x21 only)
    pub const ACK: usize = 13;
    /// Subcommand id being answered (0x21 only)
    pub const SUBCOMMAND_ID: usize = 14;
    /// Reply data (0x21 only)
    pub const REPLY_DATA: usize = 15;
}

/// Common header length shared by every input report.
pub const COMMON_LEN: usize = 13;

/// Length of a 0x30 report.
pub const FULL_REPORT_LEN: usize = 49;

/// Length of a 0x21 report.
pub const REPLY_REPORT_LEN: usize = offsets::REPLY_DATA + MAX_REPLY_DATA;

/// Length of a 0x31 report.
pub const NFC_IR_REPORT_LEN: usize = 362;

/// Largest frame the codec produces, HIDP header included.
pub const MAX_FRAME_LEN: usize = 1 + NFC_IR_REPORT_LEN;

/// Which input report to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// 0x30: standard full report
    Full,
    /// 0x31: full report with (empty) NFC/IR section
    NfcIr,
    /// 0x21: standard report carrying a subcommand reply
    SubcommandReply(SubcommandReply),
}

impl ReportKind {
    /// Report id for this kind.
    pub fn report_id(&self) -> u8 {
        match self {
            ReportKind::Full => input_report_ids::FULL,
            ReportKind::NfcIr => input_report_ids::NFC_IR,
            ReportKind::SubcommandReply(_) => input_report_ids::SUBCOMMAND_REPLY,
        }
    }

    /// Report length without the HIDP header.
    pub fn report_len(&self) -> usize {
        match self {
            ReportKind::Full => FULL_REPORT_LEN,
            ReportKind::NfcIr => NFC_IR_REPORT_LEN,
            ReportKind::SubcommandReply(_) => REPLY_REPORT_LEN,
        }
    }
}

/// One encoded input report in a fixed-size buffer.
///
/// Slot 0 always holds the HIDP `DATA | Input` header so the frame can go
/// onto the interrupt channel without copying.
#[derive(Clone, PartialEq, Eq)]
pub struct ReportFrame {
    buf: [u8; MAX_FRAME_LEN],
    len: usize,
}

impl ReportFrame {
    fn new(len: usize) -> Self {
        let mut buf = [0u8; MAX_FRAME_LEN];
        buf[0] = hidp::DATA_INPUT;
        Self {
            buf,
            len: len.min(NFC_IR_REPORT_LEN),
        }
    }

    /// Report bytes starting at the report id.
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.get(1..=self.len).unwrap_or(&[])
    }

    /// Report bytes with the HIDP header, as sent on the interrupt channel.
    pub fn as_wire(&self) -> &[u8] {
        self.buf.get(..=self.len).unwrap_or(&[])
    }

    /// Report id.
    pub fn report_id(&self) -> u8 {
        self.buf[1]
    }

    /// Report length without the HIDP header.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; every report has at least the common header.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn body_mut(&mut self) -> &mut [u8] {
        let len = self.len;
        &mut self.buf[1..=len]
    }
}

impl core::fmt::Debug for ReportFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReportFrame")
            .field("report_id", &format_args!("{:#04x}", self.report_id()))
            .field("len", &self.len)
            .finish()
    }
}

/// Encode one input report.
///
/// Pure: the same arguments always yield the same bytes.
pub fn encode_input_report(
    kind: &ReportKind,
    state: &InputState,
    timer: u8,
    battery: BatteryStatus,
) -> ReportFrame {
    let mut frame = ReportFrame::new(kind.report_len());
    let body = frame.body_mut();

    body[offsets::REPORT_ID] = kind.report_id();
    body[offsets::TIMER] = timer;
    body[offsets::BATTERY] = battery.to_byte();
    body[offsets::BUTTONS..offsets::LEFT_STICK].copy_from_slice(&state.buttons.to_wire());
    body[offsets::LEFT_STICK..offsets::RIGHT_STICK].copy_from_slice(&state.left_stick.to_wire());
    body[offsets::RIGHT_STICK..offsets::VIBRATOR].copy_from_slice(&state.right_stick.to_wire());
    body[offsets::VIBRATOR] = VIBRATOR_IDLE;

    if let ReportKind::SubcommandReply(reply) = kind {
        body[offsets::ACK] = reply.ack;
        body[offsets::SUBCOMMAND_ID] = reply.subcommand_id;
        let data = reply.data();
        body[offsets::REPLY_DATA..offsets::REPLY_DATA + data.len()].copy_from_slice(data);
    }

    frame
}

/// A decoded input report, as the console would see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputReport {
    /// Report id
    pub report_id: u8,
    /// Timer byte
    pub timer: u8,
    /// Battery and connection byte
    pub battery: BatteryStatus,
    /// Buttons and sticks
    pub state: InputState,
    /// Vibrator byte
    pub vibrator: u8,
    /// Ack, subcommand id and data for 0x21 reports
    pub reply: Option<SubcommandReply>,
}

/// Decode an input report, with or without the HIDP header.
///
/// # Errors
///
/// Returns a [`ReportError`] if the frame is shorter than its report id's
/// layout or the id is not an input report.
pub fn decode_input_report(bytes: &[u8]) -> Result<InputReport, ReportError> {
    let body = match bytes.split_first() {
        Some((&hidp::DATA_INPUT, rest)) => rest,
        Some(_) => bytes,
        None => return Err(ReportError::too_short(0, COMMON_LEN)),
    };
    let report_id = body.first().copied().unwrap_or(0);
    let min = match report_id {
        input_report_ids::FULL => FULL_REPORT_LEN,
        input_report_ids::NFC_IR => NFC_IR_REPORT_LEN,
        input_report_ids::SUBCOMMAND_REPLY => offsets::REPLY_DATA,
        id => return Err(ReportError::UnknownReportId { id }),
    };
    if body.len() < min {
        return Err(ReportError::too_short(body.len(), min));
    }

    let three = |at: usize| -> [u8; 3] { [body[at], body[at + 1], body[at + 2]] };
    let state = InputState {
        buttons: Buttons::from_wire(three(offsets::BUTTONS)),
        left_stick: StickPosition::from_wire(three(offsets::LEFT_STICK)),
        right_stick: StickPosition::from_wire(three(offsets::RIGHT_STICK)),
    };

    let reply = (report_id == input_report_ids::SUBCOMMAND_REPLY).then(|| {
        SubcommandReply::with_id(
            0,
            body[offsets::SUBCOMMAND_ID],
            body[offsets::ACK],
            body.get(offsets::REPLY_DATA..).unwrap_or(&[]),
        )
    });

    Ok(InputReport {
        report_id,
        timer: body[offsets::TIMER],
        battery: BatteryStatus::from_byte(body[offsets::BATTERY]),
        state,
        vibrator: body[offsets::VIBRATOR],
        reply,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ack;
    use crate::subcommand::{Subcommand, SubcommandRequest};

    #[test]
    fn test_full_report_layout() {
        let state = InputState {
            buttons: Buttons::A | Buttons::HOME | Buttons::DPAD_UP,
            left_stick: StickPosition::new(0, 0),
            right_stick: StickPosition::new(2047, -2048),
        };
        let frame = encode_input_report(&ReportKind::Full, &state, 0x2A, BatteryStatus::default());
        let b = frame.as_bytes();
        assert_eq!(b.len(), FULL_REPORT_LEN);
        assert_eq!(&b[..13], &[
            0x30, 0x2A, 0x90, 0x08, 0x10, 0x02, 0x00, 0x08, 0x80, 0xFF, 0x0F, 0x00, 0x80
        ]);
        assert!(b[13..].iter().all(|&x| x == 0));
        assert_eq!(frame.as_wire()[0], 0xA1);
        assert_eq!(frame.as_wire().len(), FULL_REPORT_LEN + 1);
    }

    #[test]
    fn test_reply_report_layout() {
        let req = SubcommandRequest {
            packet_counter: 1,
            rumble: [0; 8],
            subcommand: Subcommand::SetInputReportMode(0x30),
            sequence: 0,
        };
        let reply = SubcommandReply::new(&req, ack::GENERIC, &[]);
        let frame = encode_input_report(
            &ReportKind::SubcommandReply(reply),
            &InputState::NEUTRAL,
            3,
            BatteryStatus::default(),
        );
        let b = frame.as_bytes();
        assert_eq!(b.len(), REPLY_REPORT_LEN);
        assert_eq!(b[0], 0x21);
        assert_eq!(b[13], 0x80);
        assert_eq!(b[14], 0x03);
    }

    #[test]
    fn test_nfc_ir_report_length() {
        let frame = encode_input_report(
            &ReportKind::NfcIr,
            &InputState::NEUTRAL,
            0,
            BatteryStatus::default(),
        );
        assert_eq!(frame.report_id(), 0x31);
        assert_eq!(frame.len(), NFC_IR_REPORT_LEN);
    }

    #[test]
    fn test_decode_rejects_short_and_unknown() {
        assert_eq!(
            decode_input_report(&[0x30, 0x00]),
            Err(ReportError::too_short(2, FULL_REPORT_LEN))
        );
        assert_eq!(
            decode_input_report(&[0x99; 60]),
            Err(ReportError::UnknownReportId { id: 0x99 })
        );
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let state = InputState {
            buttons: Buttons::ZR,
            ..InputState::NEUTRAL
        };
        let a = encode_input_report(&ReportKind::Full, &state, 9, BatteryStatus::default());
        let b = encode_input_report(&ReportKind::Full, &state, 9, BatteryStatus::default());
        assert_eq!(a, b);
    }
}
