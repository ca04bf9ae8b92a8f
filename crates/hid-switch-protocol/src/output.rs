//! Output report decoding (console to controller).
//!
//! Layout without the HIDP header:
//!
//! ```text
//! [0]     report id (0x01 rumble + subcommand, 0x10 rumble only)
//! [1]     global packet counter (low nibble)
//! [2..10] rumble data, 4 bytes per side
//! [10]    subcommand id (0x01 only)
//! [11..]  subcommand arguments
//! ```

use nxbridge_errors::ReportError;

use crate::hidp;
use crate::ids::output_report_ids;
use crate::subcommand::{Subcommand, SubcommandRequest};

/// Neutral rumble frame (both motors idle).
pub const RUMBLE_NEUTRAL: [u8; 8] = [0x00, 0x01, 0x40, 0x40, 0x00, 0x01, 0x40, 0x40];

const RUMBLE_OFFSET: usize = 2;
const SUBCOMMAND_OFFSET: usize = RUMBLE_OFFSET + 8;

/// Minimum length of a rumble-only report.
pub const MIN_RUMBLE_LEN: usize = SUBCOMMAND_OFFSET;

/// Minimum length of a rumble + subcommand report.
pub const MIN_SUBCOMMAND_LEN: usize = SUBCOMMAND_OFFSET + 1;

/// One decoded output report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputReport {
    /// 0x01: rumble plus a subcommand that needs exactly one reply
    Subcommand(SubcommandRequest),
    /// 0x10: rumble only, no reply
    Rumble {
        /// Packet counter (low nibble)
        packet_counter: u8,
        /// Rumble data
        rumble: [u8; 8],
    },
}

/// Decode an output report, with or without the HIDP `0xA2` header.
///
/// The returned request has sequence number 0; the state machine numbers
/// requests in arrival order.
///
/// # Errors
///
/// Returns a [`ReportError`] (a malformed report) when the header byte, report
/// id or length is invalid.
pub fn decode_output_report(bytes: &[u8]) -> Result<OutputReport, ReportError> {
    let body = match bytes.split_first() {
        Some((&hidp::DATA_OUTPUT, rest)) => rest,
        Some((&head, _)) if head >> 4 == hidp::transaction::DATA => {
            return Err(ReportError::BadHeader { header: head });
        }
        Some(_) => bytes,
        None => return Err(ReportError::too_short(0, MIN_RUMBLE_LEN)),
    };

    let report_id = body.first().copied().unwrap_or(0);
    let min = match report_id {
        output_report_ids::RUMBLE_AND_SUBCOMMAND => MIN_SUBCOMMAND_LEN,
        output_report_ids::RUMBLE_ONLY => MIN_RUMBLE_LEN,
        // too short to be any output report
        _ if body.len() < MIN_RUMBLE_LEN => {
            return Err(ReportError::too_short(body.len(), MIN_RUMBLE_LEN));
        }
        id => return Err(ReportError::UnknownReportId { id }),
    };
    if body.len() < min {
        return Err(ReportError::too_short(body.len(), min));
    }

    let packet_counter = body[1] & 0x0F;
    let mut rumble = [0u8; 8];
    rumble.copy_from_slice(&body[RUMBLE_OFFSET..SUBCOMMAND_OFFSET]);

    if report_id == output_report_ids::RUMBLE_ONLY {
        return Ok(OutputReport::Rumble {
            packet_counter,
            rumble,
        });
    }

    let subcommand = Subcommand::decode(
        body[SUBCOMMAND_OFFSET],
        body.get(SUBCOMMAND_OFFSET + 1..).unwrap_or(&[]),
    )?;
    Ok(OutputReport::Subcommand(SubcommandRequest {
        packet_counter,
        rumble,
        subcommand,
        sequence: 0,
    }))
}

/// Encode a rumble + subcommand output report with the HIDP header
/// (console side, used by tests and simulators).
pub fn encode_subcommand_report(packet_counter: u8, subcommand: &Subcommand) -> Vec<u8> {
    let mut out = vec![
        hidp::DATA_OUTPUT,
        output_report_ids::RUMBLE_AND_SUBCOMMAND,
        packet_counter & 0x0F,
    ];
    out.extend_from_slice(&RUMBLE_NEUTRAL);
    out.push(subcommand.id());
    out.extend_from_slice(&subcommand.encode_args());
    out
}

/// Encode a rumble-only output report with the HIDP header.
pub fn encode_rumble_report(packet_counter: u8, rumble: [u8; 8]) -> Vec<u8> {
    let mut out = vec![
        hidp::DATA_OUTPUT,
        output_report_ids::RUMBLE_ONLY,
        packet_counter & 0x0F,
    ];
    out.extend_from_slice(&rumble);
    out
}
