//! Bluetooth HID transport (HIDP) header byte.
//!
//! Every message on the HID control and interrupt channels starts with one
//! header byte: transaction type in the high nibble, a type-specific parameter
//! in the low nibble. Input reports go out as `DATA | Input` (0xA1) and the
//! console's output reports arrive as `DATA | Output` (0xA2).

use nxbridge_errors::ReportError;

/// HIDP transaction types (high nibble).
pub mod transaction {
    /// Handshake result
    pub const HANDSHAKE: u8 = 0x0;
    /// HID control operation
    pub const HID_CONTROL: u8 = 0x1;
    /// Get report request
    pub const GET_REPORT: u8 = 0x4;
    /// Set report request
    pub const SET_REPORT: u8 = 0x5;
    /// Get protocol request
    pub const GET_PROTOCOL: u8 = 0x6;
    /// Set protocol request
    pub const SET_PROTOCOL: u8 = 0x7;
    /// Report data
    pub const DATA: u8 = 0xA;
}

/// Report type parameter used with GET_REPORT/SET_REPORT/DATA.
pub mod report_type {
    /// Other
    pub const OTHER: u8 = 0x0;
    /// Input report
    pub const INPUT: u8 = 0x1;
    /// Output report
    pub const OUTPUT: u8 = 0x2;
    /// Feature report
    pub const FEATURE: u8 = 0x3;
}

/// HANDSHAKE result codes.
pub mod result {
    /// Request completed
    pub const SUCCESSFUL: u8 = 0x0;
    /// Device not ready
    pub const NOT_READY: u8 = 0x1;
    /// Invalid report id
    pub const ERR_INVALID_REPORT_ID: u8 = 0x2;
    /// Request not supported
    pub const ERR_UNSUPPORTED_REQUEST: u8 = 0x3;
    /// Invalid parameter
    pub const ERR_INVALID_PARAMETER: u8 = 0x4;
    /// Unknown failure
    pub const ERR_UNKNOWN: u8 = 0xE;
    /// Fatal failure
    pub const ERR_FATAL: u8 = 0xF;
}

/// HID_CONTROL operations.
pub mod control {
    /// No operation
    pub const NOP: u8 = 0x0;
    /// Hard reset
    pub const HARD_RESET: u8 = 0x1;
    /// Soft reset
    pub const SOFT_RESET: u8 = 0x2;
    /// Suspend
    pub const SUSPEND: u8 = 0x3;
    /// Exit suspend
    pub const EXIT_SUSPEND: u8 = 0x4;
    /// Virtual cable unplug (disconnect request)
    pub const VIRTUAL_CABLE_UNPLUG: u8 = 0x5;
}

/// Build a header byte.
pub const fn header(transaction: u8, param: u8) -> u8 {
    (transaction << 4) | (param & 0x0F)
}

/// `DATA | Input`, prefixed to every input report.
pub const DATA_INPUT: u8 = header(transaction::DATA, report_type::INPUT);

/// `DATA | Output`, prefixed to every console output report.
pub const DATA_OUTPUT: u8 = header(transaction::DATA, report_type::OUTPUT);

/// A classified HIDP message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message<'a> {
    /// Handshake with a result code
    Handshake(u8),
    /// HID_CONTROL with an operation code
    HidControl(u8),
    /// GET_REPORT with report type
    GetReport(u8),
    /// SET_REPORT with report type and report bytes (report id first)
    SetReport(u8, &'a [u8]),
    /// GET_PROTOCOL
    GetProtocol,
    /// SET_PROTOCOL with protocol bit
    SetProtocol(u8),
    /// DATA with report type and report bytes (report id first)
    Data(u8, &'a [u8]),
}

impl<'a> Message<'a> {
    /// Classify one frame received on a HID channel.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::TooShort`] for an empty frame and
    /// [`ReportError::BadHeader`] for a reserved transaction type.
    pub fn parse(frame: &'a [u8]) -> Result<Self, ReportError> {
        let (&head, rest) = frame
            .split_first()
            .ok_or_else(|| ReportError::too_short(0, 1))?;
        let param = head & 0x0F;
        match head >> 4 {
            transaction::HANDSHAKE => Ok(Message::Handshake(param)),
            transaction::HID_CONTROL => Ok(Message::HidControl(param)),
            transaction::GET_REPORT => Ok(Message::GetReport(param & 0x03)),
            transaction::SET_REPORT => Ok(Message::SetReport(param & 0x03, rest)),
            transaction::GET_PROTOCOL => Ok(Message::GetProtocol),
            transaction::SET_PROTOCOL => Ok(Message::SetProtocol(param & 0x01)),
            transaction::DATA => Ok(Message::Data(param & 0x03, rest)),
            _ => Err(ReportError::BadHeader { header: head }),
        }
    }

    /// Check if this is the console's disconnect request.
    pub fn is_virtual_cable_unplug(&self) -> bool {
        matches!(self, Message::HidControl(control::VIRTUAL_CABLE_UNPLUG))
    }
}

/// Build the one-byte HANDSHAKE response for a control-channel request.
pub const fn handshake(result_code: u8) -> [u8; 1] {
    [header(transaction::HANDSHAKE, result_code)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_headers() {
        assert_eq!(DATA_INPUT, 0xA1);
        assert_eq!(DATA_OUTPUT, 0xA2);
        assert_eq!(header(transaction::SET_REPORT, report_type::OUTPUT), 0x52);
    }

    #[test]
    fn test_parse_data_output() -> Result<(), ReportError> {
        let frame = [0xA2, 0x01, 0x00];
        assert_eq!(
            Message::parse(&frame)?,
            Message::Data(report_type::OUTPUT, &[0x01, 0x00])
        );
        Ok(())
    }

    #[test]
    fn test_parse_virtual_cable_unplug() -> Result<(), ReportError> {
        let msg = Message::parse(&[0x15])?;
        assert!(msg.is_virtual_cable_unplug());
        assert!(!Message::parse(&[0x13])?.is_virtual_cable_unplug());
        Ok(())
    }

    #[test]
    fn test_parse_rejects_empty_and_reserved() {
        assert_eq!(Message::parse(&[]), Err(ReportError::too_short(0, 1)));
        assert_eq!(
            Message::parse(&[0x21]),
            Err(ReportError::BadHeader { header: 0x21 })
        );
    }

    #[test]
    fn test_handshake_bytes() {
        assert_eq!(handshake(result::SUCCESSFUL), [0x00]);
        assert_eq!(handshake(result::ERR_UNSUPPORTED_REQUEST), [0x03]);
    }
}
