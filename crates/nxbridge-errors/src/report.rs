//! Report decoding errors.
//!
//! Every variant is a "malformed report": the frame is logged and dropped and
//! the session carries on in whatever state it was in.

use crate::common::ErrorSeverity;

/// A frame that could not be decoded into an output report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// Frame shorter than the smallest valid layout
    #[error("Malformed report: {len} bytes, need at least {min}")]
    TooShort {
        /// Received length
        len: usize,
        /// Minimum length for the layout
        min: usize,
    },

    /// Transport header byte is not a DATA/Output header
    #[error("Malformed report: unexpected HIDP header {header:#04x}")]
    BadHeader {
        /// Offending header byte
        header: u8,
    },

    /// Report id is not one the console sends
    #[error("Malformed report: unknown report id {id:#04x}")]
    UnknownReportId {
        /// Offending report id
        id: u8,
    },

    /// Subcommand payload is shorter than its fixed argument block
    #[error("Malformed report: subcommand {subcommand:#04x} needs {expected} argument bytes, got {actual}")]
    TruncatedArguments {
        /// Subcommand id
        subcommand: u8,
        /// Required argument bytes
        expected: usize,
        /// Available argument bytes
        actual: usize,
    },

    /// Encoder input that cannot be represented on the wire
    #[error("Malformed report: {0}")]
    Invalid(String),
}

impl ReportError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }

    /// Create a too-short error.
    pub fn too_short(len: usize, min: usize) -> Self {
        ReportError::TooShort { len, min }
    }

    /// Create an invalid-content error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        ReportError::Invalid(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_error_is_warning() {
        assert_eq!(
            ReportError::too_short(2, 11).severity(),
            ErrorSeverity::Warning
        );
        assert_eq!(
            ReportError::UnknownReportId { id: 0x7F }.severity(),
            ErrorSeverity::Warning
        );
    }

    #[test]
    fn test_report_error_display() {
        let msg = ReportError::too_short(2, 11).to_string();
        assert!(msg.contains("Malformed report"));
        assert!(msg.contains('2'));
        assert!(msg.contains("11"));

        let msg = ReportError::BadHeader { header: 0x52 }.to_string();
        assert!(msg.contains("0x52"));
    }
}
