//! Error types for the nxbridge CLI

use nxbridge_errors::{SessionError, TransportError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Bluetooth adapter unavailable: {0}")]
    AdapterUnavailable(String),

    #[error("Pairing rejected: {0}")]
    PairingRejected(String),

    #[error("Handshake timed out: {0}")]
    HandshakeTimeout(String),

    #[error("Connection lost: {0}")]
    TransportClosed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Gamepad not found: {0}")]
    DeviceNotFound(String),

    #[error("Gamepad backend error: {0}")]
    Gamepad(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::AdapterUnavailable(_) => 2,
            CliError::PairingRejected(_) => 3,
            CliError::HandshakeTimeout(_) => 4,
            CliError::TransportClosed(_) => 5,
            CliError::InvalidConfiguration(_) | CliError::JsonError(_) => 6,
            CliError::DeviceNotFound(_) => 7,
            CliError::Gamepad(_) | CliError::IoError(_) => 1,
        }
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Transport(TransportError::AdapterUnavailable(reason)) => {
                CliError::AdapterUnavailable(reason)
            }
            SessionError::Transport(TransportError::PairingRejected(reason)) => {
                CliError::PairingRejected(reason)
            }
            SessionError::HandshakeTimeout { .. } => CliError::HandshakeTimeout(e.to_string()),
            SessionError::InvalidConfig(reason) => CliError::InvalidConfiguration(reason),
            other => CliError::TransportClosed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_errors_map_to_exit_codes() {
        let cases = [
            (
                SessionError::from(TransportError::adapter_unavailable("hci0 down")),
                2,
            ),
            (
                SessionError::from(TransportError::pairing_rejected("declined")),
                3,
            ),
            (SessionError::handshake_timeout(10_000, 3), 4),
            (SessionError::from(TransportError::closed("interrupt")), 5),
            (SessionError::config("tick_interval_ms must be > 0"), 6),
        ];
        for (error, code) in cases {
            assert_eq!(CliError::from(error).exit_code(), code);
        }
    }
}
