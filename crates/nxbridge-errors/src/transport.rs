//! Bluetooth transport errors.

use crate::common::ErrorSeverity;

/// Failures of the Bluetooth adapter or one of its L2CAP channels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No usable Bluetooth adapter
    #[error("Bluetooth adapter unavailable: {0}")]
    AdapterUnavailable(String),

    /// The console refused or abandoned pairing
    #[error("Pairing rejected: {0}")]
    PairingRejected(String),

    /// An established channel went away
    #[error("Transport closed: {channel} channel")]
    TransportClosed {
        /// Channel name ("control" or "interrupt")
        channel: String,
    },

    /// Socket-level I/O failure
    #[error("Transport I/O error: {0}")]
    Io(String),
}

impl TransportError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TransportError::AdapterUnavailable(_) => ErrorSeverity::Critical,
            TransportError::PairingRejected(_) => ErrorSeverity::Error,
            TransportError::TransportClosed { .. } => ErrorSeverity::Error,
            TransportError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Check if a fresh pairing cycle might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::PairingRejected(_))
    }

    /// Check if this error means the link to the console is gone.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            TransportError::TransportClosed { .. } | TransportError::Io(_)
        )
    }

    /// Create an adapter-unavailable error.
    pub fn adapter_unavailable(reason: impl Into<String>) -> Self {
        TransportError::AdapterUnavailable(reason.into())
    }

    /// Create a pairing-rejected error.
    pub fn pairing_rejected(reason: impl Into<String>) -> Self {
        TransportError::PairingRejected(reason.into())
    }

    /// Create a transport-closed error for the named channel.
    pub fn closed(channel: impl Into<String>) -> Self {
        TransportError::TransportClosed {
            channel: channel.into(),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof => TransportError::closed(e.to_string()),
            _ => TransportError::Io(e.to_string()),
        }
    }
}
