//! Top-level session error and error classification.

use core::fmt;

use crate::{ReportError, TransportError};

/// Top-level error reported by a controller session.
///
/// Only [`SessionError::MalformedReport`] is survivable; every other variant
/// ends the session (see [`SessionError::is_fatal`]).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A console frame could not be decoded
    #[error(transparent)]
    MalformedReport(#[from] ReportError),

    /// The Bluetooth transport failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The console did not finish the handshake in time
    #[error("Handshake timed out after {elapsed_ms}ms ({retries} retries)")]
    HandshakeTimeout {
        /// Time since pairing started
        elapsed_ms: u64,
        /// Retry nudges sent before giving up
        retries: u32,
    },

    /// Session configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// `start` called on a running session
    #[error("Session already started")]
    AlreadyStarted,

    /// Operation requires a running session
    #[error("Session not started")]
    NotStarted,
}

impl SessionError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SessionError::MalformedReport(_) => ErrorCategory::Codec,
            SessionError::Transport(_) => ErrorCategory::Transport,
            SessionError::HandshakeTimeout { .. } => ErrorCategory::Handshake,
            SessionError::InvalidConfig(_) => ErrorCategory::Config,
            SessionError::AlreadyStarted | SessionError::NotStarted => ErrorCategory::Lifecycle,
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SessionError::MalformedReport(e) => e.severity(),
            SessionError::Transport(e) => e.severity(),
            SessionError::HandshakeTimeout { .. } => ErrorSeverity::Error,
            SessionError::InvalidConfig(_) => ErrorSeverity::Error,
            SessionError::AlreadyStarted | SessionError::NotStarted => ErrorSeverity::Info,
        }
    }

    /// Check if this error terminates the session.
    pub fn is_fatal(&self) -> bool {
        match self {
            SessionError::MalformedReport(_) => false,
            SessionError::AlreadyStarted | SessionError::NotStarted => false,
            SessionError::Transport(_)
            | SessionError::HandshakeTimeout { .. }
            | SessionError::InvalidConfig(_) => true,
        }
    }

    /// Check if a fresh pairing cycle might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Check if this is a transport-closed error.
    pub fn is_transport_closed(&self) -> bool {
        matches!(self, SessionError::Transport(e) if e.is_closed())
    }

    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        SessionError::InvalidConfig(msg.into())
    }

    /// Create a handshake timeout error.
    pub fn handshake_timeout(elapsed_ms: u64, retries: u32) -> Self {
        SessionError::HandshakeTimeout {
            elapsed_ms,
            retries,
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        SessionError::Transport(e.into())
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Report encoding or decoding
    Codec = 0,
    /// Bluetooth adapter and channels
    Transport = 1,
    /// Console handshake
    Handshake = 2,
    /// Configuration
    Config = 3,
    /// Session start/stop misuse
    Lifecycle = 4,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Codec => write!(f, "Codec"),
            ErrorCategory::Transport => write!(f, "Transport"),
            ErrorCategory::Handshake => write!(f, "Handshake"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::Lifecycle => write!(f, "Lifecycle"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, logged and dropped
    Warning = 1,
    /// Error, session ends
    Error = 2,
    /// Critical, nothing can run until the host is fixed
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
