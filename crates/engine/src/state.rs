//! Session lifecycle states and observable events.

use std::fmt;

use nxbridge_errors::ReportError;
use serde::{Deserialize, Serialize};

/// Lifecycle of one console connection.
///
/// Transitions only move forward, except that any state may drop straight
/// to `Disconnected` after a transport failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No console link
    #[default]
    Disconnected,
    /// Channels connected, waiting for the first subcommand
    Pairing,
    /// Console is running the handshake sequence
    Handshaking,
    /// Streaming input reports
    Active,
    /// Releasing the transport
    Closing,
}

impl SessionState {
    /// Check whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Disconnected, Pairing)
                | (Pairing, Handshaking)
                | (Handshaking, Active)
                | (Pairing | Handshaking | Active, Closing)
                | (Pairing | Handshaking | Active | Closing, Disconnected)
        )
    }

    /// Whether the console link is up.
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            SessionState::Pairing | SessionState::Handshaking | SessionState::Active
        )
    }

    /// Whether the handshake deadline applies.
    pub fn is_handshaking(self) -> bool {
        matches!(self, SessionState::Pairing | SessionState::Handshaking)
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Pairing => "pairing",
            SessionState::Handshaking => "handshaking",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Previous state
    pub from: SessionState,
    /// New state
    pub to: SessionState,
}

/// Things a session reports to its observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// State changed
    StateChanged {
        /// Previous state
        from: SessionState,
        /// New state
        to: SessionState,
    },
    /// A subcommand was accepted and its reply queued
    SubcommandReceived {
        /// Subcommand id
        subcommand_id: u8,
        /// Request order
        sequence: u64,
    },
    /// A subcommand reply went out on the interrupt channel
    ReplySent {
        /// Subcommand id
        subcommand_id: u8,
        /// Request order
        sequence: u64,
    },
    /// A frame from the console could not be decoded and was dropped
    MalformedReport {
        /// Decode failure
        error: ReportError,
    },
    /// No subcommand within the step timeout; a keep-alive report was sent
    HandshakeNudge {
        /// Nudges left before the handshake fails
        retries_left: u32,
    },
}

impl From<Transition> for SessionEvent {
    fn from(t: Transition) -> Self {
        SessionEvent::StateChanged {
            from: t.from,
            to: t.to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionState::*;

    const ALL: [SessionState; 5] = [Disconnected, Pairing, Handshaking, Active, Closing];

    #[test]
    fn test_forward_transitions() {
        assert!(Disconnected.can_transition_to(Pairing));
        assert!(Pairing.can_transition_to(Handshaking));
        assert!(Handshaking.can_transition_to(Active));
        assert!(Active.can_transition_to(Closing));
        assert!(Closing.can_transition_to(Disconnected));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!Active.can_transition_to(Handshaking));
        assert!(!Handshaking.can_transition_to(Pairing));
        assert!(!Closing.can_transition_to(Active));
        assert!(!Disconnected.can_transition_to(Active));
        assert!(!Pairing.can_transition_to(Active));
    }

    #[test]
    fn test_reset_from_anywhere_connected() {
        for state in ALL {
            assert_eq!(
                state.can_transition_to(Disconnected),
                state != Disconnected,
                "{state} -> disconnected"
            );
        }
    }

    #[test]
    fn test_no_self_transitions() {
        for state in ALL {
            assert!(!state.can_transition_to(state));
        }
    }
}
