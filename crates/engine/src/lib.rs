//! Switch controller engine: protocol state machine and session runtime.
//!
//! [`ProtocolMachine`] answers the console's subcommands and decides what
//! each tick sends; it does no I/O. [`ControllerSession`] wires it to a
//! Bluetooth transport and an input producer and runs the inbound and
//! outbound loops.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![warn(missing_docs)]

pub mod config;
pub mod handshake;
pub mod machine;
pub mod session;
pub mod state;

pub use config::{HandshakeStep, SessionConfig};
pub use handshake::{HandshakeProgress, HandshakeWatchdog, RetryBudget, WatchdogVerdict};
pub use machine::{ControllerStatus, Handled, ProtocolMachine};
pub use session::{ControllerSession, InputHandle};
pub use state::{SessionEvent, SessionState, Transition};

pub use nxbridge_errors::SessionError;
