//! Bluetooth HID transport.
//!
//! A [`TransportAdapter`] advertises the emulated controller through a
//! [`BluetoothAdapter`] and hands back the connected [`HidChannels`]. The
//! channels carry raw bytes; HIDP framing belongs to the protocol crate.
//!
//! The [`mock`] module provides an in-memory adapter and console. The real
//! BlueZ backend is behind the `bluez` feature.

#![deny(static_mut_refs)]
#![warn(missing_docs)]

pub mod adapter;
#[cfg(feature = "bluez")]
pub mod bluez;
pub mod mock;
pub mod traits;

pub use adapter::{HidChannels, TransportAdapter};
pub use traits::{
    AdapterHandle, BluetoothAdapter, ChannelHandle, ChannelKind, L2capChannel, TransportResult,
};

pub use nxbridge_errors::TransportError;
