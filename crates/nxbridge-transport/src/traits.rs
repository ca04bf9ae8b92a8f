//! Bluetooth adapter and L2CAP channel traits.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use nxbridge_errors::TransportError;
use nxbridge_hid_switch_protocol::ids::{PSM_HID_CONTROL, PSM_HID_INTERRUPT};
use nxbridge_hid_switch_protocol::{BdAddr, SdpRecord};

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// The two HID channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// HID control channel (PSM 0x11)
    Control,
    /// HID interrupt channel (PSM 0x13)
    Interrupt,
}

impl ChannelKind {
    /// L2CAP PSM of the channel.
    pub fn psm(self) -> u16 {
        match self {
            ChannelKind::Control => PSM_HID_CONTROL,
            ChannelKind::Interrupt => PSM_HID_INTERRUPT,
        }
    }

    /// Lowercase name used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Control => "control",
            ChannelKind::Interrupt => "interrupt",
        }
    }

    /// Error reported when this channel is gone.
    pub fn closed(self) -> TransportError {
        TransportError::closed(self.as_str())
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One connected L2CAP channel carrying raw, unframed bytes.
///
/// All methods take `&self` so one task can send while another receives.
#[async_trait]
pub trait L2capChannel: Send + Sync {
    /// Which HID channel this is.
    fn kind(&self) -> ChannelKind;

    /// Write one frame.
    ///
    /// # Errors
    ///
    /// [`TransportError::TransportClosed`] if the peer disconnected.
    async fn send(&self, frame: &[u8]) -> TransportResult<()>;

    /// Wait for the next frame.
    ///
    /// # Errors
    ///
    /// [`TransportError::TransportClosed`] once the channel is closed on
    /// either side.
    async fn receive(&self) -> TransportResult<Vec<u8>>;

    /// Close the channel. Closing twice is not an error.
    ///
    /// # Errors
    ///
    /// Socket errors while shutting down.
    async fn close(&self) -> TransportResult<()>;

    /// Whether the channel is still usable.
    fn is_open(&self) -> bool;
}

/// Shared handle to a channel.
pub type ChannelHandle = Arc<dyn L2capChannel>;

/// A Bluetooth radio able to advertise a HID device and accept a console.
#[async_trait]
pub trait BluetoothAdapter: Send + Sync {
    /// Adapter name, e.g. `hci0`.
    fn name(&self) -> &str;

    /// Power the radio and register the SDP record so the console can
    /// discover the emulated controller.
    ///
    /// # Errors
    ///
    /// [`TransportError::AdapterUnavailable`] if no usable radio is present.
    async fn advertise(&self, record: &SdpRecord, device_name: &str) -> TransportResult<()>;

    /// Wait for the console to connect both HID channels.
    ///
    /// # Errors
    ///
    /// [`TransportError::PairingRejected`] if the console declines or the
    /// connection is incomplete.
    async fn accept(&self) -> TransportResult<(ChannelHandle, ChannelHandle, BdAddr)>;

    /// Withdraw the SDP record.
    ///
    /// # Errors
    ///
    /// Backend errors while unregistering.
    async fn withdraw(&self) -> TransportResult<()>;
}

/// Shared handle to an adapter.
pub type AdapterHandle = Arc<dyn BluetoothAdapter>;
