//! Transport adapter: opens and owns the HID channel pair.

use std::sync::Arc;

use nxbridge_errors::TransportError;
use nxbridge_hid_switch_protocol::{BdAddr, ControllerProfile, ReportFrame, SdpRecord};
use tracing::{debug, info, warn};

use crate::traits::{AdapterHandle, ChannelHandle, ChannelKind, TransportResult};

/// Opens HID connections through a [`BluetoothAdapter`](crate::BluetoothAdapter).
#[derive(Clone)]
pub struct TransportAdapter {
    adapter: AdapterHandle,
}

impl std::fmt::Debug for TransportAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportAdapter")
            .field("adapter", &self.adapter.name())
            .finish()
    }
}

impl TransportAdapter {
    /// Wrap an adapter.
    pub fn new(adapter: AdapterHandle) -> Self {
        Self { adapter }
    }

    /// Adapter name.
    pub fn name(&self) -> &str {
        self.adapter.name()
    }

    /// Remove the advertisement, e.g. after an abandoned [`open`](Self::open).
    ///
    /// # Errors
    ///
    /// Adapter errors from the Bluetooth stack.
    pub async fn withdraw(&self) -> TransportResult<()> {
        self.adapter.withdraw().await
    }

    /// Advertise `profile` and wait for the console to connect.
    ///
    /// # Errors
    ///
    /// [`TransportError::AdapterUnavailable`] if the radio cannot be used and
    /// [`TransportError::PairingRejected`] if the console declines.
    pub async fn open(&self, profile: &ControllerProfile) -> TransportResult<HidChannels> {
        let record = SdpRecord::for_profile(profile);
        if let Err(e) = self.adapter.advertise(&record, &profile.name).await {
            // advertise may fail after registering part of the record
            if let Err(withdraw) = self.adapter.withdraw().await {
                debug!(error = %withdraw, "withdraw after failed advertise");
            }
            return Err(e);
        }
        info!(
            adapter = self.adapter.name(),
            name = %profile.name,
            class = format_args!("{:#08x}", profile.class_of_device),
            "advertising controller"
        );

        let (control, interrupt, peer) = match self.adapter.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                if let Err(withdraw) = self.adapter.withdraw().await {
                    debug!(error = %withdraw, "withdraw after failed accept");
                }
                return Err(e);
            }
        };
        info!(%peer, "console connected");
        Ok(HidChannels {
            control,
            interrupt,
            peer,
            adapter: Some(Arc::clone(&self.adapter)),
        })
    }
}

/// The connected control and interrupt channels.
///
/// Cloning shares the same channels.
#[derive(Clone)]
pub struct HidChannels {
    control: ChannelHandle,
    interrupt: ChannelHandle,
    peer: BdAddr,
    adapter: Option<AdapterHandle>,
}

impl std::fmt::Debug for HidChannels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidChannels")
            .field("peer", &self.peer)
            .field("control_open", &self.control.is_open())
            .field("interrupt_open", &self.interrupt.is_open())
            .finish()
    }
}

impl HidChannels {
    /// Build from already connected channels.
    pub fn new(control: ChannelHandle, interrupt: ChannelHandle, peer: BdAddr) -> Self {
        Self {
            control,
            interrupt,
            peer,
            adapter: None,
        }
    }

    /// Console address.
    pub fn peer(&self) -> BdAddr {
        self.peer
    }

    /// Channel handle.
    pub fn channel(&self, kind: ChannelKind) -> &ChannelHandle {
        match kind {
            ChannelKind::Control => &self.control,
            ChannelKind::Interrupt => &self.interrupt,
        }
    }

    /// Send an encoded report with its HIDP header.
    ///
    /// # Errors
    ///
    /// [`TransportError::TransportClosed`] if the peer disconnected.
    pub async fn send(&self, kind: ChannelKind, frame: &ReportFrame) -> TransportResult<()> {
        self.send_bytes(kind, frame.as_wire()).await
    }

    /// Send raw bytes.
    ///
    /// # Errors
    ///
    /// [`TransportError::TransportClosed`] if the peer disconnected.
    pub async fn send_bytes(&self, kind: ChannelKind, bytes: &[u8]) -> TransportResult<()> {
        self.channel(kind).send(bytes).await
    }

    /// Wait for the next frame on a channel.
    ///
    /// # Errors
    ///
    /// [`TransportError::TransportClosed`] once the channel closes.
    pub async fn receive(&self, kind: ChannelKind) -> TransportResult<Vec<u8>> {
        self.channel(kind).receive().await
    }

    /// Whether both channels are still up.
    pub fn is_open(&self) -> bool {
        self.control.is_open() && self.interrupt.is_open()
    }

    /// Close interrupt then control and withdraw the advertisement.
    ///
    /// Every step runs even if an earlier one fails; the first error is
    /// returned.
    ///
    /// # Errors
    ///
    /// The first socket or adapter error encountered.
    pub async fn close(&self) -> TransportResult<()> {
        let mut first: Option<TransportError> = None;
        for kind in [ChannelKind::Interrupt, ChannelKind::Control] {
            if let Err(e) = self.channel(kind).close().await {
                warn!(channel = %kind, error = %e, "channel close failed");
                first.get_or_insert(e);
            }
        }
        if let Some(adapter) = &self.adapter
            && let Err(e) = adapter.withdraw().await
        {
            warn!(adapter = adapter.name(), error = %e, "withdraw failed");
            first.get_or_insert(e);
        }
        debug!(peer = %self.peer, "transport closed");
        first.map_or(Ok(()), Err)
    }
}
