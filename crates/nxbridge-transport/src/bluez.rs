//! BlueZ backend.
//!
//! Registers the HID SDP record with `bluetoothd` over D-Bus and accepts the
//! console on raw L2CAP sequential-packet sockets bound to PSM 0x11 and 0x13.
//! BlueZ's own `input` plugin must be disabled, otherwise it owns those PSMs.
//! Binding them also needs `CAP_NET_BIND_SERVICE` or root.

use std::net::Shutdown;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bluer::l2cap::{SeqPacket, SeqPacketListener, SocketAddr};
use bluer::rfcomm::{Profile, ProfileHandle, Role};
use bluer::{Address, AddressType, Session, Uuid};
use nxbridge_errors::TransportError;
use nxbridge_hid_switch_protocol::{BdAddr, SdpRecord};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::traits::{BluetoothAdapter, ChannelHandle, ChannelKind, L2capChannel, TransportResult};

/// Largest frame the console sends.
const RECV_BUFFER_LEN: usize = 512;

fn unavailable(e: impl std::fmt::Display) -> TransportError {
    TransportError::adapter_unavailable(e.to_string())
}

fn accept_error(kind: ChannelKind, e: std::io::Error) -> TransportError {
    use std::io::ErrorKind;
    match e.kind() {
        ErrorKind::ConnectionRefused | ErrorKind::PermissionDenied => {
            TransportError::pairing_rejected(format!("{kind} channel: {e}"))
        }
        _ => TransportError::from(e),
    }
}

/// Adapter driven through BlueZ.
pub struct BluezAdapter {
    name: String,
    session: Session,
    adapter: bluer::Adapter,
    profile: Mutex<Option<ProfileHandle>>,
    listeners: Mutex<Option<(SeqPacketListener, SeqPacketListener)>>,
}

impl BluezAdapter {
    /// Open a named adapter, or the default one.
    ///
    /// # Errors
    ///
    /// [`TransportError::AdapterUnavailable`] if `bluetoothd` is unreachable
    /// or the adapter does not exist.
    pub async fn open(name: Option<&str>) -> TransportResult<Self> {
        let session = Session::new().await.map_err(unavailable)?;
        let adapter = match name {
            Some(name) => session.adapter(name).map_err(unavailable)?,
            None => session.default_adapter().await.map_err(unavailable)?,
        };
        let name = adapter.name().to_string();
        debug!(adapter = %name, "opened BlueZ adapter");
        Ok(Self {
            name,
            session,
            adapter,
            profile: Mutex::new(None),
            listeners: Mutex::new(None),
        })
    }

    /// Radio address, used as the emulated controller's address.
    ///
    /// # Errors
    ///
    /// [`TransportError::AdapterUnavailable`] if BlueZ cannot report it.
    pub async fn address(&self) -> TransportResult<BdAddr> {
        let address = self.adapter.address().await.map_err(unavailable)?;
        Ok(BdAddr(address.0))
    }

    /// Names of all adapters known to `bluetoothd`.
    ///
    /// # Errors
    ///
    /// [`TransportError::AdapterUnavailable`] if `bluetoothd` is unreachable.
    pub async fn adapter_names() -> TransportResult<Vec<String>> {
        let session = Session::new().await.map_err(unavailable)?;
        session.adapter_names().await.map_err(unavailable)
    }

    /// BlueZ exposes no D-Bus setter for the class of device, so this goes
    /// through `hciconfig` and only logs on failure.
    async fn set_class(&self, class_of_device: u32) {
        let class = format!("{class_of_device:#08x}");
        let status = tokio::process::Command::new("hciconfig")
            .arg(&self.name)
            .arg("class")
            .arg(&class)
            .status()
            .await;
        match status {
            Ok(status) if status.success() => debug!(adapter = %self.name, %class, "class set"),
            Ok(status) => warn!(adapter = %self.name, %class, %status, "hciconfig class failed"),
            Err(e) => warn!(adapter = %self.name, error = %e, "hciconfig not runnable"),
        }
    }

    /// Power the radio, register the SDP record, bind both PSMs and become
    /// discoverable. Leaves partial state behind on error.
    async fn register(&self, record: &SdpRecord, device_name: &str) -> TransportResult<()> {
        self.adapter.set_powered(true).await.map_err(unavailable)?;
        self.adapter
            .set_alias(device_name.to_string())
            .await
            .map_err(unavailable)?;

        let uuid = Uuid::parse_str(&record.service_uuid()).map_err(unavailable)?;
        let profile = Profile {
            uuid,
            role: Some(Role::Server),
            require_authentication: Some(false),
            require_authorization: Some(false),
            service_record: Some(record.to_bluez_xml()),
            ..Default::default()
        };
        let handle = self
            .session
            .register_profile(profile)
            .await
            .map_err(unavailable)?;
        *self.profile.lock().await = Some(handle);

        let control = Self::listen(ChannelKind::Control).await?;
        let interrupt = Self::listen(ChannelKind::Interrupt).await?;
        *self.listeners.lock().await = Some((control, interrupt));

        self.set_class(record.class_of_device).await;
        self.adapter.set_pairable(true).await.map_err(unavailable)?;
        self.adapter
            .set_discoverable(true)
            .await
            .map_err(unavailable)?;
        info!(
            adapter = %self.name,
            class = format_args!("{:#08x}", record.class_of_device),
            "discoverable"
        );
        Ok(())
    }

    async fn listen(kind: ChannelKind) -> TransportResult<SeqPacketListener> {
        let addr = SocketAddr::new(Address::any(), AddressType::BrEdr, kind.psm());
        SeqPacketListener::bind(addr)
            .await
            .map_err(|e| unavailable(format!("bind {kind} PSM {:#06x}: {e}", kind.psm())))
    }
}

#[async_trait]
impl BluetoothAdapter for BluezAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn advertise(&self, record: &SdpRecord, device_name: &str) -> TransportResult<()> {
        match self.register(record, device_name).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Err(rollback) = self.withdraw().await {
                    debug!(error = %rollback, "rollback after failed advertise");
                }
                Err(e)
            }
        }
    }

    async fn accept(&self) -> TransportResult<(ChannelHandle, ChannelHandle, BdAddr)> {
        let guard = self.listeners.lock().await;
        let Some((control_listener, interrupt_listener)) = guard.as_ref() else {
            return Err(unavailable("accept called before advertise"));
        };

        let (control, control_peer) = control_listener
            .accept()
            .await
            .map_err(|e| accept_error(ChannelKind::Control, e))?;
        debug!(peer = %control_peer.addr, "control channel connected");

        let (interrupt, interrupt_peer) = interrupt_listener
            .accept()
            .await
            .map_err(|e| accept_error(ChannelKind::Interrupt, e))?;
        debug!(peer = %interrupt_peer.addr, "interrupt channel connected");

        if control_peer.addr != interrupt_peer.addr {
            if let Err(e) = control.shutdown(Shutdown::Both) {
                debug!(error = %e, "shutdown stray control channel");
            }
            if let Err(e) = interrupt.shutdown(Shutdown::Both) {
                debug!(error = %e, "shutdown stray interrupt channel");
            }
            return Err(TransportError::pairing_rejected(format!(
                "control from {} but interrupt from {}",
                control_peer.addr, interrupt_peer.addr
            )));
        }

        if let Err(e) = self.adapter.set_discoverable(false).await {
            warn!(error = %e, "could not leave discoverable mode");
        }

        let control: ChannelHandle = Arc::new(BluezChannel::new(ChannelKind::Control, control));
        let interrupt: ChannelHandle =
            Arc::new(BluezChannel::new(ChannelKind::Interrupt, interrupt));
        Ok((control, interrupt, BdAddr(control_peer.addr.0)))
    }

    async fn withdraw(&self) -> TransportResult<()> {
        self.listeners.lock().await.take();
        // dropping the handle unregisters the profile
        self.profile.lock().await.take();
        if let Err(e) = self.adapter.set_discoverable(false).await {
            debug!(error = %e, "set_discoverable(false) on withdraw");
        }
        Ok(())
    }
}

struct BluezChannel {
    kind: ChannelKind,
    socket: SeqPacket,
    open: AtomicBool,
}

impl BluezChannel {
    fn new(kind: ChannelKind, socket: SeqPacket) -> Self {
        Self {
            kind,
            socket,
            open: AtomicBool::new(true),
        }
    }

    fn fail(&self, e: std::io::Error) -> TransportError {
        let err = TransportError::from(e);
        if err.is_closed() {
            self.open.store(false, Ordering::Release);
            return self.kind.closed();
        }
        err
    }
}

#[async_trait]
impl L2capChannel for BluezChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, frame: &[u8]) -> TransportResult<()> {
        if !self.is_open() {
            return Err(self.kind.closed());
        }
        self.socket.send(frame).await.map_err(|e| self.fail(e))?;
        Ok(())
    }

    async fn receive(&self) -> TransportResult<Vec<u8>> {
        if !self.is_open() {
            return Err(self.kind.closed());
        }
        let mut buf = vec![0u8; RECV_BUFFER_LEN];
        let n = self.socket.recv(&mut buf).await.map_err(|e| self.fail(e))?;
        if n == 0 {
            self.open.store(false, Ordering::Release);
            return Err(self.kind.closed());
        }
        buf.truncate(n);
        Ok(buf)
    }

    async fn close(&self) -> TransportResult<()> {
        if !self.open.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        match self.socket.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TransportError::from(e)),
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}
