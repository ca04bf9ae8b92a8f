//! `nxbridge run`: emulate a controller until the console disconnects

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nxbridge_engine::ControllerSession;
use nxbridge_errors::SessionError;
use nxbridge_transport::AdapterHandle;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::RunArgs;
use crate::error::CliError;
use crate::settings::Settings;
use crate::{gamepad, output};

pub async fn execute(args: &RunArgs) -> Result<(), CliError> {
    let mut settings = Settings::load(args.controller, &args.files())?;
    let adapter = open_adapter(args.adapter.as_deref(), &mut settings).await?;
    output::print_advertising(&settings.profile, adapter.name());

    let session = ControllerSession::new(
        adapter,
        settings.profile,
        &settings.input_map,
        settings.calibration,
        settings.config,
    )?;

    let stop = Arc::new(AtomicBool::new(false));
    let reader = spawn_gamepad(&session, args.device.clone(), Arc::clone(&stop))?;
    let printer = {
        let mut events = session.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => output::print_session_event(&event),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "status output lagging"),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    let result = drive(&session).await;
    stop.store(true, Ordering::Relaxed);
    printer.abort();
    if let Some(reader) = reader
        && reader.join().is_err()
    {
        warn!("gamepad thread panicked");
    }
    result
}

/// Start the session and keep it running until it ends or Ctrl-C.
async fn drive(session: &ControllerSession) -> Result<(), CliError> {
    tokio::select! {
        started = session.start() => started?,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted while pairing");
            session.stop().await?;
            return Ok(());
        }
    }
    info!("controller connected");

    tokio::select! {
        closed = session.closed() => closed?,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            session.stop().await?;
        }
    }
    Ok(())
}

/// Feed the session from a gamepad thread. Without any gamepad the session
/// still runs and reports neutral input.
fn spawn_gamepad(
    session: &ControllerSession,
    selector: Option<String>,
    stop: Arc<AtomicBool>,
) -> Result<Option<std::thread::JoinHandle<()>>, CliError> {
    let pads = gamepad::list_devices()?;
    if gamepad::select(&pads, selector.as_deref()).is_none() {
        return match selector {
            Some(selector) => Err(CliError::DeviceNotFound(selector)),
            None => {
                warn!("no gamepad connected, sending neutral input");
                Ok(None)
            }
        };
    }

    let input = session.input_handle();
    let handle = std::thread::Builder::new()
        .name("gamepad".to_string())
        .spawn(move || {
            let fed = gamepad::run_reader(selector.as_deref(), &stop, |event| {
                input.feed(&event);
            });
            if let Err(e) = fed {
                warn!(error = %e, "gamepad reader stopped");
            }
        })?;
    Ok(Some(handle))
}

#[cfg(feature = "bluez")]
async fn open_adapter(
    name: Option<&str>,
    settings: &mut Settings,
) -> Result<AdapterHandle, CliError> {
    use nxbridge_transport::bluez::BluezAdapter;

    let adapter = BluezAdapter::open(name).await.map_err(SessionError::from)?;
    let address = adapter.address().await.map_err(SessionError::from)?;
    settings.profile = settings.profile.clone().with_address(address);
    Ok(Arc::new(adapter))
}

#[cfg(not(feature = "bluez"))]
async fn open_adapter(
    _name: Option<&str>,
    _settings: &mut Settings,
) -> Result<AdapterHandle, CliError> {
    use nxbridge_errors::TransportError;

    Err(SessionError::from(TransportError::adapter_unavailable(
        "nxbridge was built without the `bluez` feature",
    ))
    .into())
}
