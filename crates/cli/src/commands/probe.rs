//! `nxbridge probe`: print translated gamepad events

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use super::ProbeArgs;
use crate::error::CliError;
use crate::{gamepad, output};

pub async fn execute(args: &ProbeArgs, json: bool) -> Result<(), CliError> {
    let stop = Arc::new(AtomicBool::new(false));
    let reader = {
        let stop = Arc::clone(&stop);
        let selector = args.device.clone();
        let limit = args.count;
        std::thread::Builder::new()
            .name("gamepad".to_string())
            .spawn(move || {
                let mut seen = 0usize;
                let flag = Arc::clone(&stop);
                gamepad::run_reader(selector.as_deref(), &stop, |event| {
                    output::print_event(&event, json);
                    seen += 1;
                    if limit.is_some_and(|limit| seen >= limit) {
                        flag.store(true, Ordering::Relaxed);
                    }
                })
            })?
    };

    let waiter = tokio::task::spawn_blocking(move || reader.join());
    tokio::select! {
        joined = waiter => match joined {
            Ok(Ok(result)) => result,
            Ok(Err(_panic)) => Err(CliError::Gamepad("gamepad thread panicked".to_string())),
            Err(e) => Err(CliError::Gamepad(e.to_string())),
        },
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            stop.store(true, Ordering::Relaxed);
            Ok(())
        }
    }
}
