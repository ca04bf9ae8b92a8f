//! `nxbridge devices`: list attached gamepads

use crate::error::CliError;
use crate::{gamepad, output};

pub fn execute(json: bool) -> Result<(), CliError> {
    let devices = gamepad::list_devices()?;
    output::print_devices(&devices, json);
    Ok(())
}
