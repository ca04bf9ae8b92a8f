//! Command implementations for the nxbridge CLI

pub mod devices;
pub mod probe;
pub mod run;

use std::path::PathBuf;

use clap::Args;

use crate::settings::{ControllerArg, SettingsFiles};

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Gamepad to read, by index or name (see `nxbridge devices`)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Bluetooth adapter to advertise on (default adapter if omitted)
    #[arg(short, long, env = "NXBRIDGE_ADAPTER")]
    pub adapter: Option<String>,

    /// Controller type to emulate
    #[arg(short, long, value_enum, default_value_t = ControllerArg::Pro)]
    pub controller: ControllerArg,

    /// Session configuration (JSON)
    #[arg(long, env = "NXBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Controller profile override (JSON)
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Input mapping (JSON)
    #[arg(long)]
    pub mapping: Option<PathBuf>,

    /// Gamepad axis calibration (JSON)
    #[arg(long)]
    pub calibration: Option<PathBuf>,
}

impl RunArgs {
    pub fn files(&self) -> SettingsFiles {
        SettingsFiles {
            config: self.config.clone(),
            profile: self.profile.clone(),
            mapping: self.mapping.clone(),
            calibration: self.calibration.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Gamepad to read, by index or name
    #[arg(short, long)]
    pub device: Option<String>,

    /// Stop after this many events
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}
