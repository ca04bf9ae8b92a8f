//! Loading session settings from files and flags.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use nxbridge_engine::SessionConfig;
use nxbridge_hid_switch_protocol::{ControllerKind, ControllerProfile};
use nxbridge_input::{DeviceCalibration, InputMap};
use serde::de::DeserializeOwned;

use crate::error::CliError;

/// Controller type to emulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ControllerArg {
    #[default]
    Pro,
    JoyconL,
    JoyconR,
}

impl From<ControllerArg> for ControllerKind {
    fn from(arg: ControllerArg) -> Self {
        match arg {
            ControllerArg::Pro => ControllerKind::Pro,
            ControllerArg::JoyconL => ControllerKind::JoyconL,
            ControllerArg::JoyconR => ControllerKind::JoyconR,
        }
    }
}

/// Files named on the command line.
#[derive(Debug, Clone, Default)]
pub struct SettingsFiles {
    pub config: Option<PathBuf>,
    pub profile: Option<PathBuf>,
    pub mapping: Option<PathBuf>,
    pub calibration: Option<PathBuf>,
}

/// Everything a session needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: SessionConfig,
    pub profile: ControllerProfile,
    pub input_map: InputMap,
    pub calibration: DeviceCalibration,
}

impl Settings {
    /// Resolve settings. Files override the built-in defaults.
    pub fn load(controller: ControllerArg, files: &SettingsFiles) -> Result<Self, CliError> {
        let config = match &files.config {
            Some(path) => SessionConfig::from_json_file(path)?,
            None => SessionConfig::default(),
        };
        let profile = match &files.profile {
            Some(path) => read_json::<ControllerProfile>(path)?,
            None => ControllerProfile::for_kind(controller.into()),
        };

        let input_map = match &files.mapping {
            Some(path) => read_json::<InputMap>(path)?,
            None => InputMap::default(),
        };
        if let Err(e) = input_map.validate() {
            return Err(invalid(files.mapping.as_deref(), &e));
        }

        let calibration = match &files.calibration {
            Some(path) => read_json::<DeviceCalibration>(path)?,
            None => DeviceCalibration::default(),
        };
        if let Err(e) = calibration.validate() {
            return Err(invalid(files.calibration.as_deref(), &e));
        }

        Ok(Self {
            config,
            profile,
            input_map,
            calibration,
        })
    }
}

fn invalid(path: Option<&Path>, error: &dyn std::fmt::Display) -> CliError {
    match path {
        Some(path) => CliError::InvalidConfiguration(format!("{}: {error}", path.display())),
        None => CliError::InvalidConfiguration(error.to_string()),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| invalid(Some(path), &e))
}
