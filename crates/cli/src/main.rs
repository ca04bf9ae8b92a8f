//! nxbridge - Switch controller bridge
//!
//! Advertises this machine as a Nintendo Switch controller over Bluetooth and
//! forwards a local gamepad to the console.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod gamepad;
mod output;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{ProbeArgs, RunArgs};
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "nxbridge")]
#[command(about = "Emulate a Nintendo Switch Pro Controller over Bluetooth")]
#[command(version)]
#[command(long_about = "
nxbridge makes this machine pair with a Nintendo Switch as a Pro Controller
(or a single Joy-Con) and forwards input from any local gamepad.

Open the console's \"Change Grip/Order\" screen before running `nxbridge run`.
Use --json flag for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pair with a console and forward gamepad input
    Run(RunArgs),

    /// List gamepads that can drive the controller
    Devices,

    /// Print translated events from a gamepad
    Probe(ProbeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("nxbridge={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match execute_command(&cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }

            let exit_code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            std::process::exit(exit_code);
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => commands::run::execute(args).await?,
        Commands::Devices => commands::devices::execute(cli.json)?,
        Commands::Probe(args) => commands::probe::execute(args, cli.json).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ControllerArg;
    use clap::Parser;
    use std::path::Path;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    // --- Global flag parsing ---

    #[test]
    fn parse_devices_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["nxbridge", "devices"])?;
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        assert!(matches!(cli.command, Commands::Devices));
        Ok(())
    }

    #[test]
    fn parse_global_json_flag_either_side() -> TestResult {
        let before = Cli::try_parse_from(["nxbridge", "--json", "devices"])?;
        assert!(before.json);
        let after = Cli::try_parse_from(["nxbridge", "devices", "--json"])?;
        assert!(after.json);
        Ok(())
    }

    #[test]
    fn parse_verbose_levels() -> TestResult {
        let cli = Cli::try_parse_from(["nxbridge", "-vv", "devices"])?;
        assert_eq!(cli.verbose, 2);
        let cli = Cli::try_parse_from(["nxbridge", "-vvvv", "devices"])?;
        assert_eq!(cli.verbose, 4);
        Ok(())
    }

    // --- Run command parsing ---

    #[test]
    fn parse_run_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["nxbridge", "run"])?;
        match &cli.command {
            Commands::Run(args) => {
                assert_eq!(args.controller, ControllerArg::Pro);
                assert!(args.device.is_none());
                assert!(args.mapping.is_none());
            }
            _ => return Err("expected Run command".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_run_with_files_and_controller() -> TestResult {
        let cli = Cli::try_parse_from([
            "nxbridge",
            "run",
            "--controller",
            "joycon-l",
            "--device",
            "1",
            "--mapping",
            "map.json",
            "--calibration",
            "cal.json",
        ])?;
        match &cli.command {
            Commands::Run(args) => {
                assert_eq!(args.controller, ControllerArg::JoyconL);
                assert_eq!(args.device.as_deref(), Some("1"));
                let files = args.files();
                assert_eq!(files.mapping.as_deref(), Some(Path::new("map.json")));
                assert_eq!(files.calibration.as_deref(), Some(Path::new("cal.json")));
                assert!(files.config.is_none());
            }
            _ => return Err("expected Run command".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_run_rejects_unknown_controller() {
        let result = Cli::try_parse_from(["nxbridge", "run", "--controller", "wiimote"]);
        assert!(result.is_err());
    }

    // --- Probe command parsing ---

    #[test]
    fn parse_probe_count() -> TestResult {
        let cli = Cli::try_parse_from(["nxbridge", "probe", "-n", "5", "--device", "pad"])?;
        match &cli.command {
            Commands::Probe(args) => {
                assert_eq!(args.count, Some(5));
                assert_eq!(args.device.as_deref(), Some("pad"));
            }
            _ => return Err("expected Probe command".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_requires_subcommand() {
        assert!(Cli::try_parse_from(["nxbridge"]).is_err());
    }
}
