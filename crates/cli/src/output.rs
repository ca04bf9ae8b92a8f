//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use nxbridge_engine::{SessionEvent, SessionState};
use nxbridge_hid_switch_protocol::ControllerProfile;
use nxbridge_input::{RawInputEvent, codes};
use serde_json::json;

use crate::gamepad::GamepadInfo;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

/// Print gamepad list
pub fn print_devices(devices: &[GamepadInfo], json: bool) {
    if json {
        let output = json!({
            "success": true,
            "devices": devices
        });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format device list as JSON: {e}"),
        }
        return;
    }
    if devices.is_empty() {
        println!("{}", "No gamepads found".yellow());
        return;
    }
    println!("{}", "Gamepads:".bold());
    for device in devices {
        let dot = if device.connected {
            "●".green()
        } else {
            "●".red()
        };
        println!(
            "  {} [{}] {} {}",
            dot,
            device.index,
            device.name.bold(),
            device.power.dimmed()
        );
    }
}

/// Print one raw input event
pub fn print_event(event: &RawInputEvent, json: bool) {
    if json {
        let output = json!({
            "kind": event.kind,
            "code": event.code,
            "name": codes::name(event.code),
            "value": event.value,
        });
        println!("{output}");
    } else {
        println!("{event}");
    }
}

/// Print what is being advertised
pub fn print_advertising(profile: &ControllerProfile, adapter: &str) {
    println!(
        "{} {} on {} ({})",
        "Advertising".cyan().bold(),
        profile.name.bold(),
        adapter,
        profile.address
    );
    println!("  Open \"Change Grip/Order\" on the console to pair.");
}

/// Print a session event as a status line
pub fn print_session_event(event: &SessionEvent) {
    match event {
        SessionEvent::StateChanged { to, .. } => {
            let label = match to {
                SessionState::Active => to.as_str().green().bold(),
                SessionState::Closing | SessionState::Disconnected => to.as_str().red(),
                _ => to.as_str().yellow(),
            };
            println!("{} {}", "State:".bold(), label);
        }
        SessionEvent::HandshakeNudge { retries_left } => {
            println!(
                "{} console idle, {} retries left",
                "Waiting:".yellow(),
                retries_left
            );
        }
        SessionEvent::MalformedReport { error } => {
            println!("{} {}", "Dropped frame:".dimmed(), error);
        }
        SessionEvent::SubcommandReceived { .. } | SessionEvent::ReplySent { .. } => {}
    }
}
