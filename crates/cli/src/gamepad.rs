//! Physical gamepads through `gilrs`.
//!
//! Events are translated to evdev-style [`RawInputEvent`]s so the input map
//! and calibration see the same codes on every platform. `gilrs` reports
//! Y axes up-positive; evdev is down-positive, so Y is flipped here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use gilrs::{Axis, Button, EventType, GamepadId, Gilrs};
use nxbridge_input::RawInputEvent;
use nxbridge_input::codes::{abs, btn};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CliError;

/// How long one poll waits before rechecking the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Full-scale value of a stick axis.
const STICK_SCALE: f32 = 32767.0;

/// Full-scale value of an analog trigger.
const TRIGGER_SCALE: f32 = 255.0;

/// One attached gamepad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GamepadInfo {
    pub index: usize,
    pub name: String,
    pub connected: bool,
    pub power: String,
}

fn open() -> Result<Gilrs, CliError> {
    Gilrs::new().map_err(|e| CliError::Gamepad(e.to_string()))
}

fn describe(gilrs: &Gilrs) -> Vec<GamepadInfo> {
    gilrs
        .gamepads()
        .map(|(id, pad)| GamepadInfo {
            index: usize::from(id),
            name: pad.name().to_string(),
            connected: pad.is_connected(),
            power: format!("{:?}", pad.power_info()),
        })
        .collect()
}

/// Gamepads currently known to the OS.
pub fn list_devices() -> Result<Vec<GamepadInfo>, CliError> {
    Ok(describe(&open()?))
}

/// Pick a gamepad by index or case-insensitive name fragment.
///
/// Without a selector the first connected pad is used.
pub fn select<'a>(pads: &'a [GamepadInfo], selector: Option<&str>) -> Option<&'a GamepadInfo> {
    let Some(selector) = selector else {
        return pads.iter().find(|p| p.connected);
    };
    if let Ok(index) = selector.parse::<usize>() {
        return pads.iter().find(|p| p.index == index);
    }
    let needle = selector.to_lowercase();
    pads.iter()
        .find(|p| p.name.to_lowercase().contains(&needle))
}

/// evdev code of a gamepad button.
pub fn button_code(button: Button) -> Option<u16> {
    let code = match button {
        Button::South => btn::SOUTH,
        Button::East => btn::EAST,
        Button::North => btn::NORTH,
        Button::West => btn::WEST,
        Button::C => btn::C,
        Button::Z => btn::Z,
        Button::LeftTrigger => btn::TL,
        Button::RightTrigger => btn::TR,
        Button::LeftTrigger2 => btn::TL2,
        Button::RightTrigger2 => btn::TR2,
        Button::Select => btn::SELECT,
        Button::Start => btn::START,
        Button::Mode => btn::MODE,
        Button::LeftThumb => btn::THUMBL,
        Button::RightThumb => btn::THUMBR,
        Button::DPadUp => btn::DPAD_UP,
        Button::DPadDown => btn::DPAD_DOWN,
        Button::DPadLeft => btn::DPAD_LEFT,
        Button::DPadRight => btn::DPAD_RIGHT,
        _ => return None,
    };
    Some(code)
}

#[allow(clippy::cast_possible_truncation)]
fn scale(value: f32, full: f32) -> i32 {
    (value.clamp(-1.0, 1.0) * full).round() as i32
}

/// evdev event for a gamepad axis position in `[-1.0, 1.0]`.
pub fn axis_event(axis: Axis, value: f32) -> Option<RawInputEvent> {
    let (code, raw) = match axis {
        Axis::LeftStickX => (abs::X, scale(value, STICK_SCALE)),
        Axis::LeftStickY => (abs::Y, -scale(value, STICK_SCALE)),
        Axis::RightStickX => (abs::RX, scale(value, STICK_SCALE)),
        Axis::RightStickY => (abs::RY, -scale(value, STICK_SCALE)),
        Axis::LeftZ => (abs::Z, scale(value.max(0.0), TRIGGER_SCALE)),
        Axis::RightZ => (abs::RZ, scale(value.max(0.0), TRIGGER_SCALE)),
        Axis::DPadX => (abs::HAT0X, scale(value, 1.0)),
        Axis::DPadY => (abs::HAT0Y, -scale(value, 1.0)),
        _ => return None,
    };
    Some(RawInputEvent::axis(code, raw))
}

/// Translate one `gilrs` event.
pub fn translate(event: EventType) -> Option<RawInputEvent> {
    match event {
        EventType::ButtonPressed(button, _) => {
            button_code(button).map(|code| RawInputEvent::button(code, true))
        }
        EventType::ButtonReleased(button, _) => {
            button_code(button).map(|code| RawInputEvent::button(code, false))
        }
        EventType::ButtonChanged(Button::LeftTrigger2, value, _) => {
            axis_event(Axis::LeftZ, value)
        }
        EventType::ButtonChanged(Button::RightTrigger2, value, _) => {
            axis_event(Axis::RightZ, value)
        }
        EventType::AxisChanged(axis, value, _) => axis_event(axis, value),
        _ => None,
    }
}

/// Read the selected gamepad until `stop` is set, passing each translated
/// event to `sink`.
///
/// Runs on the calling thread; `Gilrs` is not `Send`.
pub fn run_reader(
    selector: Option<&str>,
    stop: &AtomicBool,
    mut sink: impl FnMut(RawInputEvent),
) -> Result<(), CliError> {
    let mut gilrs = open()?;
    let pads = describe(&gilrs);
    let pad = select(&pads, selector).ok_or_else(|| {
        CliError::DeviceNotFound(selector.unwrap_or("no gamepad connected").to_string())
    })?;
    let target: GamepadId = gilrs
        .gamepads()
        .map(|(id, _)| id)
        .find(|id| usize::from(*id) == pad.index)
        .ok_or_else(|| CliError::DeviceNotFound(pad.name.clone()))?;
    info!(index = pad.index, name = %pad.name, "reading gamepad");

    while !stop.load(Ordering::Relaxed) {
        let Some(event) = gilrs.next_event_blocking(Some(POLL_INTERVAL)) else {
            continue;
        };
        if event.id != target {
            continue;
        }
        match event.event {
            EventType::Disconnected => warn!(name = %pad.name, "gamepad disconnected"),
            EventType::Connected => info!(name = %pad.name, "gamepad reconnected"),
            other => match translate(other) {
                Some(raw) => sink(raw),
                None => debug!(event = ?other, "untranslated gamepad event"),
            },
        }
    }
    Ok(())
}
