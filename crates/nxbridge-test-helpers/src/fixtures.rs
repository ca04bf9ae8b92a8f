//! Controller profiles, calibrations and raw input events for tests.

use nxbridge_hid_switch_protocol::{BdAddr, ControllerKind, ControllerProfile};
use nxbridge_input::codes::abs;
use nxbridge_input::{AxisRange, DeviceCalibration, RawInputEvent};

/// Fixed emulator address so SDP records and logs are stable.
pub const EMULATOR_ADDRESS: BdAddr = BdAddr([0x7C, 0xBB, 0x8A, 0x10, 0x20, 0x30]);

/// Pro Controller with a fixed address.
pub fn pro_profile() -> ControllerProfile {
    ControllerProfile::for_kind(ControllerKind::Pro).with_address(EMULATOR_ADDRESS)
}

/// Left Joy-Con with a fixed address.
pub fn joycon_l_profile() -> ControllerProfile {
    ControllerProfile::for_kind(ControllerKind::JoyconL).with_address(EMULATOR_ADDRESS)
}

/// Calibration of a pad reporting sticks in `0..=255` centered on 128.
pub fn stick_calibration() -> DeviceCalibration {
    let range = AxisRange::new(0, 128, 255);
    DeviceCalibration::new()
        .with_axis(abs::X, range)
        .with_axis(abs::Y, range)
        .with_axis(abs::RX, range)
        .with_axis(abs::RY, range)
}

/// Button press.
pub fn press(code: u16) -> RawInputEvent {
    RawInputEvent::button(code, true)
}

/// Button release.
pub fn release(code: u16) -> RawInputEvent {
    RawInputEvent::button(code, false)
}

/// Absolute axis move.
pub fn stick_move(code: u16, value: i32) -> RawInputEvent {
    RawInputEvent::axis(code, value)
}
