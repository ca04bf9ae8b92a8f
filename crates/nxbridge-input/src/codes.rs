//! Physical input codes.
//!
//! Codes follow the Linux evdev numbering so events from any backend can be
//! expressed the same way (`BTN_SOUTH` is the bottom face button regardless
//! of what the pad prints on it).

/// Button codes.
pub mod btn {
    /// Bottom face button
    pub const SOUTH: u16 = 0x130;
    /// Right face button
    pub const EAST: u16 = 0x131;
    /// C button
    pub const C: u16 = 0x132;
    /// Top face button
    pub const NORTH: u16 = 0x133;
    /// Left face button
    pub const WEST: u16 = 0x134;
    /// Z button
    pub const Z: u16 = 0x135;
    /// Left shoulder
    pub const TL: u16 = 0x136;
    /// Right shoulder
    pub const TR: u16 = 0x137;
    /// Left trigger (digital)
    pub const TL2: u16 = 0x138;
    /// Right trigger (digital)
    pub const TR2: u16 = 0x139;
    /// Select / Back
    pub const SELECT: u16 = 0x13A;
    /// Start
    pub const START: u16 = 0x13B;
    /// Mode / Guide
    pub const MODE: u16 = 0x13C;
    /// Left stick click
    pub const THUMBL: u16 = 0x13D;
    /// Right stick click
    pub const THUMBR: u16 = 0x13E;
    /// D-pad up
    pub const DPAD_UP: u16 = 0x220;
    /// D-pad down
    pub const DPAD_DOWN: u16 = 0x221;
    /// D-pad left
    pub const DPAD_LEFT: u16 = 0x222;
    /// D-pad right
    pub const DPAD_RIGHT: u16 = 0x223;
}

/// Absolute axis codes.
pub mod abs {
    /// Left stick X
    pub const X: u16 = 0x00;
    /// Left stick Y
    pub const Y: u16 = 0x01;
    /// Left trigger (analog)
    pub const Z: u16 = 0x02;
    /// Right stick X
    pub const RX: u16 = 0x03;
    /// Right stick Y
    pub const RY: u16 = 0x04;
    /// Right trigger (analog)
    pub const RZ: u16 = 0x05;
    /// D-pad horizontal hat
    pub const HAT0X: u16 = 0x10;
    /// D-pad vertical hat
    pub const HAT0Y: u16 = 0x11;
}

const BUTTON_NAMES: &[(u16, &str)] = &[
    (btn::SOUTH, "BTN_SOUTH"),
    (btn::EAST, "BTN_EAST"),
    (btn::C, "BTN_C"),
    (btn::NORTH, "BTN_NORTH"),
    (btn::WEST, "BTN_WEST"),
    (btn::Z, "BTN_Z"),
    (btn::TL, "BTN_TL"),
    (btn::TR, "BTN_TR"),
    (btn::TL2, "BTN_TL2"),
    (btn::TR2, "BTN_TR2"),
    (btn::SELECT, "BTN_SELECT"),
    (btn::START, "BTN_START"),
    (btn::MODE, "BTN_MODE"),
    (btn::THUMBL, "BTN_THUMBL"),
    (btn::THUMBR, "BTN_THUMBR"),
    (btn::DPAD_UP, "BTN_DPAD_UP"),
    (btn::DPAD_DOWN, "BTN_DPAD_DOWN"),
    (btn::DPAD_LEFT, "BTN_DPAD_LEFT"),
    (btn::DPAD_RIGHT, "BTN_DPAD_RIGHT"),
];

const AXIS_NAMES: &[(u16, &str)] = &[
    (abs::X, "ABS_X"),
    (abs::Y, "ABS_Y"),
    (abs::Z, "ABS_Z"),
    (abs::RX, "ABS_RX"),
    (abs::RY, "ABS_RY"),
    (abs::RZ, "ABS_RZ"),
    (abs::HAT0X, "ABS_HAT0X"),
    (abs::HAT0Y, "ABS_HAT0Y"),
];

/// Name of a button code, if known.
pub fn button_name(code: u16) -> Option<&'static str> {
    BUTTON_NAMES.iter().find(|(c, _)| *c == code).map(|(_, n)| *n)
}

/// Name of an axis code, if known.
pub fn axis_name(code: u16) -> Option<&'static str> {
    AXIS_NAMES.iter().find(|(c, _)| *c == code).map(|(_, n)| *n)
}

/// Parse a button code from its name (`"BTN_SOUTH"`) or a number (`"0x130"`, `"304"`).
pub fn parse_button(name: &str) -> Option<u16> {
    lookup(BUTTON_NAMES, name)
}

/// Parse an axis code from its name (`"ABS_X"`) or a number.
pub fn parse_axis(name: &str) -> Option<u16> {
    lookup(AXIS_NAMES, name)
}

/// Name of any known code. Button and axis code ranges do not overlap.
pub fn name(code: u16) -> Option<&'static str> {
    button_name(code).or_else(|| axis_name(code))
}

/// Parse any known code name, button or axis.
pub fn from_name(name: &str) -> Option<u16> {
    parse_button(name).or_else(|| parse_axis(name))
}

fn lookup(table: &[(u16, &str)], name: &str) -> Option<u16> {
    let trimmed = name.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u16::from_str_radix(hex, 16).ok();
    }
    if let Ok(n) = trimmed.parse::<u16>() {
        return Some(n);
    }
    table
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(trimmed))
        .map(|(c, _)| *c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip() {
        for &(code, name) in BUTTON_NAMES {
            assert_eq!(parse_button(name), Some(code));
            assert_eq!(button_name(code), Some(name));
        }
        for &(code, name) in AXIS_NAMES {
            assert_eq!(parse_axis(name), Some(code));
            assert_eq!(axis_name(code), Some(name));
        }
    }

    #[test]
    fn test_numeric_and_case_insensitive() {
        assert_eq!(parse_button("0x130"), Some(btn::SOUTH));
        assert_eq!(parse_button("304"), Some(btn::SOUTH));
        assert_eq!(parse_button("btn_east"), Some(btn::EAST));
        assert_eq!(parse_axis("abs_hat0y"), Some(abs::HAT0Y));
        assert_eq!(parse_axis("ABS_THROTTLE"), None);
    }

    #[test]
    fn test_any_name() {
        assert_eq!(from_name("ABS_RX"), Some(abs::RX));
        assert_eq!(from_name("BTN_MODE"), Some(btn::MODE));
        assert_eq!(name(abs::HAT0X), Some("ABS_HAT0X"));
        assert_eq!(name(btn::START), Some("BTN_START"));
        assert_eq!(name(0x2FF), None);
    }
}
