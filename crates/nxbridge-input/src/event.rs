//! Raw events from the physical controller.

use serde::{Deserialize, Serialize};

use crate::codes;

/// Event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Digital button; value is 1 for pressed, 0 for released
    Button,
    /// Absolute axis in device units
    Axis,
}

/// One discrete event from the physical controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawInputEvent {
    /// Button or axis
    pub kind: EventKind,
    /// evdev-style code
    pub code: u16,
    /// Pressed flag or raw axis value
    pub value: i32,
}

impl RawInputEvent {
    /// Button press or release.
    pub fn button(code: u16, pressed: bool) -> Self {
        Self {
            kind: EventKind::Button,
            code,
            value: i32::from(pressed),
        }
    }

    /// Axis movement.
    pub fn axis(code: u16, value: i32) -> Self {
        Self {
            kind: EventKind::Axis,
            code,
            value,
        }
    }
}

impl core::fmt::Display for RawInputEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self.kind {
            EventKind::Button => codes::button_name(self.code),
            EventKind::Axis => codes::axis_name(self.code),
        };
        match name {
            Some(name) => write!(f, "{name} = {}", self.value),
            None => write!(f, "{:?} {:#05x} = {}", self.kind, self.code, self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{abs, btn};

    #[test]
    fn test_display() {
        assert_eq!(RawInputEvent::button(btn::EAST, true).to_string(), "BTN_EAST = 1");
        assert_eq!(RawInputEvent::axis(abs::RY, -300).to_string(), "ABS_RY = -300");
        assert_eq!(RawInputEvent::axis(0x2F, 7).to_string(), "Axis 0x02f = 7");
    }
}
