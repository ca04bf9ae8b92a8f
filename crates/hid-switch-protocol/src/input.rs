//! Controller input state and battery status.

use serde::{Deserialize, Serialize};

use crate::buttons::Buttons;
use crate::ids::input_report_ids;
use crate::stick::StickPosition;

/// Snapshot of everything a full input report carries besides the timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputState {
    /// Pressed buttons, including d-pad, HOME and Capture
    pub buttons: Buttons,
    /// Left analog stick
    pub left_stick: StickPosition,
    /// Right analog stick
    pub right_stick: StickPosition,
}

impl InputState {
    /// Neutral state: nothing pressed, both sticks centred.
    pub const NEUTRAL: InputState = InputState {
        buttons: Buttons::empty(),
        left_stick: StickPosition::CENTER,
        right_stick: StickPosition::CENTER,
    };

    /// Check a button.
    pub fn is_pressed(&self, button: Buttons) -> bool {
        self.buttons.contains(button)
    }

    /// Press or release buttons.
    pub fn set_buttons(&mut self, buttons: Buttons, pressed: bool) {
        self.buttons.set(buttons, pressed);
    }
}

/// Battery charge level, reported in the high nibble of byte 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryLevel {
    /// Empty
    Empty,
    /// Critical
    Critical,
    /// Low
    Low,
    /// Medium
    Medium,
    /// Full
    #[default]
    Full,
}

impl BatteryLevel {
    fn nibble(self) -> u8 {
        match self {
            BatteryLevel::Empty => 0x0,
            BatteryLevel::Critical => 0x2,
            BatteryLevel::Low => 0x4,
            BatteryLevel::Medium => 0x6,
            BatteryLevel::Full => 0x8,
        }
    }

    fn from_nibble(nibble: u8) -> Self {
        match nibble & 0x0E {
            0x8..=0xF => BatteryLevel::Full,
            0x6 => BatteryLevel::Medium,
            0x4 => BatteryLevel::Low,
            0x2 => BatteryLevel::Critical,
            _ => BatteryLevel::Empty,
        }
    }
}

/// Battery and connection byte (report offset 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryStatus {
    /// Charge level
    pub level: BatteryLevel,
    /// Charging flag
    pub charging: bool,
    /// Connection info nibble (0x0 for Pro Controller, 0xE for Joy-Con)
    pub connection_info: u8,
}

impl Default for BatteryStatus {
    fn default() -> Self {
        Self {
            level: BatteryLevel::Full,
            charging: true,
            connection_info: 0x0,
        }
    }
}

impl BatteryStatus {
    /// Pack into the report byte.
    pub fn to_byte(self) -> u8 {
        let high = self.level.nibble() | u8::from(self.charging);
        (high << 4) | (self.connection_info & 0x0F)
    }

    /// Unpack the report byte.
    pub fn from_byte(byte: u8) -> Self {
        let high = byte >> 4;
        Self {
            level: BatteryLevel::from_nibble(high),
            charging: high & 0x01 != 0,
            connection_info: byte & 0x0F,
        }
    }
}

/// Input report mode selected by subcommand 0x03.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputReportMode {
    /// Standard full report (0x30)
    Full,
    /// Full report with NFC/IR section (0x31)
    NfcIr,
    /// Simple HID report (0x3F)
    SimpleHid,
}

impl InputReportMode {
    /// Map the subcommand argument to a mode.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            input_report_ids::FULL => Some(InputReportMode::Full),
            input_report_ids::NFC_IR => Some(InputReportMode::NfcIr),
            input_report_ids::SIMPLE_HID => Some(InputReportMode::SimpleHid),
            _ => None,
        }
    }

    /// Report id for this mode.
    pub fn id(self) -> u8 {
        match self {
            InputReportMode::Full => input_report_ids::FULL,
            InputReportMode::NfcIr => input_report_ids::NFC_IR,
            InputReportMode::SimpleHid => input_report_ids::SIMPLE_HID,
        }
    }

    /// Whether this mode streams a report every tick.
    pub fn is_streaming(self) -> bool {
        matches!(self, InputReportMode::Full | InputReportMode::NfcIr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_byte() {
        assert_eq!(BatteryStatus::default().to_byte(), 0x90);
        let joycon = BatteryStatus {
            level: BatteryLevel::Medium,
            charging: false,
            connection_info: 0xE,
        };
        assert_eq!(joycon.to_byte(), 0x6E);
        assert_eq!(BatteryStatus::from_byte(0x6E), joycon);
        assert_eq!(BatteryStatus::from_byte(0x90), BatteryStatus::default());
    }

    #[test]
    fn test_report_mode_ids() {
        assert_eq!(InputReportMode::from_id(0x30), Some(InputReportMode::Full));
        assert_eq!(InputReportMode::from_id(0x31), Some(InputReportMode::NfcIr));
        assert_eq!(InputReportMode::from_id(0x00), None);
        assert!(!InputReportMode::SimpleHid.is_streaming());
    }

    #[test]
    fn test_neutral_state() {
        let mut state = InputState::NEUTRAL;
        assert!(!state.is_pressed(Buttons::A));
        state.set_buttons(Buttons::A, true);
        assert!(state.is_pressed(Buttons::A));
        state.set_buttons(Buttons::A, false);
        assert_eq!(state, InputState::default());
    }
}
