//! Physical-to-virtual input bindings.
//!
//! An [`InputMap`] is loaded from JSON, validated once, and then compiled
//! into an [`InputNormalizer`](crate::InputNormalizer). Codes may be written
//! as names (`"BTN_SOUTH"`) or numbers.

use std::collections::HashSet;

use nxbridge_hid_switch_protocol::Buttons;
use serde::{Deserialize, Serialize};

use crate::codes::{abs, btn};
use crate::error::InputConfigError;

/// Current input map schema version.
pub const SCHEMA_VERSION: u8 = 1;

/// A physical button bound to one or more controller buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ButtonBinding {
    /// Physical button code
    #[serde(with = "button_code")]
    pub code: u16,
    /// Controller buttons driven by it
    pub button: Buttons,
}

/// What an axis drives on the emulated controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisTarget {
    /// Left stick horizontal
    LeftStickX,
    /// Left stick vertical
    LeftStickY,
    /// Right stick horizontal
    RightStickX,
    /// Right stick vertical
    RightStickY,
    /// Analog trigger pressing a button past the halfway point
    Trigger {
        /// Button pressed
        button: Buttons,
    },
    /// Hat axis pressing one button per direction
    Hat {
        /// Pressed below centre
        negative: Buttons,
        /// Pressed above centre
        positive: Buttons,
    },
}

/// A physical axis bound to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisBinding {
    /// Physical axis code
    #[serde(with = "axis_code")]
    pub code: u16,
    /// Stick axis or button(s) driven by it
    pub target: AxisTarget,
    /// Negate the normalized value; applies to stick and hat targets
    #[serde(default)]
    pub invert: bool,
}

impl AxisBinding {
    /// Stick axis binding.
    pub fn stick(code: u16, target: AxisTarget, invert: bool) -> Self {
        Self {
            code,
            target,
            invert,
        }
    }
}

/// Complete binding table for one physical controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputMap {
    /// Schema version, currently 1
    pub schema_version: u8,
    /// Human readable name
    pub name: Option<String>,
    /// Button bindings
    pub buttons: Vec<ButtonBinding>,
    /// Axis bindings
    pub axes: Vec<AxisBinding>,
}

impl Default for InputMap {
    /// Layout of a typical XInput-style pad: face buttons by position, both
    /// sticks with Y inverted, analog triggers as ZL/ZR and the hat as d-pad.
    fn default() -> Self {
        let bind = |code, button| ButtonBinding { code, button };
        Self {
            schema_version: SCHEMA_VERSION,
            name: None,
            buttons: vec![
                bind(btn::SOUTH, Buttons::B),
                bind(btn::EAST, Buttons::A),
                bind(btn::NORTH, Buttons::X),
                bind(btn::WEST, Buttons::Y),
                bind(btn::TL, Buttons::L),
                bind(btn::TR, Buttons::R),
                bind(btn::TL2, Buttons::ZL),
                bind(btn::TR2, Buttons::ZR),
                bind(btn::START, Buttons::PLUS),
                bind(btn::SELECT, Buttons::MINUS),
                bind(btn::MODE, Buttons::HOME),
                bind(btn::THUMBL, Buttons::L_STICK),
                bind(btn::THUMBR, Buttons::R_STICK),
                bind(btn::DPAD_UP, Buttons::DPAD_UP),
                bind(btn::DPAD_DOWN, Buttons::DPAD_DOWN),
                bind(btn::DPAD_LEFT, Buttons::DPAD_LEFT),
                bind(btn::DPAD_RIGHT, Buttons::DPAD_RIGHT),
            ],
            axes: vec![
                AxisBinding::stick(abs::X, AxisTarget::LeftStickX, false),
                AxisBinding::stick(abs::Y, AxisTarget::LeftStickY, true),
                AxisBinding::stick(abs::RX, AxisTarget::RightStickX, false),
                AxisBinding::stick(abs::RY, AxisTarget::RightStickY, true),
                AxisBinding::stick(
                    abs::Z,
                    AxisTarget::Trigger {
                        button: Buttons::ZL,
                    },
                    false,
                ),
                AxisBinding::stick(
                    abs::RZ,
                    AxisTarget::Trigger {
                        button: Buttons::ZR,
                    },
                    false,
                ),
                AxisBinding::stick(
                    abs::HAT0X,
                    AxisTarget::Hat {
                        negative: Buttons::DPAD_LEFT,
                        positive: Buttons::DPAD_RIGHT,
                    },
                    false,
                ),
                AxisBinding::stick(
                    abs::HAT0Y,
                    AxisTarget::Hat {
                        negative: Buttons::DPAD_UP,
                        positive: Buttons::DPAD_DOWN,
                    },
                    false,
                ),
            ],
        }
    }
}

impl InputMap {
    /// Validate the map.
    ///
    /// # Errors
    ///
    /// Returns an [`InputConfigError`] for an unknown schema version, an
    /// empty map, a code bound twice or a binding that presses nothing.
    pub fn validate(&self) -> Result<(), InputConfigError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(InputConfigError::UnsupportedSchemaVersion(
                self.schema_version,
            ));
        }
        if self.buttons.is_empty() && self.axes.is_empty() {
            return Err(InputConfigError::NoBindingsDefined);
        }

        let mut seen = HashSet::new();
        for binding in &self.buttons {
            if !seen.insert(binding.code) {
                return Err(InputConfigError::DuplicateBinding { code: binding.code });
            }
            if binding.button.is_empty() {
                return Err(InputConfigError::EmptyTarget { code: binding.code });
            }
        }

        let mut seen = HashSet::new();
        for binding in &self.axes {
            if !seen.insert(binding.code) {
                return Err(InputConfigError::DuplicateBinding { code: binding.code });
            }
            let empty = match binding.target {
                AxisTarget::Trigger { button } => button.is_empty(),
                AxisTarget::Hat { negative, positive } => {
                    negative.is_empty() || positive.is_empty()
                }
                _ => false,
            };
            if empty {
                return Err(InputConfigError::EmptyTarget { code: binding.code });
            }
        }
        Ok(())
    }
}

macro_rules! code_serde {
    ($module:ident, $name:path, $parse:path, $what:literal) => {
        mod $module {
            use serde::{Deserialize, Deserializer, Serializer, de::Error};

            #[derive(Deserialize)]
            #[serde(untagged)]
            enum Repr {
                Number(u16),
                Name(String),
            }

            pub fn serialize<S: Serializer>(code: &u16, serializer: S) -> Result<S::Ok, S::Error> {
                match $name(*code) {
                    Some(name) => serializer.serialize_str(name),
                    None => serializer.serialize_u16(*code),
                }
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
                match Repr::deserialize(deserializer)? {
                    Repr::Number(code) => Ok(code),
                    Repr::Name(name) => $parse(&name)
                        .ok_or_else(|| D::Error::custom(format!(concat!("unknown ", $what, " `{}`"), name))),
                }
            }
        }
    };
}

code_serde!(button_code, crate::codes::button_name, crate::codes::parse_button, "button code");
code_serde!(axis_code, crate::codes::axis_name, crate::codes::parse_axis, "axis code");
