//! Raw event to [`InputState`] translation.

use std::collections::HashMap;

use nxbridge_hid_switch_protocol::{Buttons, InputState};
use tracing::trace;

use crate::calibration::{DeviceCalibration, to_axis};
use crate::event::{EventKind, RawInputEvent};
use crate::mapping::{AxisBinding, AxisTarget, InputMap};

/// Applies raw physical events to a controller state.
///
/// Every event overwrites the part of the state it is bound to, so applying
/// the same event twice has the same effect as applying it once. Codes with
/// no binding are ignored.
#[derive(Debug, Clone)]
pub struct InputNormalizer {
    buttons: HashMap<u16, Buttons>,
    axes: HashMap<u16, AxisBinding>,
    calibration: DeviceCalibration,
}

impl Default for InputNormalizer {
    fn default() -> Self {
        Self::new(&InputMap::default(), DeviceCalibration::default())
    }
}

impl InputNormalizer {
    /// Compile a map and calibration. Later bindings for the same code win.
    pub fn new(map: &InputMap, calibration: DeviceCalibration) -> Self {
        Self {
            buttons: map.buttons.iter().map(|b| (b.code, b.button)).collect(),
            axes: map.axes.iter().map(|a| (a.code, *a)).collect(),
            calibration,
        }
    }

    /// Calibration in use.
    pub fn calibration(&self) -> &DeviceCalibration {
        &self.calibration
    }

    /// Apply one event in place. Returns `false` if the code is unbound.
    pub fn apply(&self, state: &mut InputState, event: &RawInputEvent) -> bool {
        match event.kind {
            EventKind::Button => {
                let Some(&buttons) = self.buttons.get(&event.code) else {
                    trace!(code = event.code, "ignoring unbound button");
                    return false;
                };
                state.set_buttons(buttons, event.value != 0);
            }
            EventKind::Axis => {
                let Some(binding) = self.axes.get(&event.code) else {
                    trace!(code = event.code, "ignoring unbound axis");
                    return false;
                };
                self.apply_axis(state, binding, event.value);
            }
        }
        trace!(%event, buttons = ?state.buttons, "input applied");
        true
    }

    /// Pure form of [`apply`](Self::apply).
    #[must_use]
    pub fn normalize(&self, mut state: InputState, event: &RawInputEvent) -> InputState {
        self.apply(&mut state, event);
        state
    }

    fn apply_axis(&self, state: &mut InputState, binding: &AxisBinding, raw: i32) {
        let range = self.calibration.range(binding.code);
        let signed = || {
            let value = range.normalize(raw);
            if binding.invert {
                to_axis(-i64::from(value))
            } else {
                value
            }
        };
        match binding.target {
            AxisTarget::LeftStickX => state.left_stick.x = signed(),
            AxisTarget::LeftStickY => state.left_stick.y = signed(),
            AxisTarget::RightStickX => state.right_stick.x = signed(),
            AxisTarget::RightStickY => state.right_stick.y = signed(),
            AxisTarget::Trigger { button } => state.set_buttons(button, range.past_half(raw)),
            AxisTarget::Hat { negative, positive } => {
                let value = signed();
                state.set_buttons(negative, value < 0);
                state.set_buttons(positive, value > 0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::AxisRange;
    use crate::codes::{abs, btn};
    use nxbridge_hid_switch_protocol::{AXIS_MAX, AXIS_MIN};

    fn apply_all(events: &[RawInputEvent]) -> InputState {
        let normalizer = InputNormalizer::default();
        let mut state = InputState::NEUTRAL;
        for event in events {
            normalizer.apply(&mut state, event);
        }
        state
    }

    #[test]
    fn test_face_buttons_by_position() {
        let state = apply_all(&[
            RawInputEvent::button(btn::EAST, true),
            RawInputEvent::button(btn::SOUTH, true),
            RawInputEvent::button(btn::SOUTH, false),
        ]);
        assert_eq!(state.buttons, Buttons::A);
    }

    #[test]
    fn test_sticks_invert_y() {
        let state = apply_all(&[
            RawInputEvent::axis(abs::X, 32767),
            RawInputEvent::axis(abs::Y, -32768),
            RawInputEvent::axis(abs::RY, 32767),
        ]);
        assert_eq!(state.left_stick.x, AXIS_MAX);
        // pushing up reports negative Y on the pad and positive on the console
        assert_eq!(state.left_stick.y, AXIS_MAX);
        assert_eq!(state.right_stick.y, -AXIS_MAX);
        assert_eq!(state.right_stick.x, 0);
    }

    #[test]
    fn test_triggers_past_half() {
        let state = apply_all(&[
            RawInputEvent::axis(abs::Z, 200),
            RawInputEvent::axis(abs::RZ, 100),
        ]);
        assert!(state.is_pressed(Buttons::ZL));
        assert!(!state.is_pressed(Buttons::ZR));
    }

    #[test]
    fn test_hat_directions_exclusive() {
        let state = apply_all(&[
            RawInputEvent::axis(abs::HAT0X, -1),
            RawInputEvent::axis(abs::HAT0Y, 1),
        ]);
        assert_eq!(state.buttons, Buttons::DPAD_LEFT | Buttons::DPAD_DOWN);

        let state = apply_all(&[
            RawInputEvent::axis(abs::HAT0X, -1),
            RawInputEvent::axis(abs::HAT0X, 1),
            RawInputEvent::axis(abs::HAT0Y, 1),
            RawInputEvent::axis(abs::HAT0Y, 0),
        ]);
        assert_eq!(state.buttons, Buttons::DPAD_RIGHT);
    }

    #[test]
    fn test_unknown_codes_ignored() {
        let normalizer = InputNormalizer::default();
        let mut state = InputState::NEUTRAL;
        assert!(!normalizer.apply(&mut state, &RawInputEvent::button(0x2C0, true)));
        assert!(!normalizer.apply(&mut state, &RawInputEvent::axis(0x28, 99)));
        assert_eq!(state, InputState::NEUTRAL);
    }

    #[test]
    fn test_calibrated_range_clamps() {
        let cal = DeviceCalibration::new().with_axis(abs::X, AxisRange::new(0, 128, 255));
        let normalizer = InputNormalizer::new(&InputMap::default(), cal);
        let state = normalizer.normalize(InputState::NEUTRAL, &RawInputEvent::axis(abs::X, -40));
        assert_eq!(state.left_stick.x, AXIS_MIN);
        let state = normalizer.normalize(state, &RawInputEvent::axis(abs::X, 9000));
        assert_eq!(state.left_stick.x, AXIS_MAX);
    }

    #[test]
    fn test_invert_min_does_not_overflow() {
        let state = apply_all(&[RawInputEvent::axis(abs::Y, 32767)]);
        assert_eq!(state.left_stick.y, -AXIS_MAX);
        let state = apply_all(&[RawInputEvent::axis(abs::Y, -32768)]);
        assert_eq!(state.left_stick.y, AXIS_MAX);
    }
}
