//! Normalizer properties over arbitrary events.

use nxbridge_hid_switch_protocol::{AXIS_MAX, AXIS_MIN, Buttons, InputState, StickPosition};
use nxbridge_input::codes::{abs, btn};
use nxbridge_input::{AxisRange, DeviceCalibration, InputMap, InputNormalizer, RawInputEvent};
use proptest::prelude::*;

fn arb_event() -> impl Strategy<Value = RawInputEvent> {
    let codes = prop::sample::select(vec![
        btn::SOUTH,
        btn::EAST,
        btn::NORTH,
        btn::WEST,
        btn::TL,
        btn::TR2,
        btn::MODE,
        btn::THUMBR,
        0x2C0,
    ]);
    let axes = prop::sample::select(vec![
        abs::X,
        abs::Y,
        abs::Z,
        abs::RX,
        abs::RY,
        abs::RZ,
        abs::HAT0X,
        abs::HAT0Y,
        0x28,
    ]);
    prop_oneof![
        (codes, any::<bool>()).prop_map(|(c, p)| RawInputEvent::button(c, p)),
        (axes, any::<i32>()).prop_map(|(c, v)| RawInputEvent::axis(c, v)),
    ]
}

fn arb_state() -> impl Strategy<Value = InputState> {
    (
        any::<u32>(),
        any::<i16>(),
        any::<i16>(),
        any::<i16>(),
        any::<i16>(),
    )
        .prop_map(|(b, lx, ly, rx, ry)| InputState {
            buttons: Buttons::from_bits_truncate(b),
            left_stick: StickPosition::new(lx, ly),
            right_stick: StickPosition::new(rx, ry),
        })
}

fn calibrated() -> InputNormalizer {
    let cal = DeviceCalibration::new()
        .with_axis(abs::X, AxisRange::new(0, 128, 255).with_deadzone(6))
        .with_axis(abs::RY, AxisRange::new(-512, 0, 511))
        .with_axis(abs::Z, AxisRange::new(0, 0, 1023));
    InputNormalizer::new(&InputMap::default(), cal)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // ── Idempotence ──────────────────────────────────────────────────────

    #[test]
    fn prop_same_event_twice_equals_once(state in arb_state(), event in arb_event()) {
        let normalizer = calibrated();
        let once = normalizer.normalize(state, &event);
        let twice = normalizer.normalize(once, &event);
        prop_assert_eq!(once, twice);
    }

    // ── Clamping ─────────────────────────────────────────────────────────

    #[test]
    fn prop_axis_always_in_range(raw in any::<i32>(), min in -70_000i32..0, max in 1i32..70_000) {
        let range = AxisRange::new(min, 0, max);
        let value = range.normalize(raw);
        prop_assert!((AXIS_MIN..=AXIS_MAX).contains(&value));
        if raw <= min {
            prop_assert_eq!(value, AXIS_MIN);
        }
        if raw >= max {
            prop_assert_eq!(value, AXIS_MAX);
        }
    }

    #[test]
    fn prop_stick_values_stay_encodable(events in prop::collection::vec(arb_event(), 1..32)) {
        let normalizer = calibrated();
        let mut state = InputState::NEUTRAL;
        for event in &events {
            normalizer.apply(&mut state, event);
        }
        for axis in [state.left_stick.x, state.left_stick.y, state.right_stick.x, state.right_stick.y] {
            prop_assert!((AXIS_MIN..=AXIS_MAX).contains(&axis));
        }
    }

    #[test]
    fn prop_normalize_monotonic(a in any::<i32>(), b in any::<i32>()) {
        let range = AxisRange::STICK.with_deadzone(1000);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(range.normalize(lo) <= range.normalize(hi));
    }
}
