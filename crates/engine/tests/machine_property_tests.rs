//! Property tests for the protocol state machine.

use nxbridge_engine::{Handled, ProtocolMachine, SessionConfig, SessionState};
use nxbridge_hid_switch_protocol::{
    BdAddr, ControllerProfile, InputState, OutputReport, RUMBLE_NEUTRAL, Subcommand,
    SubcommandRequest, decode_input_report,
};
use proptest::prelude::*;

fn subcommand_strategy() -> impl Strategy<Value = Subcommand> {
    prop_oneof![
        Just(Subcommand::RequestDeviceInfo),
        any::<u8>().prop_map(Subcommand::SetInputReportMode),
        Just(Subcommand::TriggerButtonsElapsedTime),
        any::<bool>().prop_map(Subcommand::SetShipmentLowPower),
        (0x6000u32..0x9000, 0u8..=0x1D)
            .prop_map(|(address, length)| Subcommand::SpiFlashRead { address, length }),
        Just(Subcommand::SetNfcIrConfig),
        any::<u8>().prop_map(Subcommand::SetPlayerLights),
        any::<bool>().prop_map(Subcommand::EnableImu),
        any::<bool>().prop_map(Subcommand::EnableVibration),
        (0x50u8..0x60).prop_map(Subcommand::Unrecognized),
    ]
}

fn report_strategy() -> impl Strategy<Value = OutputReport> {
    prop_oneof![
        4 => subcommand_strategy().prop_map(|subcommand| OutputReport::Subcommand(
            SubcommandRequest {
                packet_counter: 0,
                rumble: RUMBLE_NEUTRAL,
                subcommand,
                sequence: 0,
            }
        )),
        1 => (0u8..16).prop_map(|packet_counter| OutputReport::Rumble {
            packet_counter,
            rumble: RUMBLE_NEUTRAL,
        }),
    ]
}

fn rank(state: SessionState) -> u8 {
    match state {
        SessionState::Disconnected => 0,
        SessionState::Pairing => 1,
        SessionState::Handshaking => 2,
        SessionState::Active => 3,
        SessionState::Closing => 4,
    }
}

fn connected_machine() -> ProtocolMachine {
    let mut machine = ProtocolMachine::new(ControllerProfile::default(), &SessionConfig::default());
    machine.on_connected(BdAddr::ANY);
    machine
}

// ── Ordering ────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_replies_answer_requests_in_order(reports in prop::collection::vec(report_strategy(), 1..64)) {
        let mut machine = connected_machine();
        let mut expected_sequence = 0u64;
        for report in reports {
            let requested = match report {
                OutputReport::Subcommand(request) => Some(request.subcommand.id()),
                OutputReport::Rumble { .. } => None,
            };
            match (machine.handle_output(report), requested) {
                (Some(Handled::Reply { request, reply }), Some(id)) => {
                    prop_assert_eq!(reply.subcommand_id, id);
                    prop_assert_eq!(request.sequence, expected_sequence);
                    prop_assert_eq!(reply.sequence, expected_sequence);
                    prop_assert!(reply.ack & 0x80 != 0);
                    expected_sequence += 1;
                }
                (Some(Handled::Rumble), None) => {}
                (other, _) => prop_assert!(false, "unexpected outcome {:?}", other),
            }
        }
    }

    #[test]
    fn prop_state_only_moves_forward(reports in prop::collection::vec(report_strategy(), 1..64)) {
        let mut machine = connected_machine();
        let mut last = rank(machine.state());
        for report in reports {
            machine.handle_output(report);
            let now = rank(machine.state());
            prop_assert!(now >= last);
            prop_assert!(machine.state().is_connected());
            last = now;
        }
        for transition in machine.take_transitions() {
            prop_assert!(transition.from.can_transition_to(transition.to));
        }
    }

    // ── Report stream ───────────────────────────────────────────────────

    #[test]
    fn prop_timer_increments_per_emitted_report(ticks in 1usize..600) {
        let mut machine = connected_machine();
        machine.handle_output(OutputReport::Subcommand(SubcommandRequest {
            packet_counter: 0,
            rumble: RUMBLE_NEUTRAL,
            subcommand: Subcommand::SetInputReportMode(0x30),
            sequence: 0,
        }));
        let mut previous: Option<u8> = None;
        for _ in 0..ticks {
            let frame = machine.next_report(&InputState::NEUTRAL, None, false);
            prop_assert!(frame.is_some());
            if let Some(frame) = frame {
                let decoded = decode_input_report(frame.as_bytes());
                prop_assert!(decoded.is_ok());
                if let Ok(report) = decoded {
                    if let Some(prev) = previous {
                        prop_assert_eq!(report.timer, prev.wrapping_add(1));
                    }
                    previous = Some(report.timer);
                }
            }
        }
    }
}
