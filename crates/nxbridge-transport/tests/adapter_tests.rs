//! TransportAdapter behaviour against the in-memory adapter.

use std::sync::Arc;
use std::time::Duration;

use nxbridge_hid_switch_protocol::{
    BatteryStatus, ControllerProfile, InputState, ReportKind, Subcommand, decode_input_report,
    encode_input_report,
};
use nxbridge_transport::mock::{CONSOLE_ADDRESS, MockAdapter};
use nxbridge_transport::{AdapterHandle, ChannelKind, TransportAdapter, TransportError};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn transport(adapter: &MockAdapter) -> TransportAdapter {
    let handle: AdapterHandle = Arc::new(adapter.clone());
    TransportAdapter::new(handle)
}

#[tokio::test]
async fn test_open_advertises_profile() -> TestResult {
    let adapter = MockAdapter::new();
    let _console = adapter.connect_console();
    let channels = transport(&adapter)
        .open(&ControllerProfile::default())
        .await?;

    assert_eq!(channels.peer(), CONSOLE_ADDRESS);
    assert!(channels.is_open());
    let (record, name) = adapter.advertised().ok_or("nothing advertised")?;
    assert_eq!(name, "Pro Controller");
    assert_eq!(record.class_of_device, 0x002508);
    Ok(())
}

#[tokio::test]
async fn test_open_unavailable_adapter() {
    let adapter = MockAdapter::new().unpowered();
    let result = transport(&adapter).open(&ControllerProfile::default()).await;
    assert!(matches!(result, Err(TransportError::AdapterUnavailable(_))));
    assert_eq!(adapter.accepted_count(), 0);
}

#[tokio::test]
async fn test_open_rejected_withdraws() {
    let adapter = MockAdapter::new().rejecting("declined by console");
    let _console = adapter.connect_console();
    let result = transport(&adapter).open(&ControllerProfile::default()).await;
    assert_eq!(
        result.err(),
        Some(TransportError::pairing_rejected("declined by console"))
    );
    assert_eq!(adapter.withdrawn_count(), 1);
    assert!(adapter.advertised().is_none());
}

#[tokio::test]
async fn test_failed_advertise_is_rolled_back() {
    let adapter = MockAdapter::new().failing_advertise("interrupt PSM in use");
    let _console = adapter.connect_console();
    let result = transport(&adapter).open(&ControllerProfile::default()).await;

    assert_eq!(
        result.err(),
        Some(TransportError::adapter_unavailable("interrupt PSM in use"))
    );
    assert!(adapter.advertised().is_none());
    assert_eq!(adapter.withdrawn_count(), 1);
    assert_eq!(adapter.accepted_count(), 0);
}

#[tokio::test]
async fn test_report_reaches_console_with_header() -> TestResult {
    let adapter = MockAdapter::new();
    let console = adapter.connect_console();
    let channels = transport(&adapter)
        .open(&ControllerProfile::default())
        .await?;

    let frame = encode_input_report(
        &ReportKind::Full,
        &InputState::NEUTRAL,
        7,
        BatteryStatus::default(),
    );
    channels.send(ChannelKind::Interrupt, &frame).await?;

    let raw = console.next_frame().await?;
    assert_eq!(raw[0], 0xA1);
    assert_eq!(raw.len(), 50);
    let report = decode_input_report(&raw)?;
    assert_eq!(report.timer, 7);
    Ok(())
}

#[tokio::test]
async fn test_receive_subcommand() -> TestResult {
    let adapter = MockAdapter::new();
    let console = adapter.connect_console();
    let channels = transport(&adapter)
        .open(&ControllerProfile::default())
        .await?;

    console.send_subcommand(&Subcommand::RequestDeviceInfo).await?;
    let bytes = channels.receive(ChannelKind::Interrupt).await?;
    assert_eq!(&bytes[..3], &[0xA2, 0x01, 0x00]);
    assert_eq!(bytes[11], 0x02);
    Ok(())
}

#[tokio::test]
async fn test_console_disconnect_closes_both_channels() -> TestResult {
    let adapter = MockAdapter::new();
    let console = adapter.connect_console();
    let channels = transport(&adapter)
        .open(&ControllerProfile::default())
        .await?;

    console.disconnect().await;
    let received = tokio::time::timeout(
        Duration::from_secs(1),
        channels.receive(ChannelKind::Control),
    )
    .await?;
    assert_eq!(received.err(), Some(TransportError::closed("control")));
    let sent = channels.send_bytes(ChannelKind::Interrupt, &[0xA1]).await;
    assert_eq!(sent.err(), Some(TransportError::closed("interrupt")));
    assert!(!channels.is_open());
    Ok(())
}

#[tokio::test]
async fn test_close_is_idempotent() -> TestResult {
    let adapter = MockAdapter::new();
    let console = adapter.connect_console();
    let channels = transport(&adapter)
        .open(&ControllerProfile::default())
        .await?;

    channels.close().await?;
    channels.close().await?;
    assert!(!console.is_connected());
    assert!(adapter.advertised().is_none());
    Ok(())
}
