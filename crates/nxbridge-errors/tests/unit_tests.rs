//! Unit tests for all error variants.
//!
//! Tests Display implementations, classification and From conversions.

use nxbridge_errors::{
    ErrorCategory, ErrorSeverity, ReportError, SessionError, TransportError, prelude,
};
use proptest::prelude::*;

fn all_session_errors() -> Vec<SessionError> {
    vec![
        ReportError::too_short(2, 11).into(),
        ReportError::BadHeader { header: 0x52 }.into(),
        ReportError::UnknownReportId { id: 0x7E }.into(),
        ReportError::TruncatedArguments {
            subcommand: 0x10,
            expected: 5,
            actual: 1,
        }
        .into(),
        ReportError::invalid("bad").into(),
        TransportError::adapter_unavailable("off").into(),
        TransportError::pairing_rejected("console left").into(),
        TransportError::closed("interrupt").into(),
        TransportError::Io("EIO".into()).into(),
        SessionError::handshake_timeout(10_000, 3),
        SessionError::config("queue depth"),
        SessionError::AlreadyStarted,
        SessionError::NotStarted,
    ]
}

// ── Display ─────────────────────────────────────────────────────────────────

#[test]
fn test_all_variants_display() -> prelude::Result<()> {
    for variant in all_session_errors() {
        let msg = variant.to_string();
        assert!(!msg.is_empty(), "{variant:?} should have display message");
    }
    Ok(())
}

#[test]
fn test_malformed_report_display_is_transparent() {
    let err: SessionError = ReportError::UnknownReportId { id: 0x7E }.into();
    assert_eq!(
        err.to_string(),
        ReportError::UnknownReportId { id: 0x7E }.to_string()
    );
}

#[test]
fn test_handshake_timeout_display() {
    let msg = SessionError::handshake_timeout(1500, 2).to_string();
    assert!(msg.contains("1500ms"));
    assert!(msg.contains("2 retries"));
}

// ── Classification ──────────────────────────────────────────────────────────

#[test]
fn test_only_codec_and_lifecycle_errors_are_survivable() {
    for err in all_session_errors() {
        let survivable = matches!(
            err.category(),
            ErrorCategory::Codec | ErrorCategory::Lifecycle
        );
        assert_eq!(err.is_fatal(), !survivable, "{err:?}");
    }
}

#[test]
fn test_fatal_errors_are_at_least_error_severity() {
    for err in all_session_errors().into_iter().filter(|e| e.is_fatal()) {
        assert!(err.severity() >= ErrorSeverity::Error, "{err:?}");
    }
}

#[test]
fn test_retryable_only_for_pairing_rejection() {
    let retryable: Vec<_> = all_session_errors()
        .into_iter()
        .filter(|e| e.is_retryable())
        .collect();
    assert_eq!(
        retryable,
        vec![SessionError::from(TransportError::pairing_rejected(
            "console left"
        ))]
    );
}

#[test]
fn test_io_error_into_session_error() {
    let io = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
    let err: SessionError = io.into();
    assert!(err.is_transport_closed());
    assert!(err.is_fatal());
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(200))]

    /// Any too-short frame length maps to a non-fatal warning.
    #[test]
    fn prop_short_frames_never_fatal(len in 0usize..64, min in 1usize..400) {
        let err: SessionError = ReportError::too_short(len, min).into();
        prop_assert!(!err.is_fatal());
        prop_assert_eq!(err.severity(), ErrorSeverity::Warning);
    }
}
