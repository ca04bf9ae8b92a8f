//! A scripted Switch console on top of the mock transport.
//!
//! [`ScriptedConsole`] sends subcommands the way a real console does and waits
//! for the matching `0x21` reply, skipping the periodic input reports in
//! between.

use std::time::Duration;

use nxbridge_errors::{ReportError, SessionError};
use nxbridge_hid_switch_protocol::ids::input_report_ids;
use nxbridge_hid_switch_protocol::{InputReport, Subcommand, SubcommandReply};
use nxbridge_transport::mock::{ConsoleEndpoint, MockAdapter};
use tracing::debug;

/// Default time to wait for one reply.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Subcommands a console sends after connecting, in order.
pub const HANDSHAKE_SEQUENCE: [Subcommand; 10] = [
    Subcommand::RequestDeviceInfo,
    Subcommand::SetShipmentLowPower(false),
    Subcommand::SpiFlashRead {
        address: 0x6000,
        length: 0x10,
    },
    Subcommand::SpiFlashRead {
        address: 0x6050,
        length: 0x0D,
    },
    Subcommand::SpiFlashRead {
        address: 0x603D,
        length: 0x12,
    },
    Subcommand::SetInputReportMode(input_report_ids::FULL),
    Subcommand::TriggerButtonsElapsedTime,
    Subcommand::EnableImu(true),
    Subcommand::EnableVibration(true),
    Subcommand::SetPlayerLights(0x01),
];

/// Console side of one mock connection.
pub struct ScriptedConsole {
    endpoint: ConsoleEndpoint,
    reply_timeout: Duration,
}

impl ScriptedConsole {
    /// Queue a connection on `adapter`.
    pub fn connect(adapter: &MockAdapter) -> Self {
        Self::new(adapter.connect_console())
    }

    /// Wrap an existing endpoint.
    pub fn new(endpoint: ConsoleEndpoint) -> Self {
        Self {
            endpoint,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    /// Change how long [`request`](Self::request) waits.
    #[must_use]
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// The raw endpoint.
    pub fn endpoint(&self) -> &ConsoleEndpoint {
        &self.endpoint
    }

    /// Send one subcommand and wait for its reply.
    ///
    /// # Errors
    ///
    /// Transport errors, a timeout, or a reply answering another subcommand.
    pub async fn request(&self, subcommand: &Subcommand) -> Result<SubcommandReply, SessionError> {
        self.endpoint.send_subcommand(subcommand).await?;
        let reply = match tokio::time::timeout(self.reply_timeout, self.endpoint.next_reply()).await
        {
            Ok(reply) => reply?,
            Err(_) => {
                return Err(SessionError::handshake_timeout(
                    u64::try_from(self.reply_timeout.as_millis()).unwrap_or(u64::MAX),
                    0,
                ));
            }
        };
        if reply.subcommand_id != subcommand.id() {
            return Err(ReportError::invalid(format!(
                "reply for {:#04x} while waiting for {:#04x}",
                reply.subcommand_id,
                subcommand.id()
            ))
            .into());
        }
        debug!(
            subcommand = format_args!("{:#04x}", reply.subcommand_id),
            ack = format_args!("{:#04x}", reply.ack),
            "console got reply"
        );
        Ok(reply)
    }

    /// Run the full [`HANDSHAKE_SEQUENCE`], returning every reply.
    ///
    /// # Errors
    ///
    /// As [`request`](Self::request).
    pub async fn run_handshake(&self) -> Result<Vec<SubcommandReply>, SessionError> {
        let mut replies = Vec::with_capacity(HANDSHAKE_SEQUENCE.len());
        for subcommand in &HANDSHAKE_SEQUENCE {
            replies.push(self.request(subcommand).await?);
        }
        Ok(replies)
    }

    /// Next input report of any kind.
    ///
    /// # Errors
    ///
    /// Transport errors or an undecodable frame.
    pub async fn next_report(&self) -> Result<InputReport, SessionError> {
        self.endpoint.next_report().await
    }

    /// Next `0x30` report, skipping replies.
    ///
    /// # Errors
    ///
    /// As [`next_report`](Self::next_report).
    pub async fn next_full_report(&self) -> Result<InputReport, SessionError> {
        loop {
            let report = self.next_report().await?;
            if report.report_id == input_report_ids::FULL {
                return Ok(report);
            }
        }
    }

    /// Hang up both channels.
    pub async fn disconnect(&self) {
        self.endpoint.disconnect().await;
    }
}
