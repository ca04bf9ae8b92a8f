//! Session configuration.

use std::path::Path;
use std::time::Duration;

use nxbridge_errors::SessionError;
use nxbridge_hid_switch_protocol::BatteryStatus;
use serde::{Deserialize, Serialize};

/// Longest tick interval accepted; the console drops controllers that go
/// quiet for much longer.
pub const MAX_TICK_INTERVAL_MS: u64 = 1000;

/// Largest reply queue accepted.
pub const MAX_REPLY_QUEUE_DEPTH: usize = 1024;

/// A subcommand the console must complete before the session is Active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeStep {
    /// 0x02 request device info
    DeviceInfo,
    /// 0x10 SPI flash read (any address)
    SpiRead,
    /// 0x03 set input report mode
    SetInputMode,
    /// 0x48 enable vibration
    EnableVibration,
    /// 0x30 set player lights
    SetPlayerLights,
}

impl HandshakeStep {
    /// Every step, in the order the console normally sends them.
    pub const ALL: [HandshakeStep; 5] = [
        HandshakeStep::DeviceInfo,
        HandshakeStep::SpiRead,
        HandshakeStep::SetInputMode,
        HandshakeStep::EnableVibration,
        HandshakeStep::SetPlayerLights,
    ];
}

/// Timing, retry and reporting settings of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Input report period
    pub tick_interval_ms: u64,
    /// Deadline from Pairing to Active
    pub handshake_timeout_ms: u64,
    /// Wait for the next handshake subcommand before nudging the console
    pub step_timeout_ms: u64,
    /// Nudges allowed without a subcommand arriving
    pub max_handshake_retries: u32,
    /// Capacity of the ordered reply queue
    pub reply_queue_depth: usize,
    /// Steps that must complete before Active
    pub required_handshake_steps: Vec<HandshakeStep>,
    /// Battery byte reported in every input report
    pub battery: BatteryStatus,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 15,
            handshake_timeout_ms: 10_000,
            step_timeout_ms: 1_000,
            max_handshake_retries: 3,
            reply_queue_depth: 8,
            required_handshake_steps: HandshakeStep::ALL.to_vec(),
            battery: BatteryStatus::default(),
        }
    }
}

impl SessionConfig {
    /// Load from a JSON file; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidConfig`] if the file cannot be read, parsed or
    /// validated.
    pub fn from_json_file(path: &Path) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SessionError::config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Parse and validate JSON.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidConfig`] on a parse or validation failure.
    pub fn from_json(text: &str) -> Result<Self, SessionError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| SessionError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.tick_interval_ms == 0 || self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(SessionError::config(format!(
                "tick_interval_ms must be 1..={MAX_TICK_INTERVAL_MS}, got {}",
                self.tick_interval_ms
            )));
        }
        if self.step_timeout_ms == 0 {
            return Err(SessionError::config("step_timeout_ms must be non-zero"));
        }
        if self.handshake_timeout_ms < self.step_timeout_ms {
            return Err(SessionError::config(format!(
                "handshake_timeout_ms ({}) is shorter than step_timeout_ms ({})",
                self.handshake_timeout_ms, self.step_timeout_ms
            )));
        }
        if self.reply_queue_depth == 0 || self.reply_queue_depth > MAX_REPLY_QUEUE_DEPTH {
            return Err(SessionError::config(format!(
                "reply_queue_depth must be 1..={MAX_REPLY_QUEUE_DEPTH}, got {}",
                self.reply_queue_depth
            )));
        }
        if self.required_handshake_steps.is_empty() {
            return Err(SessionError::config(
                "required_handshake_steps must name at least one step",
            ));
        }
        Ok(())
    }

    /// Input report period.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Overall handshake deadline.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Per-step wait.
    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }
}
