//! Handshake progress and deadline tracking.

use std::collections::BTreeSet;
use std::time::Duration;

use nxbridge_errors::SessionError;
use nxbridge_hid_switch_protocol::Subcommand;
use tokio::time::Instant;

use crate::config::{HandshakeStep, SessionConfig};

/// Step completed by a subcommand, if it is one of the tracked steps.
pub fn step_for(subcommand: &Subcommand) -> Option<HandshakeStep> {
    match subcommand {
        Subcommand::RequestDeviceInfo => Some(HandshakeStep::DeviceInfo),
        Subcommand::SpiFlashRead { .. } => Some(HandshakeStep::SpiRead),
        Subcommand::SetInputReportMode(_) => Some(HandshakeStep::SetInputMode),
        Subcommand::EnableVibration(_) => Some(HandshakeStep::EnableVibration),
        Subcommand::SetPlayerLights(_) => Some(HandshakeStep::SetPlayerLights),
        _ => None,
    }
}

/// Which required steps the console has completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeProgress {
    required: BTreeSet<HandshakeStep>,
    completed: BTreeSet<HandshakeStep>,
}

impl HandshakeProgress {
    /// Track the given required steps.
    pub fn new(required: &[HandshakeStep]) -> Self {
        Self {
            required: required.iter().copied().collect(),
            completed: BTreeSet::new(),
        }
    }

    /// Mark a step done. Returns `true` if it was newly completed.
    pub fn complete(&mut self, step: HandshakeStep) -> bool {
        self.completed.insert(step)
    }

    /// Whether every required step is done.
    pub fn is_complete(&self) -> bool {
        self.required.is_subset(&self.completed)
    }

    /// Required steps still outstanding.
    pub fn remaining(&self) -> Vec<HandshakeStep> {
        self.required.difference(&self.completed).copied().collect()
    }

    /// Forget completed steps.
    pub fn reset(&mut self) {
        self.completed.clear();
    }
}

/// Bounded number of nudges between two subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    max: u32,
    remaining: u32,
}

impl RetryBudget {
    /// Full budget.
    pub fn new(max: u32) -> Self {
        Self {
            max,
            remaining: max,
        }
    }

    /// Use one retry. Returns `false` if none were left.
    pub fn consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    /// Refill after progress.
    pub fn restore(&mut self) {
        self.remaining = self.max;
    }

    /// Retries left.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Retries used since the last restore.
    pub fn used(&self) -> u32 {
        self.max - self.remaining
    }
}

/// Outcome of a handshake deadline firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchdogVerdict {
    /// Send a keep-alive report and keep waiting
    Nudge {
        /// Nudges left
        retries_left: u32,
    },
    /// Give up
    Expired(SessionError),
}

/// Step and overall deadlines of the handshake.
#[derive(Debug, Clone)]
pub struct HandshakeWatchdog {
    started: Instant,
    last_activity: Instant,
    step_timeout: Duration,
    overall_timeout: Duration,
    budget: RetryBudget,
}

impl HandshakeWatchdog {
    /// Start timing at `now`.
    pub fn new(config: &SessionConfig, now: Instant) -> Self {
        Self {
            started: now,
            last_activity: now,
            step_timeout: config.step_timeout(),
            overall_timeout: config.handshake_timeout(),
            budget: RetryBudget::new(config.max_handshake_retries),
        }
    }

    /// Next instant at which [`on_deadline`](Self::on_deadline) must run.
    pub fn deadline(&self) -> Instant {
        (self.last_activity + self.step_timeout).min(self.started + self.overall_timeout)
    }

    /// A subcommand arrived.
    pub fn on_activity(&mut self, now: Instant) {
        self.last_activity = now;
        self.budget.restore();
    }

    /// The deadline passed without a subcommand.
    pub fn on_deadline(&mut self, now: Instant) -> WatchdogVerdict {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= self.overall_timeout || !self.budget.consume() {
            return WatchdogVerdict::Expired(SessionError::handshake_timeout(
                u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                self.budget.used(),
            ));
        }
        self.last_activity = now;
        WatchdogVerdict::Nudge {
            retries_left: self.budget.remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(step: u64, overall: u64, retries: u32) -> SessionConfig {
        SessionConfig {
            step_timeout_ms: step,
            handshake_timeout_ms: overall,
            max_handshake_retries: retries,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_progress_completion() {
        let mut progress =
            HandshakeProgress::new(&[HandshakeStep::DeviceInfo, HandshakeStep::SpiRead]);
        assert!(!progress.is_complete());
        assert!(progress.complete(HandshakeStep::DeviceInfo));
        assert!(!progress.complete(HandshakeStep::DeviceInfo));
        // steps outside the required set do not count
        progress.complete(HandshakeStep::SetPlayerLights);
        assert_eq!(progress.remaining(), vec![HandshakeStep::SpiRead]);
        progress.complete(HandshakeStep::SpiRead);
        assert!(progress.is_complete());
        progress.reset();
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_step_mapping() {
        assert_eq!(
            step_for(&Subcommand::SpiFlashRead {
                address: 0x6000,
                length: 16
            }),
            Some(HandshakeStep::SpiRead)
        );
        assert_eq!(step_for(&Subcommand::SetHomeLight), None);
        assert_eq!(step_for(&Subcommand::Unrecognized(0x50)), None);
    }

    #[test]
    fn test_budget() {
        let mut budget = RetryBudget::new(2);
        assert!(budget.consume());
        assert!(budget.consume());
        assert!(!budget.consume());
        assert_eq!(budget.used(), 2);
        budget.restore();
        assert_eq!(budget.remaining(), 2);
    }

    #[test]
    fn test_nudges_then_expires() {
        let start = Instant::now();
        let mut watchdog = HandshakeWatchdog::new(&config(100, 10_000, 2), start);
        assert_eq!(watchdog.deadline(), start + Duration::from_millis(100));

        let t1 = start + Duration::from_millis(100);
        assert_eq!(
            watchdog.on_deadline(t1),
            WatchdogVerdict::Nudge { retries_left: 1 }
        );
        assert_eq!(watchdog.deadline(), t1 + Duration::from_millis(100));

        let t2 = t1 + Duration::from_millis(100);
        assert_eq!(
            watchdog.on_deadline(t2),
            WatchdogVerdict::Nudge { retries_left: 0 }
        );

        let t3 = t2 + Duration::from_millis(100);
        assert_eq!(
            watchdog.on_deadline(t3),
            WatchdogVerdict::Expired(SessionError::handshake_timeout(300, 2))
        );
    }

    #[test]
    fn test_activity_restores_budget() {
        let start = Instant::now();
        let mut watchdog = HandshakeWatchdog::new(&config(100, 10_000, 1), start);
        let t1 = start + Duration::from_millis(100);
        assert!(matches!(watchdog.on_deadline(t1), WatchdogVerdict::Nudge { .. }));
        watchdog.on_activity(t1 + Duration::from_millis(10));
        let t2 = t1 + Duration::from_millis(110);
        assert!(matches!(watchdog.on_deadline(t2), WatchdogVerdict::Nudge { .. }));
    }

    #[test]
    fn test_overall_deadline_caps_step() {
        let start = Instant::now();
        let mut watchdog = HandshakeWatchdog::new(&config(400, 1000, 10), start);
        let mut now = start;
        for _ in 0..3 {
            watchdog.on_activity(now);
            now += Duration::from_millis(300);
        }
        assert_eq!(watchdog.deadline(), start + Duration::from_millis(1000));
        let verdict = watchdog.on_deadline(start + Duration::from_millis(1000));
        assert!(matches!(
            verdict,
            WatchdogVerdict::Expired(SessionError::HandshakeTimeout { elapsed_ms: 1000, .. })
        ));
    }
}
