//! Input configuration errors.

use thiserror::Error;

/// Problems found while validating an input map or calibration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputConfigError {
    /// Schema version this build does not understand
    #[error("unsupported input map schema version {0}")]
    UnsupportedSchemaVersion(u8),

    /// Map binds nothing
    #[error("input map defines no bindings")]
    NoBindingsDefined,

    /// Same physical code bound twice
    #[error("code {code:#05x} is bound more than once")]
    DuplicateBinding {
        /// Physical code
        code: u16,
    },

    /// Binding targets no controller button
    #[error("binding for code {code:#05x} targets no button")]
    EmptyTarget {
        /// Physical code
        code: u16,
    },

    /// Calibration range is not ordered `min <= center <= max` with `min < max`
    #[error("axis {code:#05x} has invalid range min={min} center={center} max={max}")]
    InvalidRange {
        /// Axis code
        code: u16,
        /// Calibrated minimum
        min: i32,
        /// Calibrated centre
        center: i32,
        /// Calibrated maximum
        max: i32,
    },

    /// Deadzone is negative or wider than the range
    #[error("axis {code:#05x} has invalid deadzone {deadzone}")]
    InvalidDeadzone {
        /// Axis code
        code: u16,
        /// Deadzone in raw units
        deadzone: i32,
    },
}
