//! Per-axis calibration ranges of the physical controller.
//!
//! Calibration is queried once when a session starts. Raw values outside the
//! range are clamped, values within `deadzone` of the centre snap to it.

use std::collections::BTreeMap;

use nxbridge_hid_switch_protocol::{AXIS_MAX, AXIS_MIN};
use serde::{Deserialize, Serialize};

use crate::codes::abs;
use crate::error::InputConfigError;

/// Calibrated range of one axis, in raw device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisRange {
    /// Lowest value the device reports
    pub min: i32,
    /// Resting value
    pub center: i32,
    /// Highest value the device reports
    pub max: i32,
    /// Distance from centre treated as centre
    #[serde(default)]
    pub deadzone: i32,
}

impl AxisRange {
    /// Signed 16-bit stick.
    pub const STICK: AxisRange = AxisRange {
        min: -32768,
        center: 0,
        max: 32767,
        deadzone: 0,
    };

    /// 8-bit analog trigger resting at zero.
    pub const TRIGGER: AxisRange = AxisRange {
        min: 0,
        center: 0,
        max: 255,
        deadzone: 0,
    };

    /// Hat switch reporting -1, 0 or 1.
    pub const HAT: AxisRange = AxisRange {
        min: -1,
        center: 0,
        max: 1,
        deadzone: 0,
    };

    /// Create a range without a deadzone.
    pub fn new(min: i32, center: i32, max: i32) -> Self {
        Self {
            min,
            center,
            max,
            deadzone: 0,
        }
    }

    /// Set the deadzone.
    #[must_use]
    pub fn with_deadzone(mut self, deadzone: i32) -> Self {
        self.deadzone = deadzone;
        self
    }

    /// Check ordering and deadzone.
    ///
    /// # Errors
    ///
    /// Returns [`InputConfigError::InvalidRange`] or
    /// [`InputConfigError::InvalidDeadzone`].
    pub fn validate(&self, code: u16) -> Result<(), InputConfigError> {
        if self.min >= self.max || self.center < self.min || self.center > self.max {
            return Err(InputConfigError::InvalidRange {
                code,
                min: self.min,
                center: self.center,
                max: self.max,
            });
        }
        let span = i64::from(self.max) - i64::from(self.min);
        if self.deadzone < 0 || i64::from(self.deadzone) > span {
            return Err(InputConfigError::InvalidDeadzone {
                code,
                deadzone: self.deadzone,
            });
        }
        Ok(())
    }

    /// Clamp a raw value into `[min, max]`.
    pub fn clamp(&self, raw: i32) -> i32 {
        if self.min > self.max {
            return self.center;
        }
        raw.clamp(self.min, self.max)
    }

    /// Scale a raw value to a signed stick axis in `[-2048, 2047]`.
    ///
    /// The two halves around the centre are scaled independently so an
    /// asymmetric range still reaches both extremes.
    pub fn normalize(&self, raw: i32) -> i16 {
        let value = i64::from(self.clamp(raw));
        let center = i64::from(self.center);
        let offset = value - center;
        if offset.abs() <= i64::from(self.deadzone.max(0)) {
            return 0;
        }
        let scaled = if offset > 0 {
            let span = i64::from(self.max) - center;
            if span == 0 { 0 } else { offset * i64::from(AXIS_MAX) / span }
        } else {
            let span = center - i64::from(self.min);
            if span == 0 { 0 } else { offset * -i64::from(AXIS_MIN) / span }
        };
        to_axis(scaled)
    }

    /// Whether a raw value is past the midpoint of the range.
    pub fn past_half(&self, raw: i32) -> bool {
        let value = i64::from(self.clamp(raw));
        (value - i64::from(self.min)) * 2 > i64::from(self.max) - i64::from(self.min)
    }
}

pub(crate) fn to_axis(value: i64) -> i16 {
    let clamped = value.clamp(i64::from(AXIS_MIN), i64::from(AXIS_MAX));
    i16::try_from(clamped).unwrap_or(0)
}

/// Default range for an axis code when the device supplies none.
pub fn default_range(code: u16) -> AxisRange {
    match code {
        abs::Z | abs::RZ => AxisRange::TRIGGER,
        abs::HAT0X | abs::HAT0Y => AxisRange::HAT,
        _ => AxisRange::STICK,
    }
}

/// Calibration of every axis of one physical controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceCalibration {
    /// Device name, informational
    pub name: Option<String>,
    /// Ranges keyed by axis code; missing axes use [`default_range`]
    pub axes: BTreeMap<u16, AxisRange>,
}

impl DeviceCalibration {
    /// Calibration with defaults only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override one axis.
    #[must_use]
    pub fn with_axis(mut self, code: u16, range: AxisRange) -> Self {
        self.axes.insert(code, range);
        self
    }

    /// Range for an axis code.
    pub fn range(&self, code: u16) -> AxisRange {
        self.axes
            .get(&code)
            .copied()
            .unwrap_or_else(|| default_range(code))
    }

    /// Validate every configured axis.
    ///
    /// # Errors
    ///
    /// Returns the first invalid range.
    pub fn validate(&self) -> Result<(), InputConfigError> {
        self.axes
            .iter()
            .try_for_each(|(code, range)| range.validate(*code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stick_extremes() {
        let r = AxisRange::STICK;
        assert_eq!(r.normalize(-32768), AXIS_MIN);
        assert_eq!(r.normalize(32767), AXIS_MAX);
        assert_eq!(r.normalize(0), 0);
    }

    #[test]
    fn test_out_of_range_clamps() {
        let r = AxisRange::new(0, 128, 255);
        assert_eq!(r.normalize(-500), AXIS_MIN);
        assert_eq!(r.normalize(10_000), AXIS_MAX);
        assert_eq!(r.normalize(i32::MIN), AXIS_MIN);
        assert_eq!(r.normalize(i32::MAX), AXIS_MAX);
    }

    #[test]
    fn test_deadzone_snaps_to_center() {
        let r = AxisRange::STICK.with_deadzone(4000);
        assert_eq!(r.normalize(3999), 0);
        assert_eq!(r.normalize(-4000), 0);
        assert!(r.normalize(4001) > 0);
    }

    #[test]
    fn test_asymmetric_range() {
        let r = AxisRange::new(0, 100, 1000);
        assert_eq!(r.normalize(0), AXIS_MIN);
        assert_eq!(r.normalize(1000), AXIS_MAX);
        assert_eq!(r.normalize(100), 0);
    }

    #[test]
    fn test_trigger_half() {
        let r = AxisRange::TRIGGER;
        assert!(!r.past_half(127));
        assert!(r.past_half(128));
        assert!(r.past_half(400));
    }

    #[test]
    fn test_validate() {
        assert!(AxisRange::STICK.validate(abs::X).is_ok());
        assert!(AxisRange::TRIGGER.validate(abs::Z).is_ok());
        assert_eq!(
            AxisRange::new(10, 0, 5).validate(abs::X),
            Err(InputConfigError::InvalidRange {
                code: abs::X,
                min: 10,
                center: 0,
                max: 5
            })
        );
        assert!(AxisRange::HAT.with_deadzone(-1).validate(abs::HAT0X).is_err());
    }

    #[test]
    fn test_default_ranges() {
        let cal = DeviceCalibration::new().with_axis(abs::X, AxisRange::new(0, 128, 255));
        assert_eq!(cal.range(abs::X), AxisRange::new(0, 128, 255));
        assert_eq!(cal.range(abs::Y), AxisRange::STICK);
        assert_eq!(cal.range(abs::RZ), AxisRange::TRIGGER);
        assert_eq!(cal.range(abs::HAT0Y), AxisRange::HAT);
    }
}
