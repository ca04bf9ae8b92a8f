//! Physical gamepad input normalization.
//!
//! Raw button and axis events from any backend are expressed as
//! [`RawInputEvent`]s with evdev-style codes and applied to the emulated
//! controller's [`InputState`](nxbridge_hid_switch_protocol::InputState)
//! through an [`InputNormalizer`] built from an [`InputMap`] and a
//! [`DeviceCalibration`].

#![deny(static_mut_refs)]
#![warn(missing_docs)]

pub mod calibration;
pub mod codes;
pub mod error;
pub mod event;
pub mod mapping;
pub mod normalizer;

pub use calibration::{AxisRange, DeviceCalibration, default_range};
pub use error::InputConfigError;
pub use event::{EventKind, RawInputEvent};
pub use mapping::{AxisBinding, AxisTarget, ButtonBinding, InputMap, SCHEMA_VERSION};
pub use normalizer::InputNormalizer;
