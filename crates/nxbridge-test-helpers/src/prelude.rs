//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use nxbridge_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_some, must_with};

#[cfg(feature = "console")]
pub use crate::must::{must_async, must_within};

#[cfg(feature = "console")]
pub use crate::console::{HANDSHAKE_SEQUENCE, ScriptedConsole};

#[cfg(feature = "fixtures")]
pub use crate::fixtures::{
    joycon_l_profile, press, pro_profile, release, stick_calibration, stick_move,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
