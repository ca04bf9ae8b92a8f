//! Prelude module for convenient error handling imports.
//!
//! ```
//! use nxbridge_errors::prelude::*;
//!
//! fn open() -> Result<()> {
//!     Err(TransportError::adapter_unavailable("no hci device").into())
//! }
//!
//! assert!(open().is_err());
//! ```

pub use crate::{
    Result,
    common::{ErrorCategory, ErrorSeverity, SessionError},
    report::ReportError,
    transport::TransportError,
};
