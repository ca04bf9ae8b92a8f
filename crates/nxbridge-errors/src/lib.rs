//! Error taxonomy for nxbridge
//!
//! Every failure the controller emulator can hit falls into one of a handful
//! of kinds, each with a fixed fatality:
//!
//! - [`ReportError`]: a frame from the console could not be decoded. Always
//!   non-fatal; the frame is logged and dropped.
//! - [`TransportError`]: the Bluetooth adapter is missing, the console refused
//!   pairing, or an established channel went away.
//! - [`SessionError`]: the top-level error a controller session reports. It
//!   wraps the two above and adds handshake timeouts and configuration errors.
//!
//! # Example
//!
//! ```
//! use nxbridge_errors::prelude::*;
//!
//! fn check_frame(frame: &[u8]) -> Result<u8> {
//!     match frame.first() {
//!         Some(id) => Ok(*id),
//!         None => Err(ReportError::too_short(0, 1).into()),
//!     }
//! }
//!
//! let err = check_frame(&[]).unwrap_err();
//! assert!(!err.is_fatal());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod prelude;
pub mod report;
pub mod transport;

pub use common::{ErrorCategory, ErrorSeverity, SessionError};
pub use report::ReportError;
pub use transport::TransportError;

/// A specialized `Result` type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
