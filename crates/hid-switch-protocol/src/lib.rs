//! Switch controller HID protocol: report codec, subcommands and SPI-flash emulation.
//!
//! This crate is I/O-free. It provides pure functions and value types that
//! can be tested without a Bluetooth radio: input report encoding, output
//! report decoding, HIDP framing, subcommand dispatch types, the SPI flash
//! image the console reads during the handshake, and the SDP record that
//! advertises the emulated device.

#![deny(static_mut_refs)]

pub mod buttons;
pub mod descriptor;
pub mod hidp;
pub mod ids;
pub mod input;
pub mod output;
pub mod profile;
pub mod report;
pub mod sdp;
pub mod spi;
pub mod stick;
pub mod subcommand;

pub use buttons::Buttons;
pub use descriptor::HID_REPORT_DESCRIPTOR;
pub use ids::{CLASS_OF_DEVICE, NINTENDO_VENDOR_ID, product_ids};
pub use input::{BatteryLevel, BatteryStatus, InputReportMode, InputState};
pub use output::{
    OutputReport, RUMBLE_NEUTRAL, decode_output_report, encode_rumble_report,
    encode_subcommand_report,
};
pub use profile::{BdAddr, ControllerColors, ControllerKind, ControllerProfile};
pub use report::{
    InputReport, MAX_FRAME_LEN, ReportFrame, ReportKind, decode_input_report, encode_input_report,
};
pub use sdp::SdpRecord;
pub use spi::SpiFlash;
pub use stick::{AXIS_MAX, AXIS_MIN, StickCalibration, StickPosition};
pub use subcommand::{Subcommand, SubcommandReply, SubcommandRequest};

pub use nxbridge_errors::ReportError;
