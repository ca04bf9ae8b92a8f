//! SDP service record for the emulated HID device.
//!
//! Rendered in the BlueZ XML record format so it can be handed to the
//! adapter's profile registration as-is.

use core::fmt::Write as _;

use crate::descriptor::HID_REPORT_DESCRIPTOR;
use crate::ids::{HID_SERVICE_UUID, PSM_HID_CONTROL, PSM_HID_INTERRUPT};
use crate::profile::ControllerProfile;

/// HID device subclass: gamepad.
const HID_SUBCLASS_GAMEPAD: u8 = 0x08;

/// HID service record contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpRecord {
    /// Service name (0x0100)
    pub service_name: String,
    /// Service description (0x0101)
    pub description: String,
    /// Provider name (0x0102)
    pub provider: String,
    /// Class of device the adapter should advertise
    pub class_of_device: u32,
    /// HID report descriptor (0x0206)
    pub report_descriptor: Vec<u8>,
}

impl SdpRecord {
    /// Record for a controller profile.
    pub fn for_profile(profile: &ControllerProfile) -> Self {
        Self {
            service_name: "Wireless Gamepad".to_string(),
            description: "Gamepad".to_string(),
            provider: "Nintendo".to_string(),
            class_of_device: profile.class_of_device,
            report_descriptor: HID_REPORT_DESCRIPTOR.to_vec(),
        }
    }

    /// HID service UUID in 128-bit string form.
    pub fn service_uuid(&self) -> String {
        format!("0000{HID_SERVICE_UUID:04x}-0000-1000-8000-00805f9b34fb")
    }

    /// Render as BlueZ service record XML.
    pub fn to_bluez_xml(&self) -> String {
        let descriptor_hex = self
            .report_descriptor
            .iter()
            .fold(String::with_capacity(self.report_descriptor.len() * 2), |mut s, b| {
                let _ = write!(s, "{b:02x}");
                s
            });

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<record>\n");
        attr(&mut xml, 0x0001, &seq(&[uuid(HID_SERVICE_UUID)]));
        attr(
            &mut xml,
            0x0004,
            &seq(&[
                seq(&[uuid(0x0100), uint16(PSM_HID_CONTROL)]),
                seq(&[uuid(0x0011)]),
            ]),
        );
        attr(&mut xml, 0x0005, &seq(&[uuid(0x1002)]));
        attr(
            &mut xml,
            0x0006,
            &seq(&[uint16(0x656E), uint16(0x006A), uint16(0x0100)]),
        );
        attr(
            &mut xml,
            0x0009,
            &seq(&[seq(&[uuid(HID_SERVICE_UUID), uint16(0x0101)])]),
        );
        attr(
            &mut xml,
            0x000D,
            &seq(&[seq(&[
                seq(&[uuid(0x0100), uint16(PSM_HID_INTERRUPT)]),
                seq(&[uuid(0x0011)]),
            ])]),
        );
        attr(&mut xml, 0x0100, &text(&self.service_name));
        attr(&mut xml, 0x0101, &text(&self.description));
        attr(&mut xml, 0x0102, &text(&self.provider));
        attr(&mut xml, 0x0200, &uint16(0x0100));
        attr(&mut xml, 0x0201, &uint16(0x0111));
        attr(&mut xml, 0x0202, &uint8(HID_SUBCLASS_GAMEPAD));
        attr(&mut xml, 0x0203, &uint8(0x00));
        attr(&mut xml, 0x0204, &boolean(true));
        attr(&mut xml, 0x0205, &boolean(true));
        attr(
            &mut xml,
            0x0206,
            &seq(&[seq(&[
                uint8(0x22),
                format!("<text encoding=\"hex\" value=\"{descriptor_hex}\" />"),
            ])]),
        );
        attr(&mut xml, 0x0207, &seq(&[seq(&[uint16(0x0409), uint16(0x0100)])]));
        attr(&mut xml, 0x020B, &uint16(0x0100));
        attr(&mut xml, 0x020C, &uint16(0x0C80));
        attr(&mut xml, 0x020D, &boolean(false));
        attr(&mut xml, 0x020E, &boolean(false));
        attr(&mut xml, 0x020F, &uint16(0x0640));
        attr(&mut xml, 0x0210, &uint16(0x0320));
        xml.push_str("</record>\n");
        xml
    }
}

fn attr(xml: &mut String, id: u16, value: &str) {
    let _ = writeln!(xml, "  <attribute id=\"0x{id:04x}\">{value}</attribute>");
}

fn seq(items: &[String]) -> String {
    format!("<sequence>{}</sequence>", items.concat())
}

fn uuid(value: u16) -> String {
    format!("<uuid value=\"0x{value:04x}\" />")
}

fn uint8(value: u8) -> String {
    format!("<uint8 value=\"0x{value:02x}\" />")
}

fn uint16(value: u16) -> String {
    format!("<uint16 value=\"0x{value:04x}\" />")
}

fn boolean(value: bool) -> String {
    format!("<boolean value=\"{value}\" />")
}

fn text(value: &str) -> String {
    let escaped = value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;");
    format!("<text value=\"{escaped}\" />")
}
