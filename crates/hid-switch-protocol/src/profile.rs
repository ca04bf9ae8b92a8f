//! Static controller identity.
//!
//! A [`ControllerProfile`] carries everything the console learns about the
//! emulated controller: name, class of device, USB ids, Bluetooth address,
//! firmware version, colours and factory stick calibration. It is loaded once
//! and never mutated while a session runs.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ids::{CLASS_OF_DEVICE, NINTENDO_VENDOR_ID, product_ids};
use crate::stick::StickCalibration;

/// Emulated controller type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerKind {
    /// Pro Controller
    #[default]
    Pro,
    /// Left Joy-Con
    JoyconL,
    /// Right Joy-Con
    JoyconR,
}

impl ControllerKind {
    /// Controller type byte used in device info and SPI flash.
    pub fn type_id(self) -> u8 {
        match self {
            ControllerKind::JoyconL => 0x01,
            ControllerKind::JoyconR => 0x02,
            ControllerKind::Pro => 0x03,
        }
    }

    /// USB product id.
    pub fn product_id(self) -> u16 {
        match self {
            ControllerKind::JoyconL => product_ids::JOYCON_L,
            ControllerKind::JoyconR => product_ids::JOYCON_R,
            ControllerKind::Pro => product_ids::PRO_CONTROLLER,
        }
    }

    /// Connection info nibble reported in byte 2.
    pub fn connection_info(self) -> u8 {
        match self {
            ControllerKind::JoyconL | ControllerKind::JoyconR => 0x0E,
            ControllerKind::Pro => 0x00,
        }
    }

    /// Bluetooth device name the console expects.
    pub fn device_name(self) -> &'static str {
        match self {
            ControllerKind::JoyconL => "Joy-Con (L)",
            ControllerKind::JoyconR => "Joy-Con (R)",
            ControllerKind::Pro => "Pro Controller",
        }
    }
}

impl FromStr for ControllerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pro" | "pro-controller" | "pro_controller" => Ok(ControllerKind::Pro),
            "joycon-l" | "joycon_l" | "jl" => Ok(ControllerKind::JoyconL),
            "joycon-r" | "joycon_r" | "jr" => Ok(ControllerKind::JoyconR),
            other => Err(format!("unknown controller kind '{other}'")),
        }
    }
}

/// Bluetooth device address, most significant byte first (display order).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BdAddr(pub [u8; 6]);

impl BdAddr {
    /// All-zero address, meaning "not known yet".
    pub const ANY: BdAddr = BdAddr([0; 6]);

    /// Address bytes in display order.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl fmt::Debug for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BdAddr({self})")
    }
}

impl FromStr for BdAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 6];
        let mut parts = s.split(':');
        for slot in &mut out {
            let part = parts
                .next()
                .ok_or_else(|| format!("bluetooth address '{s}' has fewer than 6 octets"))?;
            *slot = u8::from_str_radix(part, 16)
                .map_err(|e| format!("bluetooth address '{s}': {e}"))?;
        }
        if parts.next().is_some() {
            return Err(format!("bluetooth address '{s}' has more than 6 octets"));
        }
        Ok(BdAddr(out))
    }
}

impl Serialize for BdAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BdAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Body, button and grip colours stored in SPI flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerColors {
    /// Body RGB
    pub body: [u8; 3],
    /// Buttons RGB
    pub buttons: [u8; 3],
    /// Left grip RGB
    pub left_grip: [u8; 3],
    /// Right grip RGB
    pub right_grip: [u8; 3],
}

impl Default for ControllerColors {
    fn default() -> Self {
        Self {
            body: [0x32, 0x32, 0x32],
            buttons: [0xFF, 0xFF, 0xFF],
            left_grip: [0x1E, 0x1E, 0x1E],
            right_grip: [0x1E, 0x1E, 0x1E],
        }
    }
}

/// Identity data for one emulated controller type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerProfile {
    /// Emulated controller type
    pub kind: ControllerKind,
    /// Bluetooth device name
    pub name: String,
    /// Class of device
    pub class_of_device: u32,
    /// USB vendor id
    pub vendor_id: u16,
    /// USB product id
    pub product_id: u16,
    /// Firmware version (major, minor)
    pub firmware_version: [u8; 2],
    /// Address reported in device info (the adapter's, when known)
    pub address: BdAddr,
    /// Serial number written at SPI 0x6000 (absent means unset)
    pub serial_number: Option<String>,
    /// Colours
    pub colors: ControllerColors,
    /// Factory calibration of the left stick
    pub left_stick_calibration: StickCalibration,
    /// Factory calibration of the right stick
    pub right_stick_calibration: StickCalibration,
}

impl Default for ControllerProfile {
    fn default() -> Self {
        Self::for_kind(ControllerKind::Pro)
    }
}

impl ControllerProfile {
    /// Built-in preset for a controller type.
    pub fn for_kind(kind: ControllerKind) -> Self {
        let colors = match kind {
            ControllerKind::Pro => ControllerColors::default(),
            ControllerKind::JoyconL => ControllerColors {
                body: [0x0A, 0xB9, 0xE6],
                buttons: [0x00, 0x1E, 0x1E],
                ..ControllerColors::default()
            },
            ControllerKind::JoyconR => ControllerColors {
                body: [0xFF, 0x3C, 0x28],
                buttons: [0x1E, 0x0A, 0x0A],
                ..ControllerColors::default()
            },
        };
        Self {
            kind,
            name: kind.device_name().to_string(),
            class_of_device: CLASS_OF_DEVICE,
            vendor_id: NINTENDO_VENDOR_ID,
            product_id: kind.product_id(),
            firmware_version: [0x03, 0x8B],
            address: BdAddr::ANY,
            serial_number: None,
            colors,
            left_stick_calibration: StickCalibration::default(),
            right_stick_calibration: StickCalibration::default(),
        }
    }

    /// Same profile with the adapter's real address.
    pub fn with_address(mut self, address: BdAddr) -> Self {
        self.address = address;
        self
    }

    /// Payload of the device info reply (subcommand 0x02).
    pub fn device_info(&self) -> [u8; 12] {
        let [fw_major, fw_minor] = self.firmware_version;
        let [a, b, c, d, e, f] = self.address.octets();
        [
            fw_major,
            fw_minor,
            self.kind.type_id(),
            0x02,
            a,
            b,
            c,
            d,
            e,
            f,
            0x01,
            0x01, // colours come from SPI
        ]
    }
}
