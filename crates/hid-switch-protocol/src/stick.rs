//! 12-bit analog stick packing.
//!
//! Each stick occupies three report bytes holding two unsigned 12-bit values:
//! `b0 = x[7:0]`, `b1 = x[11:8] | y[3:0] << 4`, `b2 = y[11:4]`.
//! [`InputState`](crate::InputState) keeps axes signed around zero; the wire
//! value is the signed axis offset by [`STICK_CENTER`].

use serde::{Deserialize, Serialize};

/// Wire value of a centred axis.
pub const STICK_CENTER: u16 = 0x800;

/// Largest wire value.
pub const STICK_WIRE_MAX: u16 = 0xFFF;

/// Smallest signed axis value.
pub const AXIS_MIN: i16 = -2048;

/// Largest signed axis value.
pub const AXIS_MAX: i16 = 2047;

/// Signed stick position, each axis in `[-2048, 2047]`. Positive Y is up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StickPosition {
    /// Horizontal axis, positive right
    pub x: i16,
    /// Vertical axis, positive up
    pub y: i16,
}

impl StickPosition {
    /// Centred stick.
    pub const CENTER: StickPosition = StickPosition { x: 0, y: 0 };

    /// Build a position, clamping both axes into range.
    pub fn new(x: i16, y: i16) -> Self {
        Self {
            x: clamp_axis(x),
            y: clamp_axis(y),
        }
    }

    /// Encode as the three report bytes.
    pub fn to_wire(self) -> [u8; 3] {
        pack_12bit(axis_to_wire(self.x), axis_to_wire(self.y))
    }

    /// Decode three report bytes.
    pub fn from_wire(bytes: [u8; 3]) -> Self {
        let (x, y) = unpack_12bit(bytes);
        Self {
            x: wire_to_axis(x),
            y: wire_to_axis(y),
        }
    }
}

/// Clamp a signed axis value into `[AXIS_MIN, AXIS_MAX]`.
pub fn clamp_axis(value: i16) -> i16 {
    value.clamp(AXIS_MIN, AXIS_MAX)
}

/// Signed axis to 12-bit wire value.
pub fn axis_to_wire(value: i16) -> u16 {
    let shifted = i32::from(clamp_axis(value)) + i32::from(STICK_CENTER);
    u16::try_from(shifted).unwrap_or(STICK_CENTER)
}

/// 12-bit wire value to signed axis.
pub fn wire_to_axis(value: u16) -> i16 {
    let centred = i32::from(value & STICK_WIRE_MAX) - i32::from(STICK_CENTER);
    i16::try_from(centred).unwrap_or(0)
}

/// Pack two 12-bit values into three bytes.
pub fn pack_12bit(x: u16, y: u16) -> [u8; 3] {
    let x = x & STICK_WIRE_MAX;
    let y = y & STICK_WIRE_MAX;
    [
        (x & 0xFF) as u8,
        ((x >> 8) as u8) | (((y & 0x0F) as u8) << 4),
        (y >> 4) as u8,
    ]
}

/// Unpack three bytes into two 12-bit values.
pub fn unpack_12bit(bytes: [u8; 3]) -> (u16, u16) {
    let [b0, b1, b2] = bytes.map(u16::from);
    let x = b0 | ((b1 & 0x0F) << 8);
    let y = (b1 >> 4) | (b2 << 4);
    (x, y)
}

/// Factory stick calibration stored in SPI flash, in wire units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickCalibration {
    /// Centre X
    pub center_x: u16,
    /// Centre Y
    pub center_y: u16,
    /// Travel above centre on X
    pub max_above_x: u16,
    /// Travel above centre on Y
    pub max_above_y: u16,
    /// Travel below centre on X
    pub min_below_x: u16,
    /// Travel below centre on Y
    pub min_below_y: u16,
}

impl Default for StickCalibration {
    fn default() -> Self {
        Self {
            center_x: STICK_CENTER,
            center_y: STICK_CENTER,
            max_above_x: 0x7FF,
            max_above_y: 0x7FF,
            min_below_x: 0x7FF,
            min_below_y: 0x7FF,
        }
    }
}

impl StickCalibration {
    /// Left stick layout: max-above, centre, min-below.
    pub fn to_left_spi(&self) -> [u8; 9] {
        concat3(
            pack_12bit(self.max_above_x, self.max_above_y),
            pack_12bit(self.center_x, self.center_y),
            pack_12bit(self.min_below_x, self.min_below_y),
        )
    }

    /// Right stick layout: centre, min-below, max-above.
    pub fn to_right_spi(&self) -> [u8; 9] {
        concat3(
            pack_12bit(self.center_x, self.center_y),
            pack_12bit(self.min_below_x, self.min_below_y),
            pack_12bit(self.max_above_x, self.max_above_y),
        )
    }
}

fn concat3(a: [u8; 3], b: [u8; 3], c: [u8; 3]) -> [u8; 9] {
    let mut out = [0u8; 9];
    for (dst, src) in out.iter_mut().zip(a.iter().chain(&b).chain(&c)) {
        *dst = *src;
    }
    out
}
