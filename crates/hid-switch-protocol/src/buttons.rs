//! Button bitfield.
//!
//! Bit positions are the console firmware's byte layout: bits 0-7 are the
//! "right" byte (report offset 3), bits 8-15 the "shared" byte (offset 4)
//! and bits 16-23 the "left" byte (offset 5).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Pressed buttons, laid out exactly as the three report bytes.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Buttons: u32 {
        // right byte
        const Y            = 1 << 0;
        const X            = 1 << 1;
        const B            = 1 << 2;
        const A            = 1 << 3;
        const RIGHT_SR     = 1 << 4;
        const RIGHT_SL     = 1 << 5;
        const R            = 1 << 6;
        const ZR           = 1 << 7;

        // shared byte
        const MINUS        = 1 << 8;
        const PLUS         = 1 << 9;
        const R_STICK      = 1 << 10;
        const L_STICK      = 1 << 11;
        const HOME         = 1 << 12;
        const CAPTURE      = 1 << 13;
        const CHARGING_GRIP = 1 << 15;

        // left byte
        const DPAD_DOWN    = 1 << 16;
        const DPAD_UP      = 1 << 17;
        const DPAD_RIGHT   = 1 << 18;
        const DPAD_LEFT    = 1 << 19;
        const LEFT_SR      = 1 << 20;
        const LEFT_SL      = 1 << 21;
        const L            = 1 << 22;
        const ZL           = 1 << 23;
    }
}

impl Buttons {
    /// All four d-pad directions.
    pub const DPAD: Buttons = Buttons::DPAD_UP
        .union(Buttons::DPAD_DOWN)
        .union(Buttons::DPAD_LEFT)
        .union(Buttons::DPAD_RIGHT);

    /// Encode as the three report bytes (right, shared, left).
    pub fn to_wire(self) -> [u8; 3] {
        let [r, s, l, _] = self.bits().to_le_bytes();
        [r, s, l]
    }

    /// Decode the three report bytes. Unassigned bits are dropped.
    pub fn from_wire(bytes: [u8; 3]) -> Self {
        let [r, s, l] = bytes;
        Buttons::from_bits_truncate(u32::from_le_bytes([r, s, l, 0]))
    }

    /// Look up a single button by its lowercase or uppercase name (`"a"`, `"dpad_up"`).
    pub fn from_button_name(name: &str) -> Option<Self> {
        Buttons::from_name(&name.to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_bytes() {
        assert_eq!(Buttons::A.to_wire(), [0x08, 0x00, 0x00]);
        assert_eq!(Buttons::HOME.to_wire(), [0x00, 0x10, 0x00]);
        assert_eq!(Buttons::ZL.to_wire(), [0x00, 0x00, 0x80]);
        assert_eq!(
            (Buttons::B | Buttons::PLUS | Buttons::DPAD_LEFT).to_wire(),
            [0x04, 0x02, 0x08]
        );
    }

    #[test]
    fn test_from_wire_drops_reserved_bit() {
        // bit 6 of the shared byte is unassigned
        assert_eq!(Buttons::from_wire([0x00, 0x40, 0x00]), Buttons::empty());
    }

    #[test]
    fn test_from_button_name() {
        assert_eq!(Buttons::from_button_name("a"), Some(Buttons::A));
        assert_eq!(Buttons::from_button_name("dpad_up"), Some(Buttons::DPAD_UP));
        assert_eq!(Buttons::from_button_name("ZR"), Some(Buttons::ZR));
        assert_eq!(Buttons::from_button_name("turbo"), None);
    }
}
