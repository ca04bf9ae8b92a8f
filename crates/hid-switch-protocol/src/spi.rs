//! SPI flash emulation.
//!
//! The console reads calibration and colours out of the controller's SPI
//! flash during the handshake. [`SpiFlash`] serves those reads from two
//! in-memory regions built from a [`ControllerProfile`]: factory data at
//! `0x6000..0x7000` and user data at `0x8000..0x9000`. Everything else reads
//! as erased flash (`0xFF`).

use tracing::trace;

use crate::profile::ControllerProfile;

/// Largest read the console may request in one subcommand.
pub const MAX_READ_LEN: u8 = 0x1D;

/// Erased flash byte.
pub const ERASED: u8 = 0xFF;

/// Known SPI flash addresses.
pub mod addresses {
    /// Factory region base
    pub const FACTORY_BASE: u32 = 0x6000;
    /// User region base
    pub const USER_BASE: u32 = 0x8000;
    /// Region size
    pub const REGION_LEN: u32 = 0x1000;

    /// Serial number (16 bytes)
    pub const SERIAL_NUMBER: u32 = 0x6000;
    /// Device type
    pub const DEVICE_TYPE: u32 = 0x6012;
    /// Colour info present flag
    pub const COLOR_INFO: u32 = 0x601B;
    /// Factory 6-axis calibration (24 bytes)
    pub const FACTORY_IMU_CALIBRATION: u32 = 0x6020;
    /// Factory left stick calibration (9 bytes)
    pub const FACTORY_LEFT_STICK: u32 = 0x603D;
    /// Factory right stick calibration (9 bytes)
    pub const FACTORY_RIGHT_STICK: u32 = 0x6046;
    /// Body colour
    pub const BODY_COLOR: u32 = 0x6050;
    /// Buttons colour
    pub const BUTTON_COLOR: u32 = 0x6053;
    /// Left grip colour
    pub const LEFT_GRIP_COLOR: u32 = 0x6056;
    /// Right grip colour
    pub const RIGHT_GRIP_COLOR: u32 = 0x6059;
    /// 6-axis horizontal offsets
    pub const IMU_HORIZONTAL_OFFSETS: u32 = 0x6080;
    /// Left stick parameters (18 bytes)
    pub const LEFT_STICK_PARAMS: u32 = 0x6086;
    /// Right stick parameters (18 bytes)
    pub const RIGHT_STICK_PARAMS: u32 = 0x6098;
    /// User left stick calibration (magic + 9 bytes)
    pub const USER_LEFT_STICK: u32 = 0x8010;
    /// User right stick calibration (magic + 9 bytes)
    pub const USER_RIGHT_STICK: u32 = 0x801B;
    /// User 6-axis calibration (magic + 24 bytes)
    pub const USER_IMU_CALIBRATION: u32 = 0x8026;
}

const FACTORY_IMU_CALIBRATION: [u8; 24] = [
    0x23, 0x00, 0xB9, 0xFF, 0x1A, 0x01, 0x00, 0x40, 0x00, 0x40, 0x00, 0x40, 0x01, 0x00, 0x01, 0x00,
    0x01, 0x00, 0x3B, 0x34, 0x3B, 0x34, 0x3B, 0x34,
];

const IMU_HORIZONTAL_OFFSETS: [u8; 6] = [0x50, 0xFD, 0x00, 0x00, 0xC6, 0x0F];

const STICK_PARAMS: [u8; 18] = [
    0x0F, 0x30, 0x61, 0xAE, 0x90, 0xD9, 0xD4, 0x14, 0x54, 0x41, 0x15, 0x54, 0xC7, 0x79, 0x9C, 0x33,
    0x36, 0x63,
];

/// In-memory SPI flash image.
#[derive(Clone, PartialEq, Eq)]
pub struct SpiFlash {
    factory: Vec<u8>,
    user: Vec<u8>,
}

impl SpiFlash {
    /// Build the flash image for a profile.
    pub fn from_profile(profile: &ControllerProfile) -> Self {
        let mut flash = Self {
            factory: vec![ERASED; addresses::REGION_LEN as usize],
            user: vec![ERASED; addresses::REGION_LEN as usize],
        };

        if let Some(serial) = &profile.serial_number {
            let bytes: Vec<u8> = serial.bytes().take(16).collect();
            flash.write(addresses::SERIAL_NUMBER, &bytes);
        }
        flash.write(addresses::DEVICE_TYPE, &[profile.kind.type_id(), 0xA0]);
        flash.write(addresses::COLOR_INFO, &[0x01]);
        flash.write(addresses::FACTORY_IMU_CALIBRATION, &FACTORY_IMU_CALIBRATION);
        flash.write(
            addresses::FACTORY_LEFT_STICK,
            &profile.left_stick_calibration.to_left_spi(),
        );
        flash.write(
            addresses::FACTORY_RIGHT_STICK,
            &profile.right_stick_calibration.to_right_spi(),
        );
        flash.write(addresses::BODY_COLOR, &profile.colors.body);
        flash.write(addresses::BUTTON_COLOR, &profile.colors.buttons);
        flash.write(addresses::LEFT_GRIP_COLOR, &profile.colors.left_grip);
        flash.write(addresses::RIGHT_GRIP_COLOR, &profile.colors.right_grip);
        flash.write(addresses::IMU_HORIZONTAL_OFFSETS, &IMU_HORIZONTAL_OFFSETS);
        flash.write(addresses::LEFT_STICK_PARAMS, &STICK_PARAMS);
        flash.write(addresses::RIGHT_STICK_PARAMS, &STICK_PARAMS);
        // user calibration area stays erased: no user calibration present
        flash
    }

    fn region_mut(&mut self, address: u32) -> Option<(&mut Vec<u8>, usize)> {
        match address {
            a if (addresses::FACTORY_BASE..addresses::FACTORY_BASE + addresses::REGION_LEN)
                .contains(&a) =>
            {
                Some((&mut self.factory, (a - addresses::FACTORY_BASE) as usize))
            }
            a if (addresses::USER_BASE..addresses::USER_BASE + addresses::REGION_LEN)
                .contains(&a) =>
            {
                Some((&mut self.user, (a - addresses::USER_BASE) as usize))
            }
            _ => None,
        }
    }

    fn byte_at(&self, address: u32) -> u8 {
        let (region, base) = if address >= addresses::USER_BASE {
            (&self.user, addresses::USER_BASE)
        } else {
            (&self.factory, addresses::FACTORY_BASE)
        };
        address
            .checked_sub(base)
            .and_then(|offset| region.get(offset as usize))
            .copied()
            .unwrap_or(ERASED)
    }

    /// Overwrite bytes starting at `address`. Bytes outside both regions are dropped.
    pub fn write(&mut self, address: u32, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            let Some(addr) = u32::try_from(i).ok().and_then(|i| address.checked_add(i)) else {
                return;
            };
            if let Some((region, offset)) = self.region_mut(addr)
                && let Some(slot) = region.get_mut(offset)
            {
                *slot = byte;
            }
        }
    }

    /// Read up to [`MAX_READ_LEN`] bytes starting at `address`.
    pub fn read(&self, address: u32, length: u8) -> Vec<u8> {
        let length = length.min(MAX_READ_LEN);
        trace!(address = format_args!("{address:#06x}"), length, "spi read");
        (0..u32::from(length))
            .map(|i| address.checked_add(i).map_or(ERASED, |a| self.byte_at(a)))
            .collect()
    }

    /// Payload of an SPI read reply: little-endian address, length, data.
    pub fn read_reply(&self, address: u32, length: u8) -> Vec<u8> {
        let data = self.read(address, length);
        let mut out = Vec::with_capacity(5 + data.len());
        out.extend_from_slice(&address.to_le_bytes());
        out.push(u8::try_from(data.len()).unwrap_or(MAX_READ_LEN));
        out.extend_from_slice(&data);
        out
    }
}

impl core::fmt::Debug for SpiFlash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpiFlash")
            .field("factory_len", &self.factory.len())
            .field("user_len", &self.user.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ControllerKind, ControllerProfile};

    fn flash() -> SpiFlash {
        SpiFlash::from_profile(&ControllerProfile::for_kind(ControllerKind::Pro))
    }

    #[test]
    fn test_device_type_and_colors() {
        let f = flash();
        assert_eq!(f.read(addresses::DEVICE_TYPE, 1), vec![0x03]);
        assert_eq!(f.read(addresses::BODY_COLOR, 6), vec![0x32, 0x32, 0x32, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_left_stick_factory_calibration() {
        let profile = ControllerProfile::default();
        let f = SpiFlash::from_profile(&profile);
        assert_eq!(
            f.read(addresses::FACTORY_LEFT_STICK, 9),
            profile.left_stick_calibration.to_left_spi().to_vec()
        );
    }

    #[test]
    fn test_user_calibration_is_erased() {
        assert!(flash().read(addresses::USER_LEFT_STICK, 0x16).iter().all(|&b| b == ERASED));
    }

    #[test]
    fn test_unmapped_reads_as_erased() {
        assert_eq!(flash().read(0x1234, 4), vec![ERASED; 4]);
        assert_eq!(flash().read(u32::MAX - 1, 4), vec![ERASED; 4]);
    }

    #[test]
    fn test_read_length_clamped() {
        assert_eq!(flash().read(0x6000, 0xFF).len(), MAX_READ_LEN as usize);
    }

    #[test]
    fn test_read_reply_header() {
        let reply = flash().read_reply(0x603D, 0x12);
        assert_eq!(&reply[..5], &[0x3D, 0x60, 0x00, 0x00, 0x12]);
        assert_eq!(reply.len(), 5 + 0x12);
    }

    #[test]
    fn test_serial_number_written() {
        let profile = ControllerProfile {
            serial_number: Some("XCW1".into()),
            ..ControllerProfile::default()
        };
        let f = SpiFlash::from_profile(&profile);
        assert_eq!(f.read(addresses::SERIAL_NUMBER, 5), b"XCW1\xFF".to_vec());
    }
}
