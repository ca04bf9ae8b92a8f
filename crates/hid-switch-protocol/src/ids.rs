//! Nintendo vendor/product IDs and protocol byte constants.
//!
//! # Sources
//!
//! - Linux kernel `drivers/hid/hid-nintendo.c` and `hid-ids.h`:
//!   `USB_VENDOR_ID_NINTENDO = 0x057e`, Joy-Con and Pro Controller PIDs.
//! - dekuNukem/Nintendo_Switch_Reverse_Engineering: subcommand table,
//!   reply acknowledgement bytes and SPI flash layout.

/// Nintendo Co., Ltd vendor ID.
pub const NINTENDO_VENDOR_ID: u16 = 0x057E;

/// Known Nintendo controller product IDs.
pub mod product_ids {
    /// Joy-Con (L)
    pub const JOYCON_L: u16 = 0x2006;
    /// Joy-Con (R)
    pub const JOYCON_R: u16 = 0x2007;
    /// Pro Controller
    pub const PRO_CONTROLLER: u16 = 0x2009;
}

/// Bluetooth class of device advertised by a gamepad
/// (major class Peripheral, minor Gamepad, Limited Discoverable service bit).
pub const CLASS_OF_DEVICE: u32 = 0x002508;

/// HID service class UUID (16-bit form).
pub const HID_SERVICE_UUID: u16 = 0x1124;

/// L2CAP PSM of the HID control channel.
pub const PSM_HID_CONTROL: u16 = 0x0011;

/// L2CAP PSM of the HID interrupt channel.
pub const PSM_HID_INTERRUPT: u16 = 0x0013;

/// Input report IDs (controller to console).
pub mod input_report_ids {
    /// Standard input report carrying a subcommand reply
    pub const SUBCOMMAND_REPLY: u8 = 0x21;
    /// Standard full input report
    pub const FULL: u8 = 0x30;
    /// Full input report with NFC/IR data section
    pub const NFC_IR: u8 = 0x31;
    /// Simple HID mode report
    pub const SIMPLE_HID: u8 = 0x3F;
}

/// Output report IDs (console to controller).
pub mod output_report_ids {
    /// Rumble plus subcommand
    pub const RUMBLE_AND_SUBCOMMAND: u8 = 0x01;
    /// Rumble only
    pub const RUMBLE_ONLY: u8 = 0x10;
}

/// Subcommand IDs carried in output report 0x01.
pub mod subcommand_ids {
    /// Bluetooth manual pairing
    pub const BLUETOOTH_PAIRING: u8 = 0x01;
    /// Request device info
    pub const REQUEST_DEVICE_INFO: u8 = 0x02;
    /// Set input report mode
    pub const SET_INPUT_REPORT_MODE: u8 = 0x03;
    /// Trigger buttons elapsed time
    pub const TRIGGER_BUTTONS_ELAPSED_TIME: u8 = 0x04;
    /// Set shipment low power state
    pub const SET_SHIPMENT_LOW_POWER: u8 = 0x08;
    /// SPI flash read
    pub const SPI_FLASH_READ: u8 = 0x10;
    /// Set NFC/IR MCU configuration
    pub const SET_NFC_IR_CONFIG: u8 = 0x21;
    /// Set NFC/IR MCU state
    pub const SET_NFC_IR_STATE: u8 = 0x22;
    /// Set player lights
    pub const SET_PLAYER_LIGHTS: u8 = 0x30;
    /// Set HOME light
    pub const SET_HOME_LIGHT: u8 = 0x38;
    /// Enable 6-axis sensor
    pub const ENABLE_IMU: u8 = 0x40;
    /// Set 6-axis sensitivity
    pub const SET_IMU_SENSITIVITY: u8 = 0x41;
    /// Enable vibration
    pub const ENABLE_VIBRATION: u8 = 0x48;
}

/// Acknowledgement bytes placed at offset 13 of a 0x21 reply.
pub mod ack {
    /// Plain acknowledgement with no data
    pub const GENERIC: u8 = 0x80;
    /// Bluetooth pairing reply
    pub const BLUETOOTH_PAIRING: u8 = 0x81;
    /// Device info reply
    pub const DEVICE_INFO: u8 = 0x82;
    /// Trigger elapsed time reply
    pub const TRIGGER_ELAPSED: u8 = 0x83;
    /// SPI flash read reply
    pub const SPI_READ: u8 = 0x90;
    /// NFC/IR MCU configuration reply
    pub const NFC_IR_CONFIG: u8 = 0xA0;
}

/// Vibrator report byte sent while rumble is idle.
pub const VIBRATOR_IDLE: u8 = 0x80;
