//! Subcommand requests and replies.
//!
//! The console's subcommands form a closed set; anything outside it decodes
//! to [`Subcommand::Unrecognized`] and is answered with a plain ack.

use nxbridge_errors::ReportError;

use crate::ids::{ack, subcommand_ids as ids};

/// Maximum reply payload after the ack and subcommand id bytes.
pub const MAX_REPLY_DATA: usize = 35;

/// One decoded subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    /// 0x01: Bluetooth manual pairing, step 1 carries the host address
    BluetoothPairing {
        /// Pairing step (1 to 3)
        step: u8,
        /// Console address (all zero unless step 1)
        host_address: [u8; 6],
    },
    /// 0x02: request device info
    RequestDeviceInfo,
    /// 0x03: select input report mode (raw mode byte)
    SetInputReportMode(u8),
    /// 0x04: trigger buttons elapsed time
    TriggerButtonsElapsedTime,
    /// 0x08: shipment low power state
    SetShipmentLowPower(bool),
    /// 0x10: read SPI flash
    SpiFlashRead {
        /// Flash address
        address: u32,
        /// Requested byte count
        length: u8,
    },
    /// 0x21: NFC/IR MCU configuration
    SetNfcIrConfig,
    /// 0x22: NFC/IR MCU state
    SetNfcIrState(u8),
    /// 0x30: player lights pattern
    SetPlayerLights(u8),
    /// 0x38: HOME light pattern (ignored beyond the ack)
    SetHomeLight,
    /// 0x40: enable 6-axis sensor
    EnableImu(bool),
    /// 0x41: 6-axis sensitivity
    SetImuSensitivity,
    /// 0x48: enable vibration
    EnableVibration(bool),
    /// Any other id
    Unrecognized(u8),
}

impl Subcommand {
    /// Decode a subcommand from its id and argument bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::TruncatedArguments`] when a known subcommand's
    /// fixed argument block is cut short.
    pub fn decode(id: u8, args: &[u8]) -> Result<Self, ReportError> {
        let need = |expected: usize| {
            if args.len() < expected {
                Err(ReportError::TruncatedArguments {
                    subcommand: id,
                    expected,
                    actual: args.len(),
                })
            } else {
                Ok(())
            }
        };
        let first = || args.first().copied().unwrap_or(0);

        let sub = match id {
            ids::BLUETOOTH_PAIRING => {
                need(1)?;
                let mut host_address = [0u8; 6];
                if let Some(addr) = args.get(1..7) {
                    host_address.copy_from_slice(addr);
                }
                Subcommand::BluetoothPairing {
                    step: first(),
                    host_address,
                }
            }
            ids::REQUEST_DEVICE_INFO => Subcommand::RequestDeviceInfo,
            ids::SET_INPUT_REPORT_MODE => {
                need(1)?;
                Subcommand::SetInputReportMode(first())
            }
            ids::TRIGGER_BUTTONS_ELAPSED_TIME => Subcommand::TriggerButtonsElapsedTime,
            ids::SET_SHIPMENT_LOW_POWER => Subcommand::SetShipmentLowPower(first() != 0),
            ids::SPI_FLASH_READ => {
                need(5)?;
                let mut addr = [0u8; 4];
                addr.copy_from_slice(args.get(0..4).unwrap_or(&[0; 4]));
                Subcommand::SpiFlashRead {
                    address: u32::from_le_bytes(addr),
                    length: args.get(4).copied().unwrap_or(0),
                }
            }
            ids::SET_NFC_IR_CONFIG => Subcommand::SetNfcIrConfig,
            ids::SET_NFC_IR_STATE => Subcommand::SetNfcIrState(first()),
            ids::SET_PLAYER_LIGHTS => {
                need(1)?;
                Subcommand::SetPlayerLights(first())
            }
            ids::SET_HOME_LIGHT => Subcommand::SetHomeLight,
            ids::ENABLE_IMU => Subcommand::EnableImu(first() != 0),
            ids::SET_IMU_SENSITIVITY => Subcommand::SetImuSensitivity,
            ids::ENABLE_VIBRATION => {
                need(1)?;
                Subcommand::EnableVibration(first() != 0)
            }
            other => Subcommand::Unrecognized(other),
        };
        Ok(sub)
    }

    /// Wire id of this subcommand.
    pub fn id(&self) -> u8 {
        match self {
            Subcommand::BluetoothPairing { .. } => ids::BLUETOOTH_PAIRING,
            Subcommand::RequestDeviceInfo => ids::REQUEST_DEVICE_INFO,
            Subcommand::SetInputReportMode(_) => ids::SET_INPUT_REPORT_MODE,
            Subcommand::TriggerButtonsElapsedTime => ids::TRIGGER_BUTTONS_ELAPSED_TIME,
            Subcommand::SetShipmentLowPower(_) => ids::SET_SHIPMENT_LOW_POWER,
            Subcommand::SpiFlashRead { .. } => ids::SPI_FLASH_READ,
            Subcommand::SetNfcIrConfig => ids::SET_NFC_IR_CONFIG,
            Subcommand::SetNfcIrState(_) => ids::SET_NFC_IR_STATE,
            Subcommand::SetPlayerLights(_) => ids::SET_PLAYER_LIGHTS,
            Subcommand::SetHomeLight => ids::SET_HOME_LIGHT,
            Subcommand::EnableImu(_) => ids::ENABLE_IMU,
            Subcommand::SetImuSensitivity => ids::SET_IMU_SENSITIVITY,
            Subcommand::EnableVibration(_) => ids::ENABLE_VIBRATION,
            Subcommand::Unrecognized(id) => *id,
        }
    }

    /// Encode the argument bytes (console side, used by tests and simulators).
    pub fn encode_args(&self) -> Vec<u8> {
        match *self {
            Subcommand::BluetoothPairing { step, host_address } => {
                let mut args = vec![step];
                if step == 1 {
                    args.extend_from_slice(&host_address);
                }
                args
            }
            Subcommand::SetInputReportMode(mode) => vec![mode],
            Subcommand::SetShipmentLowPower(on) => vec![u8::from(on)],
            Subcommand::SpiFlashRead { address, length } => {
                let mut args = address.to_le_bytes().to_vec();
                args.push(length);
                args
            }
            Subcommand::SetNfcIrState(state) => vec![state],
            Subcommand::SetPlayerLights(pattern) => vec![pattern],
            Subcommand::EnableImu(on) | Subcommand::EnableVibration(on) => vec![u8::from(on)],
            Subcommand::SetNfcIrConfig => vec![0x21, 0x00, 0x00],
            Subcommand::SetHomeLight => vec![0x0F],
            Subcommand::SetImuSensitivity => vec![0x03, 0x00, 0x00, 0x01],
            Subcommand::RequestDeviceInfo
            | Subcommand::TriggerButtonsElapsedTime
            | Subcommand::Unrecognized(_) => Vec::new(),
        }
    }
}

/// A subcommand from the console, tagged with its arrival sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubcommandRequest {
    /// Packet counter from the output report (low nibble)
    pub packet_counter: u8,
    /// Rumble data that preceded the subcommand
    pub rumble: [u8; 8],
    /// Decoded subcommand
    pub subcommand: Subcommand,
    /// Emulator-side sequence number, assigned in arrival order
    pub sequence: u64,
}

/// The emulator's reply to one [`SubcommandRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubcommandReply {
    /// Sequence number copied from the request
    pub sequence: u64,
    /// Acknowledgement byte (offset 13)
    pub ack: u8,
    /// Subcommand id being answered (offset 14)
    pub subcommand_id: u8,
    data: [u8; MAX_REPLY_DATA],
    len: usize,
}

impl SubcommandReply {
    /// Build a reply. Data beyond [`MAX_REPLY_DATA`] bytes is dropped.
    pub fn new(request: &SubcommandRequest, ack: u8, data: &[u8]) -> Self {
        Self::with_id(request.sequence, request.subcommand.id(), ack, data)
    }

    /// Build a reply from raw parts.
    pub fn with_id(sequence: u64, subcommand_id: u8, ack: u8, data: &[u8]) -> Self {
        let len = data.len().min(MAX_REPLY_DATA);
        let mut buf = [0u8; MAX_REPLY_DATA];
        if let (Some(dst), Some(src)) = (buf.get_mut(..len), data.get(..len)) {
            dst.copy_from_slice(src);
        }
        Self {
            sequence,
            ack,
            subcommand_id,
            data: buf,
            len,
        }
    }

    /// Plain acknowledgement with no data.
    pub fn ack(request: &SubcommandRequest) -> Self {
        Self::new(request, ack::GENERIC, &[])
    }

    /// Reply payload.
    pub fn data(&self) -> &[u8] {
        self.data.get(..self.len).unwrap_or(&[])
    }
}
