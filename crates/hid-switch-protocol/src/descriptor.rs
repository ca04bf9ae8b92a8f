//! HID report descriptor advertised in the SDP record.

/// Pro Controller HID report descriptor (203 bytes).
///
/// Declares input reports 0x30, 0x21 and 0x81 and output reports 0x01, 0x10,
/// 0x80 and 0x82.
#[rustfmt::skip]
pub const HID_REPORT_DESCRIPTOR: [u8; 203] = [
    0x05, 0x01, 0x15, 0x00, 0x09, 0x04, 0xA1, 0x01,
    // report 0x30: buttons 1-10
    0x85, 0x30, 0x05, 0x01, 0x05, 0x09, 0x19, 0x01, 0x29, 0x0A, 0x15, 0x00, 0x25, 0x01,
    0x75, 0x01, 0x95, 0x0A, 0x55, 0x00, 0x65, 0x00, 0x81, 0x02,
    // buttons 11-14, 2 bits padding
    0x05, 0x09, 0x19, 0x0B, 0x29, 0x0E, 0x15, 0x00, 0x25, 0x01, 0x75, 0x01, 0x95, 0x04,
    0x81, 0x02, 0x75, 0x01, 0x95, 0x02, 0x81, 0x03,
    // sticks: X, Y, Z, Rz as 16-bit
    0x0B, 0x01, 0x00, 0x01, 0x00, 0xA1, 0x00,
    0x0B, 0x30, 0x00, 0x01, 0x00, 0x0B, 0x31, 0x00, 0x01, 0x00,
    0x0B, 0x32, 0x00, 0x01, 0x00, 0x0B, 0x35, 0x00, 0x01, 0x00,
    0x15, 0x00, 0x27, 0xFF, 0xFF, 0x00, 0x00, 0x75, 0x10, 0x95, 0x04, 0x81, 0x02, 0xC0,
    // hat switch
    0x0B, 0x39, 0x00, 0x01, 0x00, 0x15, 0x00, 0x25, 0x07, 0x35, 0x00, 0x46, 0x3B, 0x01,
    0x65, 0x14, 0x75, 0x04, 0x95, 0x01, 0x81, 0x02,
    // buttons 15-18, 52 bytes padding
    0x05, 0x09, 0x19, 0x0F, 0x29, 0x12, 0x15, 0x00, 0x25, 0x01, 0x75, 0x01, 0x95, 0x04,
    0x81, 0x02, 0x75, 0x08, 0x95, 0x34, 0x81, 0x03,
    // vendor page: input 0x21, 0x81
    0x06, 0x00, 0xFF,
    0x85, 0x21, 0x09, 0x01, 0x75, 0x08, 0x95, 0x3F, 0x81, 0x03,
    0x85, 0x81, 0x09, 0x02, 0x75, 0x08, 0x95, 0x3F, 0x81, 0x03,
    // output 0x01, 0x10, 0x80, 0x82
    0x85, 0x01, 0x09, 0x03, 0x75, 0x08, 0x95, 0x3F, 0x91, 0x83,
    0x85, 0x10, 0x09, 0x04, 0x75, 0x08, 0x95, 0x3F, 0x91, 0x83,
    0x85, 0x80, 0x09, 0x05, 0x75, 0x08, 0x95, 0x3F, 0x91, 0x83,
    0x85, 0x82, 0x09, 0x06, 0x75, 0x08, 0x95, 0x3F, 0x91, 0x83,
    0xC0,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_is_one_closed_collection() {
        assert_eq!(HID_REPORT_DESCRIPTOR[6..8], [0xA1, 0x01]);
        assert_eq!(HID_REPORT_DESCRIPTOR.last(), Some(&0xC0));
        let opens = HID_REPORT_DESCRIPTOR
            .windows(2)
            .filter(|w| w[0] == 0xA1 && (w[1] == 0x00 || w[1] == 0x01))
            .count();
        assert_eq!(opens, 2);
    }

    #[test]
    fn test_descriptor_declares_protocol_reports() {
        for id in [0x30u8, 0x21, 0x01, 0x10] {
            assert!(
                HID_REPORT_DESCRIPTOR.windows(2).any(|w| w == [0x85, id]),
                "report id {id:#04x} missing"
            );
        }
    }
}
