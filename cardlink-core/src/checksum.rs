//! Wire integrity helpers used by vendor framings
//!
//! Badge-reader serial dialects typically close a frame with either a
//! running XOR of the preceding bytes or a CRC-16 in the Kermit
//! (CCITT-reflected) flavor.

/// Running XOR over a buffer (often called BCC in reader manuals)
pub fn xor(data: &[u8]) -> u8 {
    data.iter().fold(0x00, |acc, &b| acc ^ b)
}

/// CRC-16/KERMIT: polynomial 0x8408 (reflected 0x1021), initial value 0
pub fn crc16_kermit(data: &[u8]) -> u16 {
    let mut crc: u16 = 0x0000;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0x8408;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_empty() {
        assert_eq!(xor(&[]), 0x00);
    }

    #[test]
    fn test_xor_vector() {
        assert_eq!(xor(&[0x01, 0x02, 0x04]), 0x07);
        assert_eq!(xor(&[0xFF, 0xFF]), 0x00);
    }

    #[test]
    fn test_xor_self_cancelling() {
        let frame = [0x11, 0x22, 0x33];
        let bcc = xor(&frame);
        let mut with_bcc = frame.to_vec();
        with_bcc.push(bcc);
        assert_eq!(xor(&with_bcc), 0x00);
    }

    #[test]
    fn test_kermit_check_string() {
        // Standard CRC catalogue check value for "123456789".
        assert_eq!(crc16_kermit(b"123456789"), 0x2189);
    }

    #[test]
    fn test_kermit_empty() {
        assert_eq!(crc16_kermit(&[]), 0x0000);
    }

    #[test]
    fn test_kermit_sensitivity() {
        assert_ne!(crc16_kermit(&[0x01, 0x02]), crc16_kermit(&[0x02, 0x01]));
    }
}
