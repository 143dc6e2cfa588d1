//! ISO 7816-4 APDU framing
//!
//! # Command Structure (short form)
//!
//! ```text
//! ┌─────┬─────┬─────┬─────┬──────┬─────────┬──────┐
//! │ CLA │ INS │ P1  │ P2  │  Lc  │  Data   │  Le  │
//! │  1  │  1  │  1  │  1  │ 0/1  │ 0..255  │ 0/1  │
//! └─────┴─────┴─────┴─────┴──────┴─────────┴──────┘
//! ```
//!
//! A response is the answer data followed by the two status bytes SW1 SW2.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Success status word
pub const SW_SUCCESS: u16 = 0x9000;

/// An ISO 7816 command APDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduCommand {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,

    /// Command data field (Lc is derived from its length)
    pub data: Bytes,

    /// Expected response length, when the command asks for data back
    pub le: Option<u8>,
}

impl ApduCommand {
    /// Create a header-only command
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Bytes::new(),
            le: None,
        }
    }

    /// Attach a command data field
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    /// Attach an expected-length byte
    pub fn with_le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// Encode to wire bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueTooLarge`] if the data field exceeds the
    /// one-byte Lc ceiling.
    pub fn encode(&self) -> Result<Bytes> {
        if self.data.len() > 255 {
            return Err(Error::ValueTooLarge {
                size: self.data.len(),
            });
        }

        let mut buf = BytesMut::with_capacity(6 + self.data.len());
        buf.put_u8(self.cla);
        buf.put_u8(self.ins);
        buf.put_u8(self.p1);
        buf.put_u8(self.p2);
        if !self.data.is_empty() {
            buf.put_u8(self.data.len() as u8);
            buf.put_slice(&self.data);
        }
        if let Some(le) = self.le {
            buf.put_u8(le);
        }
        Ok(buf.freeze())
    }
}

impl fmt::Display for ApduCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "APDU[{:02X} {:02X} {:02X} {:02X}](lc={}, le={:?})",
            self.cla,
            self.ins,
            self.p1,
            self.p2,
            self.data.len(),
            self.le
        )
    }
}

/// An ISO 7816 response APDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    /// Answer data, without the status trailer
    pub data: Bytes,

    pub sw1: u8,
    pub sw2: u8,
}

impl ApduResponse {
    /// Parse a raw reply into data and status trailer
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if the reply is shorter than the
    /// two status bytes.
    pub fn parse(input: &[u8]) -> Result<Self> {
        if input.len() < 2 {
            return Err(Error::Truncated {
                expected: 2,
                actual: input.len(),
            });
        }

        let split = input.len() - 2;
        Ok(Self {
            data: Bytes::copy_from_slice(&input[..split]),
            sw1: input[split],
            sw2: input[split + 1],
        })
    }

    /// The combined status word
    pub fn sw(&self) -> u16 {
        u16::from_be_bytes([self.sw1, self.sw2])
    }

    /// Whether the status word reports success (9000 or 61xx)
    pub fn is_success(&self) -> bool {
        self.sw() == SW_SUCCESS || self.sw1 == 0x61
    }
}

impl fmt::Display for ApduResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Response[SW={:04X}](len={})", self.sw(), self.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_header_only_command() {
        let apdu = ApduCommand::new(0x00, 0xA4, 0x04, 0x00);
        assert_eq!(apdu.encode().unwrap().as_ref(), &[0x00, 0xA4, 0x04, 0x00]);
    }

    #[test]
    fn test_command_with_data_and_le() {
        let apdu = ApduCommand::new(0x00, 0xA4, 0x04, 0x00)
            .with_data(vec![0xA0, 0x00, 0x00])
            .with_le(0x00);
        assert_eq!(
            apdu.encode().unwrap().as_ref(),
            &[0x00, 0xA4, 0x04, 0x00, 0x03, 0xA0, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_data_field_ceiling() {
        let apdu = ApduCommand::new(0x00, 0xD6, 0x00, 0x00).with_data(vec![0u8; 256]);
        assert_eq!(apdu.encode(), Err(Error::ValueTooLarge { size: 256 }));
    }

    #[test]
    fn test_response_parse() {
        let response = ApduResponse::parse(&[0xDE, 0xAD, 0x90, 0x00]).unwrap();
        assert_eq!(response.data.as_ref(), &[0xDE, 0xAD]);
        assert_eq!(response.sw(), 0x9000);
        assert!(response.is_success());
    }

    #[test]
    fn test_status_only_response() {
        let response = ApduResponse::parse(&[0x69, 0x82]).unwrap();
        assert!(response.data.is_empty());
        assert!(!response.is_success());
    }

    #[test]
    fn test_response_too_short() {
        assert!(matches!(
            ApduResponse::parse(&[0x90]),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_more_data_is_success() {
        let response = ApduResponse::parse(&[0x61, 0x10]).unwrap();
        assert!(response.is_success());
    }
}
