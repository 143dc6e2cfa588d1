//! Command sets: logical operations for one chip family
//!
//! A [`CommandSet`] owns its transport and a [`CommandAdapter`] describing
//! the reader's wire dialect; the chip it serves is identified by a plain
//! [`ChipType`] tag. Operations a family cannot perform keep the default
//! bodies and report `NotSupported`.

use bytes::Bytes;
use cardlink_core::apdu::ApduCommand;
use cardlink_core::framing::FrameExtractor;
use cardlink_core::status::{RuleEffect, StatusCategory, StatusChecker, StatusWidth};
use cardlink_transport::Transport;
use cardlink_types::{AuthKey, ChipType, KeyType};

use crate::adapter::{Command, CommandAdapter, WireTransform};
use crate::error::{Error, Result};

/// MIFARE Classic block payload size
pub const BLOCK_SIZE: usize = 16;

/// Logical reader operations, independent of wire dialect
pub trait CommandSet {
    /// Chip family this set serves
    fn chip_type(&self) -> ChipType;

    /// Card UID / serial number
    fn uid(&mut self) -> Result<Bytes> {
        Err(Error::NotSupported("uid"))
    }

    /// Read one data block
    fn read_block(&mut self, _block: u8) -> Result<Bytes> {
        Err(Error::NotSupported("read_block"))
    }

    /// Write one data block
    fn write_block(&mut self, _block: u8, _data: &[u8]) -> Result<()> {
        Err(Error::NotSupported("write_block"))
    }

    /// Authenticate a sector for subsequent block access
    fn authenticate(&mut self, _block: u8, _key_type: KeyType, _key: &AuthKey) -> Result<()> {
        Err(Error::NotSupported("authenticate"))
    }
}

/// MIFARE Classic over PC/SC-style pseudo-APDUs
///
/// Contactless readers expose Classic cards through the FF instruction
/// class: load-key, general-authenticate, read-binary, update-binary. The
/// wire frame is the bare APDU; replies end in SW1/SW2.
pub struct MifareClassicCommands {
    transport: Box<dyn Transport>,
    adapter: CommandAdapter,
    chip_type: ChipType,
}

impl MifareClassicCommands {
    /// `chip_type` selects the 1K or 4K capacity tag
    pub fn new(transport: Box<dyn Transport>, chip_type: ChipType) -> Self {
        Self {
            transport,
            adapter: CommandAdapter::new().with_checker(StatusChecker::iso7816()),
            chip_type,
        }
    }

    fn exchange(&mut self, name: &'static str, apdu: ApduCommand) -> Result<Bytes> {
        let command = Command::new(name, apdu.encode()?);
        self.adapter.send(self.transport.as_mut(), &command, None)
    }
}

impl CommandSet for MifareClassicCommands {
    fn chip_type(&self) -> ChipType {
        self.chip_type
    }

    fn uid(&mut self) -> Result<Bytes> {
        self.exchange("GetUid", ApduCommand::new(0xFF, 0xCA, 0x00, 0x00).with_le(0x00))
    }

    fn read_block(&mut self, block: u8) -> Result<Bytes> {
        let data = self.exchange(
            "ReadBlock",
            ApduCommand::new(0xFF, 0xB0, 0x00, block).with_le(BLOCK_SIZE as u8),
        )?;
        if data.len() != BLOCK_SIZE {
            return Err(Error::InvalidResponse {
                command: "ReadBlock",
                reason: format!("expected {BLOCK_SIZE} data bytes, got {}", data.len()),
            });
        }
        Ok(data)
    }

    fn write_block(&mut self, block: u8, data: &[u8]) -> Result<()> {
        if data.len() != BLOCK_SIZE {
            return Err(cardlink_types::Error::Validation(format!(
                "block data must be {BLOCK_SIZE} bytes, got {}",
                data.len()
            ))
            .into());
        }
        self.exchange(
            "WriteBlock",
            ApduCommand::new(0xFF, 0xD6, 0x00, block).with_data(Bytes::copy_from_slice(data)),
        )?;
        Ok(())
    }

    fn authenticate(&mut self, block: u8, key_type: KeyType, key: &AuthKey) -> Result<()> {
        // Volatile key slot 0, then general authenticate against it.
        self.exchange(
            "LoadKey",
            ApduCommand::new(0xFF, 0x82, 0x00, 0x00)
                .with_data(Bytes::copy_from_slice(key.as_bytes())),
        )?;
        self.exchange(
            "Authenticate",
            ApduCommand::new(0xFF, 0x86, 0x00, 0x00).with_data(Bytes::from(vec![
                0x01,
                0x00,
                block,
                key_type.code(),
                0x00,
            ])),
        )?;
        Ok(())
    }
}

/// Length-prefixed serial badge-reader dialect
///
/// Frames are `[0xAA, 0x55, len, payload…]` outgoing and
/// `[0xAA, 0x55, len, payload…, status]` incoming, one trailing status byte.
pub struct VendorSerialCommands {
    transport: Box<dyn Transport>,
    adapter: CommandAdapter,
    chip_type: ChipType,
}

impl VendorSerialCommands {
    pub const HEADER: [u8; 2] = [0xAA, 0x55];

    const OP_UID: u8 = 0x55;
    const OP_READ: u8 = 0x52;
    const OP_WRITE: u8 = 0x57;

    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            adapter: CommandAdapter::new()
                .with_transform(WireTransform::LengthPrefix {
                    header: Self::HEADER,
                })
                .with_checker(Self::status_table()),
            chip_type: ChipType::GenericTag,
        }
    }

    /// Framing policy matching this dialect, for configuring a transport
    pub fn extractor() -> FrameExtractor {
        FrameExtractor::LengthPrefixed {
            header: Self::HEADER,
            trailer: 1,
        }
    }

    fn status_table() -> StatusChecker {
        use RuleEffect::{Failure, Success};

        let mut checker = StatusChecker::new(StatusWidth::Single);
        checker
            .add_rule(0x00, None, "OK", Success)
            .add_rule(0x01, None, "No tag in field", Failure(StatusCategory::State))
            .add_rule(0x02, None, "Read failed", Failure(StatusCategory::Device))
            .add_rule(0x03, None, "Write failed", Failure(StatusCategory::Memory))
            .add_rule(
                0x04,
                None,
                "Access denied",
                Failure(StatusCategory::Security),
            );
        checker
    }

    fn exchange(&mut self, name: &'static str, payload: Vec<u8>) -> Result<Bytes> {
        let command = Command::new(name, payload);
        self.adapter.send(self.transport.as_mut(), &command, None)
    }
}

impl CommandSet for VendorSerialCommands {
    fn chip_type(&self) -> ChipType {
        self.chip_type
    }

    fn uid(&mut self) -> Result<Bytes> {
        self.exchange("GetUid", vec![Self::OP_UID])
    }

    fn read_block(&mut self, block: u8) -> Result<Bytes> {
        self.exchange("ReadBlock", vec![Self::OP_READ, block])
    }

    fn write_block(&mut self, block: u8, data: &[u8]) -> Result<()> {
        let mut payload = vec![Self::OP_WRITE, block];
        payload.extend_from_slice(data);
        self.exchange("WriteBlock", payload)?;
        Ok(())
    }
}
