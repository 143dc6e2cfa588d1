//! Chip handle and card-service dispatch
//!
//! A [`Chip`] pairs a chip-family tag with the command set driving it.
//! Services are selected by `(chip kind, service kind)`: an external
//! [`ServiceRegistry`] is consulted first so integrators can override or
//! extend the built-in table, then the built-in constructors apply, else
//! the request yields `None`.

use bytes::Bytes;
use cardlink_core::tlv::Tlv;
use cardlink_types::{AuthKey, ChipType, KeyType, ServiceType};
use tracing::debug;

use crate::commands::CommandSet;
use crate::error::Result;

pub struct Chip {
    chip_type: ChipType,
    command_set: Box<dyn CommandSet>,
}

impl Chip {
    /// The chip tag is taken from the command set serving it
    pub fn new(command_set: Box<dyn CommandSet>) -> Self {
        Self {
            chip_type: command_set.chip_type(),
            command_set,
        }
    }

    pub fn chip_type(&self) -> ChipType {
        self.chip_type
    }

    /// Direct access to the low-level operations
    pub fn command_set(&mut self) -> &mut dyn CommandSet {
        self.command_set.as_mut()
    }

    /// Resolve a service from the built-in table only
    pub fn get_service(&mut self, service: ServiceType) -> Option<CardService<'_>> {
        let chip_type = self.chip_type;
        builtin_service(chip_type, service, self.command_set.as_mut())
    }

    /// Resolve a service, letting `registry` override the built-in table
    pub fn get_service_with<'a>(
        &'a mut self,
        registry: &dyn ServiceRegistry,
        service: ServiceType,
    ) -> Option<CardService<'a>> {
        let chip_type = self.chip_type;
        // Reborrow through a raw pointer: NLL rejects returning a borrow from
        // one branch and reusing it in the other, even though the two mutable
        // borrows never coexist (Polonius accepts the direct form).
        let set: *mut dyn CommandSet = self.command_set.as_mut();
        if let Some(found) = registry.create(chip_type, service, unsafe { &mut *set }) {
            debug!(%chip_type, %service, "Service resolved by registry");
            return Some(found);
        }
        builtin_service(chip_type, service, unsafe { &mut *set })
    }
}

/// External override point for service construction
///
/// `create` returning `None` means "no opinion"; resolution falls through
/// to the built-in table.
pub trait ServiceRegistry {
    fn create<'a>(
        &self,
        chip_type: ChipType,
        service: ServiceType,
        set: &'a mut dyn CommandSet,
    ) -> Option<CardService<'a>>;
}

fn builtin_service(
    chip_type: ChipType,
    service: ServiceType,
    set: &mut dyn CommandSet,
) -> Option<CardService<'_>> {
    match (chip_type, service) {
        // Every identified medium can report its UID.
        (_, ServiceType::Identity) => Some(CardService::Identity(IdentityService { set })),
        (
            ChipType::MifareClassic1K | ChipType::MifareClassic4K | ChipType::GenericTag,
            ServiceType::Storage,
        ) => Some(CardService::Storage(StorageService { set })),
        (ChipType::GenericTag, ServiceType::NfcTag) => {
            Some(CardService::NfcTag(NfcTagService { set }))
        }
        _ => None,
    }
}

/// A resolved high-level service, borrowing the chip's command set
pub enum CardService<'a> {
    Identity(IdentityService<'a>),
    Storage(StorageService<'a>),
    NfcTag(NfcTagService<'a>),
}

impl CardService<'_> {
    pub fn service_type(&self) -> ServiceType {
        match self {
            Self::Identity(_) => ServiceType::Identity,
            Self::Storage(_) => ServiceType::Storage,
            Self::NfcTag(_) => ServiceType::NfcTag,
        }
    }
}

/// Card identity read-out
pub struct IdentityService<'a> {
    set: &'a mut dyn CommandSet,
}

impl IdentityService<'_> {
    pub fn uid(&mut self) -> Result<Bytes> {
        self.set.uid()
    }
}

/// Block-oriented storage access
pub struct StorageService<'a> {
    set: &'a mut dyn CommandSet,
}

impl StorageService<'_> {
    pub fn authenticate(&mut self, block: u8, key_type: KeyType, key: &AuthKey) -> Result<()> {
        self.set.authenticate(block, key_type, key)
    }

    pub fn read_block(&mut self, block: u8) -> Result<Bytes> {
        self.set.read_block(block)
    }

    pub fn write_block(&mut self, block: u8, data: &[u8]) -> Result<()> {
        self.set.write_block(block, data)
    }
}

/// NDEF-style tag access: the data area is a run of TLV records
pub struct NfcTagService<'a> {
    set: &'a mut dyn CommandSet,
}

impl NfcTagService<'_> {
    /// First user-data block of the tag layout
    const DATA_START: u8 = 0x04;

    /// Read `blocks` consecutive blocks and decode the TLV records found
    ///
    /// A trailing partial record (the run usually ends mid-padding) is
    /// dropped, not an error.
    pub fn read_records(&mut self, blocks: u8) -> Result<Vec<Tlv>> {
        let mut area = Vec::new();
        for offset in 0..blocks {
            let block = self.set.read_block(Self::DATA_START + offset)?;
            area.extend_from_slice(&block);
        }
        let (records, _) = Tlv::decode_all(&area, false)?;
        Ok(records)
    }
}
