//! # cardlink-core
//!
//! Protocol primitives for talking to card and badge readers:
//! - TLV encoding/decoding (APDU data objects, NDEF headers)
//! - ASN.1 OID encoding
//! - ISO 7816 APDU framing
//! - Frame reassembly policies over streaming transports
//! - Table-driven status code checking
//! - Checksum helpers (XOR, CRC-16/KERMIT)

pub mod apdu;
pub mod checksum;
pub mod error;
pub mod framing;
pub mod oid;
pub mod status;
pub mod tlv;

pub use apdu::{ApduCommand, ApduResponse};
pub use error::{Error, Result};
pub use framing::{Accumulator, FrameExtractor};
pub use status::{StatusChecker, StatusOutcome};
pub use tlv::Tlv;
