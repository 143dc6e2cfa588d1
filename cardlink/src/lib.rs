//! # cardlink
//!
//! Library for communicating with heterogeneous card and badge readers.
//!
//! Every reader family speaks its own wire dialect (bracket markers, length
//! prefixes, checksums, status trailers), but callers see one logical
//! interface: a command set per chip family, resolved into high-level card
//! services by `(chip kind, service kind)`.
//!
//! ## Quick start
//!
//! ```no_run
//! use cardlink::{Chip, ServiceType, VendorSerialCommands};
//! use cardlink_transport::TcpTransport;
//!
//! fn main() -> cardlink::Result<()> {
//!     // A badge reader on the network, speaking the length-prefixed dialect.
//!     let transport = TcpTransport::new("192.168.1.50", 4000)
//!         .with_extractor(VendorSerialCommands::extractor());
//!
//!     let set = VendorSerialCommands::new(Box::new(transport));
//!     let mut chip = Chip::new(Box::new(set));
//!
//!     let uid = chip.command_set().uid()?;
//!     println!("UID: {}", hex::encode(&uid));
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod chip;
pub mod commands;
pub mod error;

#[cfg(test)]
mod testing;

// Re-exports
pub use adapter::{Command, CommandAdapter, WireTransform};
pub use chip::{CardService, Chip, ServiceRegistry};
pub use commands::{CommandSet, MifareClassicCommands, VendorSerialCommands};
pub use error::{Error, Result};

// Re-export member types
pub use cardlink_core::apdu::{ApduCommand, ApduResponse};
pub use cardlink_core::framing::FrameExtractor;
pub use cardlink_core::status::{StatusChecker, StatusOutcome};
pub use cardlink_core::tlv::Tlv;
pub use cardlink_transport::{Transport, TransportConfig};
pub use cardlink_types::{AuthKey, ChipType, KeyType, ServiceType};
