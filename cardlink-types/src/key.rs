//! Authentication keys for memory cards

use std::fmt;

use crate::error::{Error, Result};

/// MIFARE Classic key slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    KeyA,
    KeyB,
}

impl KeyType {
    /// Key code byte used by reader authenticate commands
    pub fn code(&self) -> u8 {
        match self {
            Self::KeyA => 0x60,
            Self::KeyB => 0x61,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyA => f.write_str("Key A"),
            Self::KeyB => f.write_str("Key B"),
        }
    }
}

/// Six-byte sector key
///
/// Defaults to the factory transport key (all FF).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AuthKey {
    bytes: [u8; 6],
}

impl AuthKey {
    pub fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    /// Build from a slice, validating the length
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 6] = bytes
            .try_into()
            .map_err(|_| Error::Validation(format!("key must be 6 bytes, got {}", bytes.len())))?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.bytes
    }
}

impl Default for AuthKey {
    fn default() -> Self {
        Self { bytes: [0xFF; 6] }
    }
}

// Key material stays out of logs; only the length is shown.
impl fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthKey(6 bytes)")
    }
}
