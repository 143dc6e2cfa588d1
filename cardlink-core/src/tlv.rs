//! Tag-length-value encoding and decoding
//!
//! # Record Structure
//!
//! ```text
//! ┌─────────────┬─────────────┬─────────────┐
//! │     Tag     │   Length    │    Value    │
//! │   1 byte    │   1 byte    │   N bytes   │
//! └─────────────┴─────────────┴─────────────┘
//! ```
//!
//! A value is either raw bytes (leaf) or a concatenation of encoded child
//! records (composite). The length byte always describes the resolved value,
//! so a composite whose children encode to more than 255 bytes cannot be
//! represented and is an encode-time error.
//!
//! This codec underlies APDU data objects, NDEF record headers and the
//! OID encoding in [`crate::oid`].

use bytes::{BufMut, Bytes, BytesMut};
use tracing::warn;

use crate::error::{Error, Result};

/// Maximum resolved value length representable by the one-byte length field
pub const MAX_VALUE_LEN: usize = 255;

/// One TLV record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    /// Tag byte
    pub tag: u8,

    /// Leaf bytes or nested records
    pub value: TlvValue,
}

/// The value side of a TLV record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvValue {
    /// Raw bytes
    Leaf(Bytes),

    /// Nested records, encoded back-to-back
    Children(Vec<Tlv>),
}

impl Tlv {
    /// Create a leaf record
    ///
    /// # Examples
    ///
    /// ```
    /// use cardlink_core::tlv::Tlv;
    ///
    /// let node = Tlv::leaf(0x4F, vec![0xA0, 0x00]);
    /// assert_eq!(node.encode().unwrap().as_ref(), &[0x4F, 0x02, 0xA0, 0x00]);
    /// ```
    pub fn leaf(tag: u8, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: TlvValue::Leaf(value.into()),
        }
    }

    /// Create a composite record from child records
    pub fn composite(tag: u8, children: Vec<Tlv>) -> Self {
        Self {
            tag,
            value: TlvValue::Children(children),
        }
    }

    /// Resolve the value to its wire bytes
    ///
    /// For a leaf this is the raw bytes; for a composite it is the
    /// concatenated encoding of every child.
    pub fn resolved_value(&self) -> Result<Bytes> {
        match &self.value {
            TlvValue::Leaf(bytes) => Ok(bytes.clone()),
            TlvValue::Children(children) => {
                let mut buf = BytesMut::new();
                for child in children {
                    buf.put_slice(&child.encode()?);
                }
                Ok(buf.freeze())
            }
        }
    }

    /// Encode the record to `tag ‖ len ‖ value`
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueTooLarge`] if the resolved value exceeds
    /// 255 bytes.
    pub fn encode(&self) -> Result<Bytes> {
        let value = self.resolved_value()?;
        if value.len() > MAX_VALUE_LEN {
            return Err(Error::ValueTooLarge { size: value.len() });
        }

        let mut buf = BytesMut::with_capacity(2 + value.len());
        buf.put_u8(self.tag);
        buf.put_u8(value.len() as u8);
        buf.put_slice(&value);
        Ok(buf.freeze())
    }

    /// Decode exactly one record from the front of `input`
    ///
    /// Returns the record and the number of bytes consumed. Decoded records
    /// are always leaves; call [`Tlv::decode_all`] on the value to descend
    /// into a composite.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if `input` holds fewer bytes than the
    /// header plus the declared length.
    pub fn decode_one(input: &[u8]) -> Result<(Self, usize)> {
        if input.len() < 2 {
            return Err(Error::Truncated {
                expected: 2,
                actual: input.len(),
            });
        }

        let tag = input[0];
        let len = input[1] as usize;
        let total = 2 + len;
        if input.len() < total {
            return Err(Error::Truncated {
                expected: total,
                actual: input.len(),
            });
        }

        let value = Bytes::copy_from_slice(&input[2..total]);
        Ok((Self::leaf(tag, value), total))
    }

    /// Decode records until `input` is exhausted
    ///
    /// Returns the decoded records and the number of bytes consumed. In
    /// non-strict mode a trailing partial record is dropped and parsing
    /// stops there; in strict mode it is an error.
    pub fn decode_all(input: &[u8], strict: bool) -> Result<(Vec<Self>, usize)> {
        let mut nodes = Vec::new();
        let mut offset = 0;

        while offset < input.len() {
            match Self::decode_one(&input[offset..]) {
                Ok((node, consumed)) => {
                    nodes.push(node);
                    offset += consumed;
                }
                Err(err @ Error::Truncated { .. }) => {
                    if strict {
                        return Err(err);
                    }
                    warn!(
                        offset,
                        remaining = input.len() - offset,
                        "Dropping trailing partial TLV record"
                    );
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        Ok((nodes, offset))
    }
}
