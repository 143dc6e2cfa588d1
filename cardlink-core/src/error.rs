//! Error types for cardlink-core



/// Result type alias for core codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core codec and framing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Input ended before a complete record
    #[error("Truncated input: expected at least {expected} bytes, got {actual} bytes")]
    Truncated {
        expected: usize,
        actual: usize,
    },

    /// A TLV value (or APDU data field) does not fit in a one-byte length
    #[error("Value too large for a one-byte length: {size} bytes (max: 255)")]
    ValueTooLarge {
        size: usize,
    },

    /// An OID needs at least two components to encode
    #[error("OID too short: {components} component(s), need at least 2")]
    OidTooShort {
        components: usize,
    },

    /// OID component out of range or unparseable
    #[error("Invalid OID: {0}")]
    InvalidOid(String),

    /// A reply does not match the expected delimiter/length/checksum shape
    #[error("Invalid framing ({reason}): {}", hex::encode(.bytes))]
    InvalidFraming {
        reason: &'static str,
        bytes: Vec<u8>,
    },
}
