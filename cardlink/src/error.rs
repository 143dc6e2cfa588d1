//! High-level error types
//!
//! Every command failure names the logical command and carries the raw
//! status bytes, so a caller can log a useful line without re-reading the
//! transport diagnostics.

use cardlink_core::status::StatusCategory;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] cardlink_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] cardlink_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] cardlink_types::Error),

    /// The reader answered with an empty frame where data was required
    #[error("No response to {command}")]
    NoResponse { command: &'static str },

    /// The reader refused the command with a mapped status code
    #[error("{command} refused ({category}): {message} [{}]", hex::encode(.code))]
    KnownFailure {
        command: &'static str,
        category: StatusCategory,
        message: &'static str,
        code: Vec<u8>,
    },

    /// Status bytes present but not in the rule table
    #[error("{command} failed with unrecognized status [{}]", hex::encode(.code))]
    UnknownFailure {
        command: &'static str,
        code: Vec<u8>,
    },

    #[error("Operation not supported: {0}")]
    NotSupported(&'static str),

    #[error("Invalid response to {command}: {reason}")]
    InvalidResponse {
        command: &'static str,
        reason: String,
    },
}
