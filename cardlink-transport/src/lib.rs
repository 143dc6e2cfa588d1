//! Transport layer for card and badge readers
//!
//! A [`Transport`] owns one physical connection and moves raw bytes. Stream
//! transports (serial lines, TCP readers) carry a [`FrameExtractor`] so that
//! `receive` returns exactly one complete reply frame no matter how the wire
//! chunks delivery.
//!
//! The stack is synchronous by design: one logical command occupies the
//! calling thread until its reply is framed or the timeout expires.
//! Concurrent calls through the same transport must be serialized by the
//! caller; distinct transports are independent.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Error, Result};
pub use stream::StreamTransport;
pub use tcp::TcpTransport;

use std::time::Duration;

use bytes::Bytes;

/// Timeout configuration shared by the transports of one process
///
/// Callers pass `None` as a per-call timeout to mean "use the configured
/// default"; the sentinel is resolved at the receive boundary, never read
/// from a hidden global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Applied when a caller passes `None` to `receive`/`send_command`
    pub default_timeout: Duration,

    /// Limit on establishing the physical connection
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(3),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl TransportConfig {
    /// Resolve a per-call timeout against the configured default
    pub fn resolve(&self, timeout: Option<Duration>) -> Duration {
        timeout.unwrap_or(self.default_timeout)
    }
}

/// Transport trait for the physical reader bindings
///
/// Implementations track the last request and last received reply for
/// diagnostics; both are overwritten on each call, never accumulated.
pub trait Transport {
    /// Open the physical connection
    fn connect(&mut self) -> Result<()>;

    /// Close the physical connection
    fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send raw bytes
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive one reply, blocking up to the resolved timeout
    ///
    /// Expiry reports [`Error::Timeout`], never a short frame.
    fn receive(&mut self, timeout: Option<Duration>) -> Result<Bytes>;

    /// Human-readable endpoint name for logs
    fn name(&self) -> String;

    /// Bytes of the most recent request
    fn last_request(&self) -> &[u8];

    /// Bytes of the most recent successfully received reply
    fn last_response(&self) -> &[u8];

    /// Connect if needed, then send and receive as one exchange
    fn send_command(&mut self, data: &[u8], timeout: Option<Duration>) -> Result<Bytes> {
        if !self.is_connected() {
            self.connect()?;
        }
        self.send(data)?;
        self.receive(timeout)
    }
}
