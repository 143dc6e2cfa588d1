//! Transport over any byte stream
//!
//! Wraps an already-open `Read + Write` handle (a serial port handle, a
//! Unix socket, a test double) in the [`Transport`] contract. The handle is
//! expected to be in non-blocking or short-timeout mode; `WouldBlock` and
//! `TimedOut` reads mean "no data yet" and are polled against the deadline.

use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use cardlink_core::framing::{Accumulator, FrameExtractor};
use tracing::trace;

use crate::error::{Error, Result};
use crate::{Transport, TransportConfig};

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Transport over a pre-opened byte stream
///
/// The stream starts connected; `disconnect` retires it for good since a
/// generic handle cannot be reopened.
pub struct StreamTransport<S> {
    stream: S,
    label: String,
    connected: bool,
    config: TransportConfig,
    extractor: Option<FrameExtractor>,
    accumulator: Accumulator,
    last_request: Vec<u8>,
    last_response: Vec<u8>,
}

impl<S: Read + Write> StreamTransport<S> {
    /// Wrap an open stream; `label` names the endpoint in logs
    pub fn new(stream: S, label: impl Into<String>) -> Self {
        Self {
            stream,
            label: label.into(),
            connected: true,
            config: TransportConfig::default(),
            extractor: None,
            accumulator: Accumulator::new(),
            last_request: Vec::new(),
            last_response: Vec::new(),
        }
    }

    /// Set the timeout configuration
    pub fn with_config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the framing policy applied to incoming bytes
    pub fn with_extractor(mut self, extractor: FrameExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }
}

impl<S: Read + Write> Transport for StreamTransport<S> {
    fn connect(&mut self) -> Result<()> {
        if !self.connected {
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        trace!(data = %hex::encode(data), "TX");
        self.stream.write_all(data)?;
        self.stream.flush()?;

        self.last_request = data.to_vec();
        Ok(())
    }

    fn receive(&mut self, timeout: Option<Duration>) -> Result<Bytes> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let timeout = self.config.resolve(timeout);
        let deadline = Instant::now() + timeout;
        let mut scratch = [0u8; 1024];

        loop {
            if let Some(extractor) = &self.extractor {
                if let Some(frame) = extractor.try_extract(&mut self.accumulator) {
                    self.last_response = frame.to_vec();
                    return Ok(frame);
                }
            }

            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    millis: timeout.as_millis() as u64,
                });
            }

            match self.stream.read(&mut scratch) {
                Ok(0) => return Err(Error::ConnectionClosed),
                Ok(n) => {
                    trace!(data = %hex::encode(&scratch[..n]), "RX");
                    match &self.extractor {
                        Some(_) => self.accumulator.extend(&scratch[..n]),
                        None => {
                            let reply = Bytes::copy_from_slice(&scratch[..n]);
                            self.last_response = reply.to_vec();
                            return Ok(reply);
                        }
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    fn name(&self) -> String {
        self.label.clone()
    }

    fn last_request(&self) -> &[u8] {
        &self.last_request
    }

    fn last_response(&self) -> &[u8] {
        &self.last_response
    }
}
