//! TCP transport for network-attached readers

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use bytes::Bytes;
use cardlink_core::framing::{Accumulator, FrameExtractor};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::{Transport, TransportConfig};

/// TCP transport
///
/// Without an extractor, `receive` hands back whatever one read returned.
/// With one, incoming bytes accumulate until the framing policy recognizes
/// a complete reply; surplus bytes stay queued for the next call.
pub struct TcpTransport {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
    config: TransportConfig,
    extractor: Option<FrameExtractor>,
    accumulator: Accumulator,
    last_request: Vec<u8>,
    last_response: Vec<u8>,
}

impl TcpTransport {
    /// Create a new TCP transport
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            stream: None,
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

    fn resolve_addr(&self) -> Result<SocketAddr> {
        let target = format!("{}:{}", self.host, self.port);
        target
            .to_socket_addrs()
            .map_err(|e| Error::InvalidAddress(format!("{target}: {e}")))?
            .next()
            .ok_or_else(|| Error::InvalidAddress(target))
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Err(Error::AlreadyConnected);
        }

        let addr = self.resolve_addr()?;
        debug!(%addr, "Connecting to reader");

        let stream = TcpStream::connect_timeout(&addr, self.config.connect_timeout)
            .map_err(|e| match e.kind() {
                ErrorKind::TimedOut | ErrorKind::WouldBlock => Error::ConnectionTimeout,
                _ => Error::Io(e),
            })?;
        stream.set_nodelay(true)?;

        self.stream = Some(stream);
        self.accumulator.clear();
        debug!(%addr, "Connected");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            debug!(host = %self.host, port = self.port, "Disconnected");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!(data = %hex::encode(data), "TX");
        stream.write_all(data)?;
        stream.flush()?;

        self.last_request = data.to_vec();
        Ok(())
    }

    fn receive(&mut self, timeout: Option<Duration>) -> Result<Bytes> {
        let timeout = self.config.resolve(timeout);
        let deadline = Instant::now() + timeout;
        let mut scratch = [0u8; 1024];

        loop {
            // A previous read may already have queued a complete frame.
            if let Some(extractor) = &self.extractor {
                if let Some(frame) = extractor.try_extract(&mut self.accumulator) {
                    self.last_response = frame.to_vec();
                    return Ok(frame);
                }
            }

            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout {
                    millis: timeout.as_millis() as u64,
                });
            }
            stream.set_read_timeout(Some(remaining))?;

            match stream.read(&mut scratch) {
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
                    return Err(Error::Timeout {
                        millis: timeout.as_millis() as u64,
                    });
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    fn name(&self) -> String {
        format!("tcp://{}:{}", self.host, self.port)
    }

    fn last_request(&self) -> &[u8] {
        &self.last_request
    }

    fn last_response(&self) -> &[u8] {
        &self.last_response
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.stream.is_some() {
            warn!(host = %self.host, port = self.port, "Transport dropped while connected");
            let _ = self.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    fn local_transport(port: u16) -> TcpTransport {
        TcpTransport::new("127.0.0.1", port).with_config(TransportConfig {
            default_timeout: Duration::from_millis(100),
            connect_timeout: Duration::from_millis(500),
        })
    }

    #[test]
    fn test_receive_before_connect() {
        let mut transport = local_transport(1);
        assert!(matches!(
            transport.receive(None),
            Err(Error::NotConnected)
        ));
    }

    #[test]
    fn test_send_before_connect() {
        let mut transport = local_transport(1);
        assert!(matches!(transport.send(&[0x00]), Err(Error::NotConnected)));
    }

    #[test]
    fn test_echo_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut peer, _) = listener.accept().unwrap();
            let mut buf = [0u8; 16];
            let n = peer.read(&mut buf).unwrap();
            peer.write_all(&buf[..n]).unwrap();
        });

        let mut transport = local_transport(port);
        let reply = transport
            .send_command(&[0xAA, 0xBB], Some(Duration::from_secs(1)))
            .unwrap();
        assert_eq!(reply.as_ref(), &[0xAA, 0xBB]);
        assert_eq!(transport.last_request(), &[0xAA, 0xBB]);
        assert_eq!(transport.last_response(), &[0xAA, 0xBB]);

        transport.disconnect().unwrap();
        server.join().unwrap();
    }

    #[test]
    fn test_silent_peer_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut transport = local_transport(port);
        transport.connect().unwrap();

        let timeout = Duration::from_millis(50);
        let start = Instant::now();
        let err = transport.receive(Some(timeout)).unwrap_err();
        assert!(start.elapsed() >= timeout);
        assert!(matches!(err, Error::Timeout { millis: 50 }));

        drop(listener);
    }

    #[test]
    fn test_framed_receive_across_chunks() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut peer, _) = listener.accept().unwrap();
            peer.write_all(&[0x02, 0x31]).unwrap();
            peer.flush().unwrap();
            thread::sleep(Duration::from_millis(10));
            peer.write_all(&[0x32, 0x03]).unwrap();
        });

        let mut transport = local_transport(port).with_extractor(FrameExtractor::Bracketed {
            start: 0x02,
            end: 0x03,
            short_form: None,
        });
        transport.connect().unwrap();

        let frame = transport.receive(Some(Duration::from_secs(1))).unwrap();
        assert_eq!(frame.as_ref(), &[0x02, 0x31, 0x32, 0x03]);

        transport.disconnect().unwrap();
        server.join().unwrap();
    }

    #[test]
    fn test_double_connect_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut transport = local_transport(port);
        transport.connect().unwrap();
        assert!(matches!(transport.connect(), Err(Error::AlreadyConnected)));
        transport.disconnect().unwrap();

        drop(listener);
    }
}
