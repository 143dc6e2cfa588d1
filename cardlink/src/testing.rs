//! In-memory transport double for unit tests

use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use cardlink_transport::{Error as TransportError, Result as TransportResult, Transport};

/// Serves one scripted reply per exchange and records what was sent
pub struct ScriptedTransport {
    replies: VecDeque<Bytes>,
    pub sent: Vec<Vec<u8>>,
    connected: bool,
    last_request: Vec<u8>,
    last_response: Vec<u8>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Vec<u8>>) -> Self {
        Self {
            replies: replies.into_iter().map(Bytes::from).collect(),
            sent: Vec::new(),
            connected: false,
            last_request: Vec::new(),
            last_response: Vec::new(),
        }
    }
}

impl Transport for ScriptedTransport {
    fn connect(&mut self) -> TransportResult<()> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> TransportResult<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, data: &[u8]) -> TransportResult<()> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.sent.push(data.to_vec());
        self.last_request = data.to_vec();
        Ok(())
    }

    fn receive(&mut self, _timeout: Option<Duration>) -> TransportResult<Bytes> {
        match self.replies.pop_front() {
            Some(reply) => {
                self.last_response = reply.to_vec();
                Ok(reply)
            }
            None => Err(TransportError::Timeout { millis: 0 }),
        }
    }

    fn name(&self) -> String {
        "scripted".into()
    }

    fn last_request(&self) -> &[u8] {
        &self.last_request
    }

    fn last_response(&self) -> &[u8] {
        &self.last_response
    }
}
