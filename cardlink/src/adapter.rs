//! Command adapter: logical payloads to vendor wire dialects
//!
//! A [`CommandAdapter`] is an ordered list of [`WireTransform`] steps plus an
//! optional status checker. Outgoing payloads pass through the transforms in
//! order; replies pass back through them in reverse. A dialect is described
//! by listing its steps, not by subclassing anything, so two readers that
//! share a checksum share the step.

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use cardlink_core::checksum;
use cardlink_core::status::{StatusChecker, StatusOutcome};
use cardlink_transport::Transport;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// One logical command; the name feeds diagnostics only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: &'static str,
    pub payload: Bytes,
}

impl Command {
    pub fn new(name: &'static str, payload: impl Into<Bytes>) -> Self {
        Self {
            name,
            payload: payload.into(),
        }
    }
}

/// One framing step of a wire dialect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireTransform {
    /// Wrap in start/end marker bytes; verify and strip on the way back
    Bracket { start: u8, end: u8 },

    /// `[H1, H2, len, payload…]`; the answer side verifies the header and
    /// that the frame holds at least the declared length
    LengthPrefix { header: [u8; 2] },

    /// Trailing XOR byte over the preceding bytes
    XorChecksum,

    /// Trailing little-endian CRC-16/KERMIT over the preceding bytes
    CrcKermit,
}

impl WireTransform {
    /// Apply the step to an outgoing payload
    fn adapt(&self, data: &[u8]) -> Result<Bytes> {
        let mut out = BytesMut::with_capacity(data.len() + 4);
        match self {
            Self::Bracket { start, end } => {
                out.put_u8(*start);
                out.put_slice(data);
                out.put_u8(*end);
            }
            Self::LengthPrefix { header } => {
                if data.len() > u8::MAX as usize {
                    return Err(cardlink_core::Error::ValueTooLarge { size: data.len() }.into());
                }
                out.put_slice(header);
                out.put_u8(data.len() as u8);
                out.put_slice(data);
            }
            Self::XorChecksum => {
                out.put_slice(data);
                out.put_u8(checksum::xor(data));
            }
            Self::CrcKermit => {
                out.put_slice(data);
                out.put_u16_le(checksum::crc16_kermit(data));
            }
        }
        Ok(out.freeze())
    }

    /// Undo the step on an incoming reply
    ///
    /// Any mismatch reports the whole offending frame; partial data never
    /// leaks upward.
    fn unadapt(&self, data: &[u8]) -> Result<Bytes> {
        let fail = |reason: &'static str| -> Error {
            cardlink_core::Error::InvalidFraming {
                reason,
                bytes: data.to_vec(),
            }
            .into()
        };

        match self {
            Self::Bracket { start, end } => {
                if data.len() < 2 {
                    return Err(fail("reply shorter than bracket markers"));
                }
                if data[0] != *start || data[data.len() - 1] != *end {
                    return Err(fail("bracket markers missing"));
                }
                Ok(Bytes::copy_from_slice(&data[1..data.len() - 1]))
            }
            Self::LengthPrefix { header } => {
                if data.len() < 3 {
                    return Err(fail("reply shorter than length header"));
                }
                if &data[..2] != header {
                    return Err(fail("header mismatch"));
                }
                let declared = data[2] as usize;
                if data.len() < 3 + declared {
                    return Err(fail("declared length exceeds frame"));
                }
                // Bytes past the declared length (a trailing status byte)
                // stay in place for the checker.
                Ok(Bytes::copy_from_slice(&data[3..]))
            }
            Self::XorChecksum => {
                if data.is_empty() {
                    return Err(fail("reply missing checksum byte"));
                }
                if checksum::xor(data) != 0x00 {
                    return Err(fail("checksum mismatch"));
                }
                Ok(Bytes::copy_from_slice(&data[..data.len() - 1]))
            }
            Self::CrcKermit => {
                if data.len() < 2 {
                    return Err(fail("reply shorter than CRC"));
                }
                let body = &data[..data.len() - 2];
                let expected = checksum::crc16_kermit(body).to_le_bytes();
                if data[data.len() - 2..] != expected {
                    return Err(fail("CRC mismatch"));
                }
                Ok(Bytes::copy_from_slice(body))
            }
        }
    }
}

/// Ordered wire-dialect description for one reader family
#[derive(Debug, Clone, Default)]
pub struct CommandAdapter {
    transforms: Vec<WireTransform>,
    checker: Option<StatusChecker>,
}

impl CommandAdapter {
    /// Identity adapter: payload is the frame, no status checking
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transform; outgoing order is insertion order
    pub fn with_transform(mut self, transform: WireTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Set the status checker applied after un-adaptation
    pub fn with_checker(mut self, checker: StatusChecker) -> Self {
        self.checker = Some(checker);
        self
    }

    /// Build the wire frame for one payload
    pub fn adapt_command(&self, payload: &[u8]) -> Result<Bytes> {
        let mut data = Bytes::copy_from_slice(payload);
        for transform in &self.transforms {
            data = transform.adapt(&data)?;
        }
        Ok(data)
    }

    /// Strip the dialect framing from a reply, reverse order
    pub fn adapt_answer(&self, reply: &[u8]) -> Result<Bytes> {
        let mut data = Bytes::copy_from_slice(reply);
        for transform in self.transforms.iter().rev() {
            data = transform.unadapt(&data)?;
        }
        Ok(data)
    }

    /// Run one full exchange through a borrowed transport
    ///
    /// Success strips the status trailer and returns the remaining data
    /// bytes; a mapped refusal or unknown code becomes a typed error naming
    /// the command.
    pub fn send(
        &self,
        transport: &mut dyn Transport,
        command: &Command,
        timeout: Option<Duration>,
    ) -> Result<Bytes> {
        let wire = self.adapt_command(&command.payload)?;
        debug!(command = command.name, transport = %transport.name(), "Executing command");

        let raw = transport.send_command(&wire, timeout)?;
        let reply = self.adapt_answer(&raw)?;
        trace!(command = command.name, reply = %hex::encode(&reply), "Reply");

        let checker = match &self.checker {
            Some(checker) => checker,
            None => return Ok(reply),
        };

        if reply.is_empty() {
            if checker.allow_empty_result() {
                return Ok(reply);
            }
            return Err(Error::NoResponse {
                command: command.name,
            });
        }

        match checker.check(&reply) {
            StatusOutcome::Success => {
                let data_len = reply.len() - checker.width().len();
                Ok(reply.slice(..data_len))
            }
            StatusOutcome::KnownFailure {
                category,
                message,
                code,
            } => Err(Error::KnownFailure {
                command: command.name,
                category,
                message,
                code: code.bytes(),
            }),
            StatusOutcome::UnknownFailure { code } => Err(Error::UnknownFailure {
                command: command.name,
                code: code.bytes(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardlink_core::status::{RuleEffect, StatusCategory, StatusWidth};
    use pretty_assertions::assert_eq;

    use crate::testing::ScriptedTransport;

    fn single_byte_checker() -> StatusChecker {
        let mut checker = StatusChecker::new(StatusWidth::Single);
        checker
            .add_rule(0x00, None, "OK", RuleEffect::Success)
            .add_rule(
                0x01,
                None,
                "No tag in field",
                RuleEffect::Failure(StatusCategory::State),
            );
        checker
    }

    #[test]
    fn test_bracket_round_trip() {
        let adapter = CommandAdapter::new().with_transform(WireTransform::Bracket {
            start: 0x02,
            end: 0x03,
        });

        let wire = adapter.adapt_command(&[0x41, 0x42]).unwrap();
        assert_eq!(wire.as_ref(), &[0x02, 0x41, 0x42, 0x03]);
        assert_eq!(
            adapter.adapt_answer(&wire).unwrap().as_ref(),
            &[0x41, 0x42]
        );
    }

    #[test]
    fn test_transform_order_reverses_on_answers() {
        // Outgoing: checksum inside, brackets outside.
        let adapter = CommandAdapter::new()
            .with_transform(WireTransform::XorChecksum)
            .with_transform(WireTransform::Bracket {
                start: 0x02,
                end: 0x03,
            });

        let wire = adapter.adapt_command(&[0x10, 0x20]).unwrap();
        assert_eq!(wire.as_ref(), &[0x02, 0x10, 0x20, 0x30, 0x03]);
        assert_eq!(adapter.adapt_answer(&wire).unwrap().as_ref(), &[0x10, 0x20]);
    }

    #[test]
    fn test_length_prefix_keeps_status_trailer() {
        let adapter = CommandAdapter::new().with_transform(WireTransform::LengthPrefix {
            header: [0xAA, 0x55],
        });

        assert_eq!(
            adapter.adapt_command(&[0x52, 0x0A]).unwrap().as_ref(),
            &[0xAA, 0x55, 0x02, 0x52, 0x0A]
        );
        // Reply carries one status byte past the declared length.
        let stripped = adapter
            .adapt_answer(&[0xAA, 0x55, 0x03, 0xD0, 0xD1, 0xD2, 0x00])
            .unwrap();
        assert_eq!(stripped.as_ref(), &[0xD0, 0xD1, 0xD2, 0x00]);
    }

    #[test]
    fn test_bad_checksum_is_invalid_framing() {
        let adapter = CommandAdapter::new().with_transform(WireTransform::XorChecksum);
        let err = adapter.adapt_answer(&[0x10, 0x20, 0xFF]).unwrap_err();
        assert!(matches!(
            err,
            Error::Core(cardlink_core::Error::InvalidFraming { .. })
        ));
    }

    #[test]
    fn test_crc_round_trip_and_mismatch() {
        let adapter = CommandAdapter::new().with_transform(WireTransform::CrcKermit);

        let wire = adapter.adapt_command(b"123456789").unwrap();
        assert_eq!(&wire[9..], &[0x89, 0x21]);
        assert_eq!(adapter.adapt_answer(&wire).unwrap().as_ref(), b"123456789");

        let mut corrupted = wire.to_vec();
        corrupted[0] ^= 0x01;
        assert!(adapter.adapt_answer(&corrupted).is_err());
    }

    #[test]
    fn test_send_strips_status_on_success() {
        let mut transport = ScriptedTransport::new(vec![vec![0xD0, 0xD1, 0x00]]);
        let adapter = CommandAdapter::new().with_checker(single_byte_checker());

        let reply = adapter
            .send(&mut transport, &Command::new("ReadBlock", vec![0x52]), None)
            .unwrap();
        assert_eq!(reply.as_ref(), &[0xD0, 0xD1]);
    }

    #[test]
    fn test_send_maps_known_failure() {
        let mut transport = ScriptedTransport::new(vec![vec![0x01]]);
        let adapter = CommandAdapter::new().with_checker(single_byte_checker());

        let err = adapter
            .send(&mut transport, &Command::new("ReadBlock", vec![0x52]), None)
            .unwrap_err();
        match err {
            Error::KnownFailure {
                command,
                category,
                message,
                code,
            } => {
                assert_eq!(command, "ReadBlock");
                assert_eq!(category, StatusCategory::State);
                assert_eq!(message, "No tag in field");
                assert_eq!(code, vec![0x01]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_send_rejects_empty_reply_by_default() {
        let mut transport = ScriptedTransport::new(vec![vec![]]);
        let adapter = CommandAdapter::new().with_checker(single_byte_checker());

        let err = adapter
            .send(&mut transport, &Command::new("Halt", vec![0x48]), None)
            .unwrap_err();
        assert!(matches!(err, Error::NoResponse { command: "Halt" }));
    }

    #[test]
    fn test_send_allows_empty_reply_when_configured() {
        let mut transport = ScriptedTransport::new(vec![vec![]]);
        let adapter =
            CommandAdapter::new().with_checker(single_byte_checker().with_allow_empty(true));

        let reply = adapter
            .send(&mut transport, &Command::new("Halt", vec![0x48]), None)
            .unwrap();
        assert!(reply.is_empty());
    }
}
