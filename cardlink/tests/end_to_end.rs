//! Full-stack exchange: command set → adapter → framed transport

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::time::Duration;

use cardlink::commands::CommandSet;
use cardlink::VendorSerialCommands;
use cardlink_transport::{StreamTransport, TransportConfig};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Byte stream that answers each write with pre-scripted read chunks
struct ScriptedStream {
    chunks: VecDeque<Vec<u8>>,
}

impl ScriptedStream {
    fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.chunks.pop_front() {
            Some(chunk) => {
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            }
            None => Err(io::Error::new(ErrorKind::WouldBlock, "drained")),
        }
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn read_block_10(reply_chunks: Vec<Vec<u8>>) -> Vec<u8> {
    let transport = StreamTransport::new(ScriptedStream::new(reply_chunks), "scripted")
        .with_config(TransportConfig {
            default_timeout: Duration::from_millis(200),
            connect_timeout: Duration::from_millis(200),
        })
        .with_extractor(VendorSerialCommands::extractor());

    let mut set = VendorSerialCommands::new(Box::new(transport));
    set.read_block(10).unwrap().to_vec()
}

#[test]
fn test_read_block_over_two_chunks() {
    init_logging();

    // Reply frame [AA 55 03 D0 D1 D2 00] arrives split mid-payload.
    let data = read_block_10(vec![
        vec![0xAA, 0x55, 0x03, 0xD0],
        vec![0xD1, 0xD2, 0x00],
    ]);
    assert_eq!(data, vec![0xD0, 0xD1, 0xD2]);
}

#[test]
fn test_chunking_is_invisible() {
    init_logging();

    let single = read_block_10(vec![vec![0xAA, 0x55, 0x03, 0xD0, 0xD1, 0xD2, 0x00]]);
    let split = read_block_10(vec![
        vec![0xAA, 0x55, 0x03, 0xD0],
        vec![0xD1, 0xD2, 0x00],
    ]);
    assert_eq!(single, split);
}

#[test]
fn test_refusal_surfaces_command_name() {
    init_logging();

    // Empty payload, status 0x01: no tag in the field.
    let transport = StreamTransport::new(
        ScriptedStream::new(vec![vec![0xAA, 0x55, 0x00, 0x01]]),
        "scripted",
    )
    .with_config(TransportConfig {
        default_timeout: Duration::from_millis(200),
        connect_timeout: Duration::from_millis(200),
    })
    .with_extractor(VendorSerialCommands::extractor());

    let mut set = VendorSerialCommands::new(Box::new(transport));
    let err = set.read_block(10).unwrap_err();
    assert_eq!(
        err.to_string(),
        "ReadBlock refused (state): No tag in field [01]"
    );
}
