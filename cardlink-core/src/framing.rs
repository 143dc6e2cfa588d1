//! Frame reassembly over streaming transports
//!
//! Serial and socket readers deliver reply bytes in arbitrary chunks. A
//! transport appends everything it reads into an [`Accumulator`] and asks a
//! [`FrameExtractor`] whether a complete frame has arrived yet. Extraction
//! either consumes a contiguous prefix (exactly one frame) or consumes
//! nothing, so partial frames survive across reads regardless of how the
//! wire chunks delivery.
//!
//! Each extractor variant is one vendor framing policy. New reader families
//! add a variant or a configuration value, not a type hierarchy.

use bytes::{Bytes, BytesMut};
use tracing::{trace, warn};

/// Carriage return, stripped by line-oriented policies
const CR: u8 = 0x0D;

/// Line feed, stripped when it follows a CR
const LF: u8 = 0x0A;

/// Append-only byte buffer fed by a transport
///
/// Bytes are never reordered; an extractor removes a contiguous prefix on
/// success and otherwise leaves the buffer untouched.
#[derive(Debug, Default)]
pub struct Accumulator {
    buf: BytesMut,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly received bytes
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Remove and return the first `n` bytes
    pub fn split_to(&mut self, n: usize) -> Bytes {
        self.buf.split_to(n).freeze()
    }

    /// Drop the first `n` bytes
    pub fn advance(&mut self, n: usize) {
        let _ = self.buf.split_to(n);
    }

    /// Discard everything (desynchronization recovery)
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// A vendor framing policy over an [`Accumulator`]
///
/// All variants share two properties: they are idempotent on insufficient
/// data (no frame yet, nothing consumed) and they never scan past a
/// detected terminator looking for a second one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameExtractor {
    /// Frame is everything up to and including a single terminator byte
    Terminated { terminator: u8 },

    /// Frame spans a start byte through an end byte.
    ///
    /// When `short_form` is set and the byte immediately preceding the end
    /// byte equals the marker, the returned frame is one byte shorter (the
    /// end byte is dropped from the frame but still consumed). This is a
    /// pinned hardware quirk; do not generalize it.
    Bracketed {
        start: u8,
        end: u8,
        short_form: Option<u8>,
    },

    /// `[H1, H2, len, payload…, trailer…]` with two fixed header bytes and
    /// a one-byte payload length at offset 2.
    ///
    /// A header mismatch discards the whole accumulator: a corrupted stream
    /// is not resynchronized byte-by-byte, the reader waits for a fresh
    /// frame instead.
    LengthPrefixed { header: [u8; 2], trailer: usize },

    /// Strip leading CR/optional-LF pairs, then bracketed start..=end.
    ///
    /// Some readers prepend stray line endings before a real frame.
    LineStrippedBracketed { start: u8, end: u8 },

    /// `[start, len, payload…, crc…, end]` — the end marker must sit at the
    /// offset computed from the length field, which guards against length
    /// bytes corrupted into nonsense.
    CrcBracketed {
        start: u8,
        end: u8,
        crc_len: usize,
    },
}

impl FrameExtractor {
    /// Try to extract one complete frame from the accumulator
    ///
    /// Returns `None` while no full frame has arrived, consuming nothing
    /// (except the documented strip/discard behaviors of the individual
    /// policies).
    pub fn try_extract(&self, acc: &mut Accumulator) -> Option<Bytes> {
        let frame = match *self {
            Self::Terminated { terminator } => extract_terminated(acc, terminator),
            Self::Bracketed {
                start,
                end,
                short_form,
            } => extract_bracketed(acc, start, end, short_form),
            Self::LengthPrefixed { header, trailer } => {
                extract_length_prefixed(acc, header, trailer)
            }
            Self::LineStrippedBracketed { start, end } => {
                strip_line_endings(acc);
                extract_bracketed(acc, start, end, None)
            }
            Self::CrcBracketed {
                start,
                end,
                crc_len,
            } => extract_crc_bracketed(acc, start, end, crc_len),
        };

        if let Some(frame) = &frame {
            trace!(
                len = frame.len(),
                frame = %hex::encode(frame),
                "Extracted frame"
            );
        }
        frame
    }
}

fn extract_terminated(acc: &mut Accumulator, terminator: u8) -> Option<Bytes> {
    let pos = acc.as_slice().iter().position(|&b| b == terminator)?;
    Some(acc.split_to(pos + 1))
}

fn extract_bracketed(
    acc: &mut Accumulator,
    start: u8,
    end: u8,
    short_form: Option<u8>,
) -> Option<Bytes> {
    let data = acc.as_slice();
    if data.is_empty() || data[0] != start {
        // A reply that does not open with the start byte never completes;
        // the caller's timeout surfaces the fault.
        return None;
    }

    let pos = data[1..].iter().position(|&b| b == end)? + 1;

    if short_form.is_some_and(|marker| data[pos - 1] == marker) {
        let frame = acc.split_to(pos);
        acc.advance(1); // end byte consumed but not part of the frame
        Some(frame)
    } else {
        Some(acc.split_to(pos + 1))
    }
}

fn extract_length_prefixed(acc: &mut Accumulator, header: [u8; 2], trailer: usize) -> Option<Bytes> {
    let data = acc.as_slice();

    for i in 0..header.len().min(data.len()) {
        if data[i] != header[i] {
            warn!(
                discarded = data.len(),
                buffer = %hex::encode(data),
                "Header mismatch, discarding accumulator to resynchronize"
            );
            acc.clear();
            return None;
        }
    }

    if data.len() < 3 {
        return None;
    }

    let total = 3 + data[2] as usize + trailer;
    if data.len() < total {
        return None;
    }
    Some(acc.split_to(total))
}

fn extract_crc_bracketed(
    acc: &mut Accumulator,
    start: u8,
    end: u8,
    crc_len: usize,
) -> Option<Bytes> {
    let data = acc.as_slice();
    if data.is_empty() || data[0] != start {
        return None;
    }
    if data.len() < 2 {
        return None;
    }

    let end_offset = 2 + data[1] as usize + crc_len;
    if data.len() <= end_offset {
        return None;
    }
    if data[end_offset] != end {
        // Length field noise: the computed terminator slot holds something
        // else, so this cannot be a frame boundary yet.
        return None;
    }
    Some(acc.split_to(end_offset + 1))
}

fn strip_line_endings(acc: &mut Accumulator) {
    loop {
        let data = acc.as_slice();
        if data.first() != Some(&CR) {
            return;
        }
        if data.len() < 2 {
            // Cannot yet tell whether an LF follows the CR.
            return;
        }
        let cut = if data[1] == LF { 2 } else { 1 };
        acc.advance(cut);
    }
}
