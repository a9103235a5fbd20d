//! Byte-level primitives shared by the frame builder and parser.
//!
//! - Escaping: when enabled, [`FRAME_DELIMITER`], [`ESCAPE`], [`XON`] and [`XOFF`]
//!   are sent as `ESCAPE, byte ^ 0x20`.
//! - Checksum: `0xFF` minus the sum of the type and payload bytes, computed over the
//!   logical bytes before escaping.
//! - Integers are big-endian.

use bytes::BufMut;

use crate::constants::*;
use crate::types::Escaping;

/// Decides whether a byte must be escaped when escaping is enabled.
pub const fn must_escape(byte: u8) -> bool {
    matches!(byte, FRAME_DELIMITER | ESCAPE | XON | XOFF)
}

/// One logical byte as it appears on the wire: one byte, or an escape pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedByte {
    bytes: [u8; 2],
    len: usize,
}

impl EncodedByte {
    /// The wire bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Encode a single byte, escaping it if required.
pub const fn encode_escaped(byte: u8, escaping: Escaping) -> EncodedByte {
    if escaping.is_enabled() && must_escape(byte) {
        EncodedByte {
            bytes: [ESCAPE, byte ^ ESCAPE_MASK],
            len: 2,
        }
    } else {
        EncodedByte {
            bytes: [byte, 0],
            len: 1,
        }
    }
}

/// Write a byte into `buf`, escaping it if required.
pub fn put_escaped<B: BufMut>(buf: &mut B, byte: u8, escaping: Escaping) {
    buf.put_slice(encode_escaped(byte, escaping).as_slice());
}

/// Escape every reserved byte of a sequence.
pub fn escape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 8);
    for &b in data {
        put_escaped(&mut out, b, Escaping::Enabled);
    }
    out
}

/// Reverse [`escape`]. A trailing escape byte with nothing after it is dropped.
pub fn unescape(data: &[u8]) -> Vec<u8> {
    let mut unescaper = Unescaper::new();
    data.iter().filter_map(|&b| unescaper.push(b)).collect()
}

/// Incremental unescaper.
///
/// Remembers a consumed escape byte between calls, so an escape pair split across
/// two deliveries still yields the right logical byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unescaper {
    pending: bool,
}

impl Unescaper {
    /// Create an unescaper with no pending escape.
    pub const fn new() -> Self {
        Unescaper { pending: false }
    }

    /// Consume one raw byte. Returns the logical byte, or None if the raw byte was
    /// an escape marker.
    pub fn push(&mut self, raw: u8) -> Option<u8> {
        if self.pending {
            self.pending = false;
            Some(raw ^ ESCAPE_MASK)
        } else if raw == ESCAPE {
            self.pending = true;
            None
        } else {
            Some(raw)
        }
    }

    /// Whether an escape byte was consumed and its partner has not arrived yet.
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Forget a pending escape.
    pub fn reset(&mut self) {
        self.pending = false;
    }
}

/// Running checksum accumulator: starts at `0xFF`, each byte is subtracted.
///
/// When encoding, [`Checksum::value`] after the last payload byte is the checksum
/// to send. When decoding, [`Checksum::verify`] checks the received byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checksum(u8);

impl Default for Checksum {
    fn default() -> Self {
        Self::new()
    }
}

impl Checksum {
    /// Create an accumulator seeded with `0xFF`.
    pub const fn new() -> Self {
        Checksum(CHECKSUM_SEED)
    }

    /// Apply a byte.
    pub fn add(&mut self, byte: u8) {
        self.0 = self.0.wrapping_sub(byte);
    }

    /// Apply every byte of a slice.
    pub fn add_slice(&mut self, data: &[u8]) {
        for &b in data {
            self.add(b);
        }
    }

    /// Current accumulator value.
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Whether `received` is the right checksum for the bytes applied so far.
    pub const fn verify(&self, received: u8) -> bool {
        self.0.wrapping_sub(received) == 0
    }

    /// Checksum of a complete type + payload sequence.
    pub fn compute(data: &[u8]) -> u8 {
        let mut checksum = Checksum::new();
        checksum.add_slice(data);
        checksum.value()
    }
}

/// Big-endian 16-bit encoding (lengths, network addresses, ports).
pub const fn encode_u16(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Big-endian 64-bit encoding (module addresses).
pub const fn encode_u64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}
