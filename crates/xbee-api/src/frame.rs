//! API frame representation and the frame builder.
//!
//! ```text
//! +------+--------+--------+------+------------------+----------+
//! | 0x7E | len_hi | len_lo | type | payload          | checksum |
//! +------+--------+--------+------+------------------+----------+
//!          length = 1 + payload.len()    checksum = 0xFF - sum(type, payload)
//! ```
//!
//! With escaping enabled every byte after the delimiter (length and checksum
//! included) is escaped; the checksum is always computed over the unescaped bytes.

use bytes::BufMut;
use log::trace;

use crate::codec::{encode_u16, put_escaped, Checksum};
use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::types::Escaping;

/// One complete protocol message: a type byte and its type-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    /// Selects how `payload` is interpreted.
    pub frame_type: u8,
    /// Type-specific bytes following the type byte.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a frame.
    pub fn new(frame_type: u8, payload: impl Into<Vec<u8>>) -> Self {
        Frame {
            frame_type,
            payload: payload.into(),
        }
    }

    /// Value of the length field: type byte plus payload.
    pub fn length(&self) -> usize {
        1 + self.payload.len()
    }

    /// Checksum of the type byte and payload.
    pub fn checksum(&self) -> u8 {
        let mut checksum = Checksum::new();
        checksum.add(self.frame_type);
        checksum.add_slice(&self.payload);
        checksum.value()
    }

    /// Encode the frame for the wire.
    pub fn encode(&self, escaping: Escaping) -> ProtocolResult<Vec<u8>> {
        FrameBuilder::new(escaping).build(self.frame_type, &self.payload)
    }

    /// Frame ID byte, for types whose payload starts with one.
    pub fn frame_id(&self) -> Option<u8> {
        match self.frame_type {
            API_TX64_REQUEST
            | API_REMOTE_COMMAND_REQUEST
            | API_AT_COMMAND
            | API_AT_QUEUE_PARAMETER_VALUE
            | API_TX_IPV4
            | API_REMOTE_COMMAND_RESPONSE
            | API_AT_COMMAND_RESPONSE
            | API_TX_STATUS => self.payload.first().copied(),
            _ => None,
        }
    }
}

/// Assembles complete outgoing frames.
///
/// The whole byte sequence is produced before anything is returned, so a rejected
/// build has no observable effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameBuilder {
    escaping: Escaping,
}

impl FrameBuilder {
    /// Create a builder for a connection with the given escaping setting.
    pub const fn new(escaping: Escaping) -> Self {
        FrameBuilder { escaping }
    }

    /// Escaping setting of this builder.
    pub const fn escaping(&self) -> Escaping {
        self.escaping
    }

    /// Build a frame whose payload is only limited by the 16-bit length field.
    pub fn build(&self, frame_type: u8, payload: &[u8]) -> ProtocolResult<Vec<u8>> {
        self.build_with_limit(frame_type, payload, MAX_FRAME_LENGTH - 1)
    }

    /// Build a frame, rejecting payloads longer than `max_payload`.
    pub fn build_with_limit(
        &self,
        frame_type: u8,
        payload: &[u8],
        max_payload: usize,
    ) -> ProtocolResult<Vec<u8>> {
        let max = max_payload.min(MAX_FRAME_LENGTH - 1);
        if payload.len() > max {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload.len(),
                max,
            });
        }

        let length = (1 + payload.len()) as u16;
        let worst_case = 1 + 2 * (2 + 1 + payload.len() + 1);
        let mut buf = Vec::with_capacity(if self.escaping.is_enabled() {
            worst_case
        } else {
            5 + payload.len()
        });

        // Delimiter goes out raw
        buf.put_u8(FRAME_DELIMITER);

        // Length is escaped but not part of the checksum
        for b in encode_u16(length) {
            put_escaped(&mut buf, b, self.escaping);
        }

        let mut checksum = Checksum::new();
        put_escaped(&mut buf, frame_type, self.escaping);
        checksum.add(frame_type);
        for &b in payload {
            put_escaped(&mut buf, b, self.escaping);
            checksum.add(b);
        }
        put_escaped(&mut buf, checksum.value(), self.escaping);

        trace!(
            "built {} frame: length={} checksum=0x{:02X} wire_bytes={}",
            frame_type_name(frame_type),
            length,
            checksum.value(),
            buf.len()
        );

        Ok(buf)
    }

    /// Encode a [`Frame`].
    pub fn encode(&self, frame: &Frame) -> ProtocolResult<Vec<u8>> {
        self.build(frame.frame_type, &frame.payload)
    }
}
