//! Incremental frame parser.
//!
//! Bytes may arrive one at a time across any number of calls; all progress is
//! held in the [`FrameParser`] value. Malformed input never panics and never wedges
//! the parser: the partial frame is dropped and the parser goes back to hunting for
//! a delimiter.
//!
//! ```text
//! AwaitDelimiter --0x7E--> LengthHigh --> LengthLow --> Payload (len bytes) --> Checksum
//!       ^                                    |                                     |
//!       +------- zero / oversize length -----+------ frame emitted or dropped -----+
//! ```
//!
//! Escape handling is orthogonal to the stage: an [`Unescaper`] resolves escape pairs
//! before a logical byte reaches the stage logic.

use bytes::{BufMut, BytesMut};
use log::{debug, trace};

use crate::codec::{Checksum, Unescaper};
use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::frame::Frame;
use crate::types::Escaping;

/// Stage of the parser state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParserStage {
    /// Discarding bytes until a delimiter arrives.
    #[default]
    AwaitDelimiter,
    /// Expecting the high byte of the length.
    LengthHigh,
    /// Expecting the low byte of the length.
    LengthLow,
    /// Reading type and payload bytes.
    Payload,
    /// Expecting the checksum byte.
    Checksum,
}

/// Counters describing what the parser has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    /// Frames decoded successfully.
    pub frames: u64,
    /// Frames dropped because the checksum did not match.
    pub checksum_errors: u64,
    /// Frames dropped because the declared length exceeded the maximum.
    pub oversize: u64,
    /// Frames dropped because the declared length was zero.
    pub empty: u64,
    /// Frames abandoned because a new delimiter arrived (escaped mode only).
    pub interrupted: u64,
    /// Bytes skipped between frames, including repeated delimiters.
    pub discarded_bytes: u64,
}

impl ParserStats {
    /// Total number of frames dropped for any reason.
    pub fn dropped(&self) -> u64 {
        self.checksum_errors + self.oversize + self.empty + self.interrupted
    }
}

/// Suspendable state machine turning a byte stream into validated [`Frame`]s.
///
/// One parser belongs to one connection and must be driven sequentially.
#[derive(Debug, Clone)]
pub struct FrameParser {
    escaping: Escaping,
    max_frame_length: u16,
    stage: ParserStage,
    length: u16,
    remaining: usize,
    checksum: Checksum,
    unescaper: Unescaper,
    buffer: BytesMut,
    stats: ParserStats,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new(Escaping::Disabled)
    }
}

impl FrameParser {
    /// Create a parser with the default maximum frame length.
    pub fn new(escaping: Escaping) -> Self {
        Self::with_max_frame_length(escaping, DEFAULT_MAX_FRAME_LENGTH)
    }

    /// Create a parser rejecting declared lengths above `max_frame_length`.
    pub fn with_max_frame_length(escaping: Escaping, max_frame_length: u16) -> Self {
        FrameParser {
            escaping,
            max_frame_length,
            stage: ParserStage::AwaitDelimiter,
            length: 0,
            remaining: 0,
            checksum: Checksum::new(),
            unescaper: Unescaper::new(),
            buffer: BytesMut::with_capacity(64),
            stats: ParserStats::default(),
        }
    }

    /// Current stage.
    pub fn stage(&self) -> ParserStage {
        self.stage
    }

    /// Escaping setting of this connection.
    pub fn escaping(&self) -> Escaping {
        self.escaping
    }

    /// Configured maximum declared length.
    pub fn max_frame_length(&self) -> u16 {
        self.max_frame_length
    }

    /// Whether the parser is between frames.
    pub fn is_idle(&self) -> bool {
        self.stage == ParserStage::AwaitDelimiter
    }

    /// Counters accumulated since creation.
    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    /// Abandon any partially received frame and wait for the next delimiter.
    pub fn reset(&mut self) {
        if !self.is_idle() {
            debug!(
                "abandoning partial frame in stage {:?} ({} payload bytes)",
                self.stage,
                self.buffer.len()
            );
        }
        self.clear_frame();
        self.stage = ParserStage::AwaitDelimiter;
    }

    fn start_frame(&mut self) {
        self.clear_frame();
        self.stage = ParserStage::LengthHigh;
    }

    fn clear_frame(&mut self) {
        self.length = 0;
        self.remaining = 0;
        self.checksum = Checksum::new();
        self.unescaper.reset();
        self.buffer.clear();
    }

    fn fail(&mut self, err: ProtocolError) -> ProtocolResult<Option<Frame>> {
        match err {
            ProtocolError::ChecksumMismatch { .. } => self.stats.checksum_errors += 1,
            ProtocolError::FrameTooLarge { .. } => self.stats.oversize += 1,
            ProtocolError::EmptyFrame => self.stats.empty += 1,
            _ => {}
        }
        self.reset();
        Err(err)
    }

    /// Advance the state machine by one raw byte.
    ///
    /// Returns `Ok(Some(frame))` when the byte completes a valid frame, `Ok(None)` when
    /// more input is needed, and `Err` when the byte caused the current frame to be
    /// dropped. After an error the parser has already resynchronized.
    pub fn push_byte(&mut self, raw: u8) -> ProtocolResult<Option<Frame>> {
        if self.stage == ParserStage::AwaitDelimiter {
            if raw == FRAME_DELIMITER {
                self.start_frame();
            } else {
                self.stats.discarded_bytes += 1;
            }
            return Ok(None);
        }

        // With escaping on, a raw delimiter can only start a new frame
        if self.escaping.is_enabled() && raw == FRAME_DELIMITER {
            // Repeated delimiter before any frame byte: nothing to abandon
            if self.stage == ParserStage::LengthHigh && !self.unescaper.is_pending() {
                self.stats.discarded_bytes += 1;
                return Ok(None);
            }

            let expected = match self.stage {
                ParserStage::Payload | ParserStage::Checksum => self.length as usize,
                _ => 0,
            };
            let err = ProtocolError::Interrupted {
                received: self.buffer.len(),
                expected,
            };
            self.stats.interrupted += 1;
            debug!("{}", err);
            self.start_frame();
            return Err(err);
        }

        let byte = if self.escaping.is_enabled() {
            match self.unescaper.push(raw) {
                Some(byte) => byte,
                None => return Ok(None),
            }
        } else {
            raw
        };

        match self.stage {
            ParserStage::AwaitDelimiter => Ok(None),

            ParserStage::LengthHigh => {
                self.length = u16::from(byte) << 8;
                self.stage = ParserStage::LengthLow;
                Ok(None)
            }

            ParserStage::LengthLow => {
                self.length |= u16::from(byte);
                if self.length == 0 {
                    return self.fail(ProtocolError::EmptyFrame);
                }
                if self.length > self.max_frame_length {
                    return self.fail(ProtocolError::FrameTooLarge {
                        length: self.length as usize,
                        max: self.max_frame_length as usize,
                    });
                }
                self.remaining = self.length as usize;
                self.buffer.reserve(self.remaining);
                self.stage = ParserStage::Payload;
                Ok(None)
            }

            ParserStage::Payload => {
                self.buffer.put_u8(byte);
                self.checksum.add(byte);
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.stage = ParserStage::Checksum;
                }
                Ok(None)
            }

            ParserStage::Checksum => {
                if !self.checksum.verify(byte) {
                    return self.fail(ProtocolError::ChecksumMismatch {
                        expected: self.checksum.value(),
                        actual: byte,
                    });
                }

                let frame = Frame::new(self.buffer[0], &self.buffer[1..]);
                self.stats.frames += 1;
                self.reset();

                trace!(
                    "decoded {} frame ({} payload bytes)",
                    frame_type_name(frame.frame_type),
                    frame.payload.len()
                );
                Ok(Some(frame))
            }
        }
    }

    /// Feed a batch of bytes, returning every frame they complete.
    ///
    /// Malformed frames are dropped and counted in [`FrameParser::stats`].
    pub fn feed(&mut self, data: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        for &raw in data {
            match self.push_byte(raw) {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => {}
                Err(e) => debug!("dropped frame: {}", e),
            }
        }
        frames
    }
}

/// Decode exactly one frame from a byte slice.
///
/// Leading bytes before the delimiter are skipped. Returns the first error
/// encountered, or [`ProtocolError::Incomplete`] if the input ends early.
pub fn decode_frame(data: &[u8], escaping: Escaping) -> ProtocolResult<Frame> {
    let mut parser = FrameParser::with_max_frame_length(escaping, u16::MAX);
    for &raw in data {
        if let Some(frame) = parser.push_byte(raw)? {
            return Ok(frame);
        }
    }
    Err(ProtocolError::Incomplete)
}
