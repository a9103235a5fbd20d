//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when building or decoding API frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload exceeds the destination's declared maximum. Nothing was built.
    #[error("payload too large: maximum {max} bytes, got {size}")]
    PayloadTooLarge {
        /// Payload size requested.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Mnemonic is not present in the command table.
    #[error("unknown AT command: {0:?}")]
    UnknownCommand(String),

    /// A parameter was supplied for a query-only command.
    #[error("AT command {0} is read-only")]
    ReadOnlyCommand(String),

    /// Parameter is longer than the command accepts.
    #[error("parameter for AT command {command} too long: maximum {max} bytes, got {actual}")]
    ParameterTooLong {
        /// Command mnemonic.
        command: String,
        /// Maximum parameter length.
        max: usize,
        /// Supplied parameter length.
        actual: usize,
    },

    /// The request's frame type is not available on this module family.
    #[error("{request} is not supported by the {family} family")]
    UnsupportedRequest {
        /// Request kind.
        request: &'static str,
        /// Module family.
        family: &'static str,
    },

    /// Received checksum does not match the recomputed one.
    #[error("checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch {
        /// Checksum computed from the received bytes.
        expected: u8,
        /// Checksum byte found on the wire.
        actual: u8,
    },

    /// Declared length exceeds the configured maximum.
    #[error("frame too large: declared {length} bytes (max {max})")]
    FrameTooLarge {
        /// Declared length.
        length: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Declared length of zero (no type byte).
    #[error("frame declares zero length")]
    EmptyFrame,

    /// A new delimiter arrived before the current frame completed.
    #[error("frame interrupted by delimiter after {received} of {expected} bytes")]
    Interrupted {
        /// Type and payload bytes received so far.
        received: usize,
        /// Declared length, or zero if the length was not yet complete.
        expected: usize,
    },

    /// Input ended before a complete frame was decoded.
    #[error("incomplete frame")]
    Incomplete,

    /// Frame payload is too short for its type.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },
}

impl ProtocolError {
    /// Whether this error was raised while decoding received bytes.
    ///
    /// Decode errors are recovered by resynchronizing; build errors are returned
    /// to the caller before anything is written.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            ProtocolError::ChecksumMismatch { .. }
                | ProtocolError::FrameTooLarge { .. }
                | ProtocolError::EmptyFrame
                | ProtocolError::Interrupted { .. }
                | ProtocolError::Incomplete
                | ProtocolError::FrameTooShort { .. }
        )
    }
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
