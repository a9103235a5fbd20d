//! Error types for the device crate.

use thiserror::Error;
use xbee_api::ProtocolError;

/// Failures reported by a [`Transport`](crate::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The other end has gone away.
    #[error("transport closed")]
    Closed,

    /// The stream kept refusing bytes until the write timeout expired.
    #[error("write timed out after {written} of {total} bytes")]
    TimedOut {
        /// Bytes accepted before giving up.
        written: usize,
        /// Length of the attempted write.
        total: usize,
    },

    /// I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when configuring or driving a device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Request rejected by the frame layer. Nothing was written.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Transport failed while writing a frame.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Invalid device configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
