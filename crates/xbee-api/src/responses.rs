//! Frames received from a module, decoded by type.

use std::net::Ipv4Addr;

use crate::commands::{self, AtCommandDescriptor};
use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::frame::Frame;
use crate::types::{Address64, FrameId};

/// Status byte of an AT command response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    /// Command accepted.
    Ok,
    /// Generic failure.
    Error,
    /// Mnemonic not recognized by the module.
    InvalidCommand,
    /// Parameter rejected by the module.
    InvalidParameter,
    /// Remote command could not be delivered.
    TxFailure,
    /// Unrecognized status code.
    Unknown(u8),
}

impl From<u8> for CommandStatus {
    fn from(value: u8) -> Self {
        match value {
            0x00 => CommandStatus::Ok,
            0x01 => CommandStatus::Error,
            0x02 => CommandStatus::InvalidCommand,
            0x03 => CommandStatus::InvalidParameter,
            0x04 => CommandStatus::TxFailure,
            other => CommandStatus::Unknown(other),
        }
    }
}

impl CommandStatus {
    /// Whether the command succeeded.
    pub fn is_ok(self) -> bool {
        self == CommandStatus::Ok
    }
}

/// Unsolicited modem status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModemStatus {
    /// Power-on or hardware reset.
    HardwareReset,
    /// Watchdog timer reset.
    WatchdogReset,
    /// Joined a network or associated with an access point.
    Joined,
    /// Left the network.
    Disassociated,
    /// Coordinator started.
    CoordinatorStarted,
    /// Configuration error during join.
    ConfigurationError,
    /// Unrecognized status code.
    Other(u8),
}

impl From<u8> for ModemStatus {
    fn from(value: u8) -> Self {
        match value {
            0x00 => ModemStatus::HardwareReset,
            0x01 => ModemStatus::WatchdogReset,
            0x02 => ModemStatus::Joined,
            0x03 => ModemStatus::Disassociated,
            0x06 => ModemStatus::CoordinatorStarted,
            0x0E => ModemStatus::ConfigurationError,
            other => ModemStatus::Other(other),
        }
    }
}

/// Delivery status of a transmit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryStatus {
    /// Delivered.
    Success,
    /// No acknowledgement received.
    NoAck,
    /// Clear channel assessment failed.
    CcaFailure,
    /// Purged before transmission.
    Purged,
    /// Network did not acknowledge.
    NetworkAckFailure,
    /// Module is not joined to a network.
    NotJoined,
    /// Unrecognized status code.
    Other(u8),
}

impl From<u8> for DeliveryStatus {
    fn from(value: u8) -> Self {
        match value {
            0x00 => DeliveryStatus::Success,
            0x01 => DeliveryStatus::NoAck,
            0x02 => DeliveryStatus::CcaFailure,
            0x03 => DeliveryStatus::Purged,
            0x21 => DeliveryStatus::NetworkAckFailure,
            0x22 => DeliveryStatus::NotJoined,
            other => DeliveryStatus::Other(other),
        }
    }
}

/// A received frame, decoded according to its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFrame {
    /// Response to a local AT command.
    AtCommandResponse {
        /// Frame ID of the request.
        frame_id: FrameId,
        /// Mnemonic bytes echoed by the module.
        command: [u8; AT_COMMAND_LENGTH],
        /// Result.
        status: CommandStatus,
        /// Queried value, if any.
        data: Vec<u8>,
    },

    /// Response to a remote AT command.
    RemoteCommandResponse {
        /// Frame ID of the request.
        frame_id: FrameId,
        /// Responding module.
        source: Address64,
        /// Responding module's 16-bit network address.
        network_address: u16,
        /// Mnemonic bytes echoed by the module.
        command: [u8; AT_COMMAND_LENGTH],
        /// Result.
        status: CommandStatus,
        /// Queried value, if any.
        data: Vec<u8>,
    },

    /// Outcome of a transmit request.
    TransmitStatus {
        /// Frame ID of the request.
        frame_id: FrameId,
        /// Delivery result.
        status: DeliveryStatus,
    },

    /// Unsolicited modem event.
    ModemStatus(ModemStatus),

    /// Data received from a 64-bit address.
    Receive64 {
        /// Sending module.
        source: Address64,
        /// Received signal strength, in -dBm.
        rssi: u8,
        /// Receive options.
        options: u8,
        /// RF data.
        data: Vec<u8>,
    },

    /// I/O sample from a remote module.
    IoSample {
        /// Sending module.
        source: Address64,
        /// Received signal strength, in -dBm.
        rssi: u8,
        /// Receive options.
        options: u8,
        /// Raw sample bytes.
        samples: Vec<u8>,
    },

    /// Data received from an IPv4 endpoint.
    ReceiveIpv4 {
        /// Sending host.
        source: Ipv4Addr,
        /// Local port the data arrived on.
        destination_port: u16,
        /// Remote port.
        source_port: u16,
        /// Transport protocol code.
        protocol: u8,
        /// Receive status.
        status: u8,
        /// Application data.
        data: Vec<u8>,
    },

    /// A frame of a type without a typed representation.
    Unknown(Frame),
}

fn ensure_len(payload: &[u8], expected: usize) -> ProtocolResult<()> {
    if payload.len() < expected {
        return Err(ProtocolError::FrameTooShort {
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

fn read_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn read_address(bytes: &[u8]) -> ProtocolResult<Address64> {
    Address64::from_slice(bytes).ok_or(ProtocolError::FrameTooShort {
        expected: 8,
        actual: bytes.len(),
    })
}

impl ApiFrame {
    /// Decode a parsed frame.
    ///
    /// Unrecognized types decode to [`ApiFrame::Unknown`]; a recognized type with a
    /// truncated payload fails with [`ProtocolError::FrameTooShort`].
    pub fn decode(frame: &Frame) -> ProtocolResult<Self> {
        let p = frame.payload.as_slice();

        match frame.frame_type {
            API_AT_COMMAND_RESPONSE => {
                ensure_len(p, 4)?;
                Ok(ApiFrame::AtCommandResponse {
                    frame_id: FrameId(p[0]),
                    command: [p[1], p[2]],
                    status: CommandStatus::from(p[3]),
                    data: p[4..].to_vec(),
                })
            }

            API_REMOTE_COMMAND_RESPONSE => {
                ensure_len(p, 14)?;
                Ok(ApiFrame::RemoteCommandResponse {
                    frame_id: FrameId(p[0]),
                    source: read_address(&p[1..9])?,
                    network_address: read_u16(&p[9..11]),
                    command: [p[11], p[12]],
                    status: CommandStatus::from(p[13]),
                    data: p[14..].to_vec(),
                })
            }

            API_TX_STATUS => {
                ensure_len(p, 2)?;
                Ok(ApiFrame::TransmitStatus {
                    frame_id: FrameId(p[0]),
                    status: DeliveryStatus::from(p[1]),
                })
            }

            API_MODEM_STATUS => {
                ensure_len(p, 1)?;
                Ok(ApiFrame::ModemStatus(ModemStatus::from(p[0])))
            }

            API_RX64_INDICATOR => {
                ensure_len(p, 10)?;
                Ok(ApiFrame::Receive64 {
                    source: read_address(&p[0..8])?,
                    rssi: p[8],
                    options: p[9],
                    data: p[10..].to_vec(),
                })
            }

            API_IO_SAMPLE_RX_INDICATOR => {
                ensure_len(p, 10)?;
                Ok(ApiFrame::IoSample {
                    source: read_address(&p[0..8])?,
                    rssi: p[8],
                    options: p[9],
                    samples: p[10..].to_vec(),
                })
            }

            API_RX_IPV4 => {
                ensure_len(p, 10)?;
                Ok(ApiFrame::ReceiveIpv4 {
                    source: Ipv4Addr::new(p[0], p[1], p[2], p[3]),
                    destination_port: read_u16(&p[4..6]),
                    source_port: read_u16(&p[6..8]),
                    protocol: p[8],
                    status: p[9],
                    data: p[10..].to_vec(),
                })
            }

            _ => Ok(ApiFrame::Unknown(frame.clone())),
        }
    }

    /// Frame ID of the request this frame answers, if any.
    pub fn frame_id(&self) -> Option<FrameId> {
        match self {
            ApiFrame::AtCommandResponse { frame_id, .. }
            | ApiFrame::RemoteCommandResponse { frame_id, .. }
            | ApiFrame::TransmitStatus { frame_id, .. } => Some(*frame_id),
            _ => None,
        }
    }

    /// Table entry for the mnemonic of a command response.
    pub fn command(&self) -> Option<&'static AtCommandDescriptor> {
        match self {
            ApiFrame::AtCommandResponse { command, .. }
            | ApiFrame::RemoteCommandResponse { command, .. } => {
                commands::lookup_code(u16::from_be_bytes(*command))
            }
            _ => None,
        }
    }
}

impl TryFrom<&Frame> for ApiFrame {
    type Error = ProtocolError;

    fn try_from(frame: &Frame) -> Result<Self, Self::Error> {
        ApiFrame::decode(frame)
    }
}
