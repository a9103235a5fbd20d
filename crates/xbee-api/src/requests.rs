//! Requests the host can send to a module.

use std::net::Ipv4Addr;

use bytes::BufMut;

use crate::codec::{encode_u16, encode_u64};
use crate::commands;
use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::frame::{Frame, FrameBuilder};
use crate::types::{Address64, Escaping, Family, FrameId};

/// Transport protocol of an IPv4 transmit request (values of `ATIP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IpProtocol {
    /// UDP datagrams.
    #[default]
    Udp,
    /// TCP stream.
    Tcp,
}

impl From<IpProtocol> for u8 {
    fn from(protocol: IpProtocol) -> Self {
        match protocol {
            IpProtocol::Udp => 0,
            IpProtocol::Tcp => 1,
        }
    }
}

impl TryFrom<u8> for IpProtocol {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(IpProtocol::Udp),
            1 => Ok(IpProtocol::Tcp),
            other => Err(other),
        }
    }
}

/// Outgoing API requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Set or query a local setting, applied immediately.
    AtCommand {
        /// Correlates the response.
        frame_id: FrameId,
        /// Two-character mnemonic.
        command: String,
        /// Value to set; empty to query.
        parameter: Vec<u8>,
    },

    /// Set a local setting, held until `AC` applies queued values.
    AtQueue {
        /// Correlates the response.
        frame_id: FrameId,
        /// Two-character mnemonic.
        command: String,
        /// Value to set; empty to query.
        parameter: Vec<u8>,
    },

    /// Set or query a setting on a remote module.
    RemoteAtCommand {
        /// Correlates the response.
        frame_id: FrameId,
        /// Remote module address.
        destination: Address64,
        /// Remote 16-bit network address, or [`UNKNOWN_NETWORK_ADDRESS`].
        network_address: u16,
        /// Command options.
        options: u8,
        /// Two-character mnemonic.
        command: String,
        /// Value to set; empty to query.
        parameter: Vec<u8>,
    },

    /// Transmit data to a 64-bit address.
    Tx64 {
        /// Correlates the transmit status.
        frame_id: FrameId,
        /// Destination address.
        destination: Address64,
        /// Do not request an acknowledgement.
        disable_ack: bool,
        /// RF data.
        data: Vec<u8>,
    },

    /// Transmit data to an IPv4 endpoint.
    TxIpv4 {
        /// Correlates the transmit status.
        frame_id: FrameId,
        /// Destination address.
        destination: Ipv4Addr,
        /// Destination port.
        destination_port: u16,
        /// Source port, zero to let the module choose.
        source_port: u16,
        /// UDP or TCP.
        protocol: IpProtocol,
        /// Close the TCP socket after sending.
        close_socket: bool,
        /// Application data.
        data: Vec<u8>,
    },
}

impl Request {
    /// Frame type code of this request.
    pub fn frame_type(&self) -> u8 {
        match self {
            Request::AtCommand { .. } => API_AT_COMMAND,
            Request::AtQueue { .. } => API_AT_QUEUE_PARAMETER_VALUE,
            Request::RemoteAtCommand { .. } => API_REMOTE_COMMAND_REQUEST,
            Request::Tx64 { .. } => API_TX64_REQUEST,
            Request::TxIpv4 { .. } => API_TX_IPV4,
        }
    }

    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        frame_type_name(self.frame_type())
    }

    /// Frame ID carried by the request.
    pub fn frame_id(&self) -> FrameId {
        match self {
            Request::AtCommand { frame_id, .. }
            | Request::AtQueue { frame_id, .. }
            | Request::RemoteAtCommand { frame_id, .. }
            | Request::Tx64 { frame_id, .. }
            | Request::TxIpv4 { frame_id, .. } => *frame_id,
        }
    }

    /// Whether modules of `family` accept this request.
    pub fn is_supported_by(&self, family: Family) -> bool {
        match self {
            Request::RemoteAtCommand { .. } => family == Family::Mesh,
            Request::TxIpv4 { .. } => family == Family::Wifi,
            _ => true,
        }
    }

    /// Validate the request for `family` and produce its frame.
    pub fn to_frame(&self, family: Family) -> ProtocolResult<Frame> {
        if !self.is_supported_by(family) {
            return Err(ProtocolError::UnsupportedRequest {
                request: self.name(),
                family: family.as_str(),
            });
        }

        let mut payload = Vec::new();
        match self {
            Request::AtCommand { frame_id, command, parameter }
            | Request::AtQueue { frame_id, command, parameter } => {
                let descriptor = commands::require(command)?;
                descriptor.validate_parameter(parameter)?;

                payload.reserve(1 + AT_COMMAND_LENGTH + parameter.len());
                payload.put_u8(frame_id.value());
                payload.put_slice(&descriptor.mnemonic);
                payload.put_slice(parameter);
            }

            Request::RemoteAtCommand {
                frame_id,
                destination,
                network_address,
                options,
                command,
                parameter,
            } => {
                let descriptor = commands::require(command)?;
                descriptor.validate_parameter(parameter)?;

                payload.reserve(13 + AT_COMMAND_LENGTH + parameter.len());
                payload.put_u8(frame_id.value());
                payload.put_slice(&encode_u64(destination.value()));
                payload.put_slice(&encode_u16(*network_address));
                payload.put_u8(*options);
                payload.put_slice(&descriptor.mnemonic);
                payload.put_slice(parameter);
            }

            Request::Tx64 { frame_id, destination, disable_ack, data } => {
                check_data_len(data, family)?;

                payload.reserve(TX64_REQUEST_HEADER_LENGTH - 1 + data.len());
                payload.put_u8(frame_id.value());
                payload.put_slice(&encode_u64(destination.value()));
                payload.put_u8(if *disable_ack { TX64_DISABLE_ACK_MASK } else { 0 });
                payload.put_slice(data);
            }

            Request::TxIpv4 {
                frame_id,
                destination,
                destination_port,
                source_port,
                protocol,
                close_socket,
                data,
            } => {
                check_data_len(data, family)?;

                payload.reserve(TX_IPV4_HEADER_LENGTH - 1 + data.len());
                payload.put_u8(frame_id.value());
                payload.put_slice(&destination.octets());
                payload.put_slice(&encode_u16(*destination_port));
                payload.put_slice(&encode_u16(*source_port));
                payload.put_u8((*protocol).into());
                payload.put_u8(if *close_socket { TX_IPV4_CLOSE_SOCKET_MASK } else { 0 });
                payload.put_slice(data);
            }
        }

        Ok(Frame::new(self.frame_type(), payload))
    }

    /// Validate and encode the request for the wire in one step.
    pub fn encode(&self, family: Family, escaping: Escaping) -> ProtocolResult<Vec<u8>> {
        let frame = self.to_frame(family)?;
        FrameBuilder::new(escaping).encode(&frame)
    }
}

fn check_data_len(data: &[u8], family: Family) -> ProtocolResult<()> {
    let max = family.tx_data_limit();
    if data.len() > max {
        return Err(ProtocolError::PayloadTooLarge {
            size: data.len(),
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ipv4_to_address64;

    fn at(command: &str, parameter: &[u8]) -> Request {
        Request::AtCommand {
            frame_id: FrameId(0x01),
            command: command.into(),
            parameter: parameter.to_vec(),
        }
    }

    #[test]
    fn test_at_command_vector() {
        let bytes = at("NI", b"").encode(Family::Wifi, Escaping::Disabled).unwrap();
        let checksum = 0xFFu8.wrapping_sub(0x08 + 0x01 + 0x4E + 0x49);
        assert_eq!(bytes, vec![0x7E, 0x00, 0x04, 0x08, 0x01, 0x4E, 0x49, checksum]);
    }

    #[test]
    fn test_at_command_validation() {
        assert_eq!(
            at("QQ", b"").to_frame(Family::Mesh),
            Err(ProtocolError::UnknownCommand("QQ".into()))
        );
        assert_eq!(
            at("VR", &[0x01]).to_frame(Family::Mesh),
            Err(ProtocolError::ReadOnlyCommand("VR".into()))
        );
        assert!(matches!(
            at("NI", &[b'a'; 21]).to_frame(Family::Mesh),
            Err(ProtocolError::ParameterTooLong { max: 20, actual: 21, .. })
        ));
    }

    #[test]
    fn test_at_queue_payload() {
        let request = Request::AtQueue {
            frame_id: FrameId(0x05),
            command: "PL".into(),
            parameter: vec![0x04],
        };
        let frame = request.to_frame(Family::Wifi).unwrap();
        assert_eq!(frame.frame_type, API_AT_QUEUE_PARAMETER_VALUE);
        assert_eq!(frame.payload, vec![0x05, b'P', b'L', 0x04]);
    }

    #[test]
    fn test_remote_command_payload() {
        let request = Request::RemoteAtCommand {
            frame_id: FrameId(0x02),
            destination: Address64::new(0x0013_A200_400A_0127),
            network_address: UNKNOWN_NETWORK_ADDRESS,
            options: REMOTE_APPLY_CHANGES_MASK,
            command: "D1".into(),
            parameter: vec![0x05],
        };
        let frame = request.to_frame(Family::Mesh).unwrap();
        assert_eq!(frame.frame_type, API_REMOTE_COMMAND_REQUEST);
        assert_eq!(
            frame.payload,
            vec![
                0x02, 0x00, 0x13, 0xA2, 0x00, 0x40, 0x0A, 0x01, 0x27, 0xFF, 0xFE, 0x02, b'D', b'1',
                0x05
            ]
        );

        assert_eq!(
            request.to_frame(Family::Wifi),
            Err(ProtocolError::UnsupportedRequest {
                request: "remote_command_request",
                family: "wifi"
            })
        );
    }

    #[test]
    fn test_tx64_payload() {
        let request = Request::Tx64 {
            frame_id: FrameId(0x03),
            destination: ipv4_to_address64(192, 168, 10, 25),
            disable_ack: true,
            data: b"hi".to_vec(),
        };
        let frame = request.to_frame(Family::Wifi).unwrap();
        assert_eq!(frame.frame_type, API_TX64_REQUEST);
        assert_eq!(
            frame.payload,
            vec![0x03, 0x00, 0x00, 0x00, 0x00, 0xC0, 0xA8, 0x0A, 0x19, 0x01, b'h', b'i']
        );
        assert_eq!(frame.length() - 2, TX64_REQUEST_HEADER_LENGTH);
    }

    #[test]
    fn test_tx64_size_limits() {
        let tx = |len: usize| Request::Tx64 {
            frame_id: FrameId::NONE,
            destination: Address64::BROADCAST,
            disable_ack: false,
            data: vec![0xAA; len],
        };

        assert!(tx(1398).to_frame(Family::Wifi).is_ok());
        assert_eq!(
            tx(1399).to_frame(Family::Wifi),
            Err(ProtocolError::PayloadTooLarge { size: 1399, max: 1398 })
        );
        assert!(tx(84).to_frame(Family::Mesh).is_ok());
        assert_eq!(
            tx(85).to_frame(Family::Mesh),
            Err(ProtocolError::PayloadTooLarge { size: 85, max: 84 })
        );
    }

    #[test]
    fn test_tx_ipv4_payload() {
        let request = Request::TxIpv4 {
            frame_id: FrameId(0x04),
            destination: Ipv4Addr::new(10, 0, 0, 2),
            destination_port: 0x2616,
            source_port: 0,
            protocol: IpProtocol::Tcp,
            close_socket: true,
            data: vec![0x7E],
        };
        let frame = request.to_frame(Family::Wifi).unwrap();
        assert_eq!(frame.frame_type, API_TX_IPV4);
        assert_eq!(
            frame.payload,
            vec![0x04, 10, 0, 0, 2, 0x26, 0x16, 0x00, 0x00, 0x01, 0x02, 0x7E]
        );
        assert!(matches!(
            request.to_frame(Family::Mesh),
            Err(ProtocolError::UnsupportedRequest { .. })
        ));
    }

    #[test]
    fn test_frame_id_accessor() {
        assert_eq!(at("NI", b"").frame_id(), FrameId(0x01));
        assert_eq!(at("NI", b"").name(), "at_command");
    }
}
