//! WiFi family driver.

use std::net::SocketAddrV4;

use xbee_api::{
    Address64, ApiFrame, Family, Frame, FrameId, IpProtocol, ParserStats, Request,
};

use crate::config::DeviceConfig;
use crate::error::{DeviceError, DeviceResult};
use crate::link::Link;
use crate::transport::Transport;

/// Driver for WiFi modules.
///
/// Destinations are IPv4 hosts; a 64-bit transmit address carries the IPv4 octets
/// in its low 32 bits. Data is limited to 1398 bytes per request.
#[derive(Debug)]
pub struct WifiDevice<T> {
    link: Link<T>,
}

impl<T: Transport> WifiDevice<T> {
    /// Open a driver over `transport`. The configuration must name the WiFi family.
    pub fn new(config: &DeviceConfig, transport: T) -> DeviceResult<Self> {
        if config.family != Family::Wifi {
            return Err(DeviceError::Config(format!(
                "device {} is configured for the {} family, not wifi",
                config.name, config.family
            )));
        }
        Ok(Self {
            link: Link::new(config, transport)?,
        })
    }

    /// Set a local setting, applied immediately.
    pub fn set_parameter(&mut self, command: &str, parameter: &[u8]) -> DeviceResult<FrameId> {
        let frame_id = self.link.next_frame_id();
        self.link.send(&Request::AtCommand {
            frame_id,
            command: command.to_string(),
            parameter: parameter.to_vec(),
        })
    }

    /// Query a local setting.
    pub fn query(&mut self, command: &str) -> DeviceResult<FrameId> {
        self.set_parameter(command, &[])
    }

    /// Queue a local setting until [`WifiDevice::apply_changes`].
    pub fn queue_parameter(&mut self, command: &str, parameter: &[u8]) -> DeviceResult<FrameId> {
        let frame_id = self.link.next_frame_id();
        self.link.send(&Request::AtQueue {
            frame_id,
            command: command.to_string(),
            parameter: parameter.to_vec(),
        })
    }

    /// Apply queued settings (`AC`).
    pub fn apply_changes(&mut self) -> DeviceResult<FrameId> {
        self.set_parameter("AC", &[])
    }

    /// Transmit data to a 64-bit address, usually a packed IPv4 address.
    pub fn send_tx64(
        &mut self,
        destination: impl Into<Address64>,
        data: &[u8],
        disable_ack: bool,
    ) -> DeviceResult<FrameId> {
        let frame_id = self.link.next_frame_id();
        self.link.send(&Request::Tx64 {
            frame_id,
            destination: destination.into(),
            disable_ack,
            data: data.to_vec(),
        })
    }

    /// Transmit data to an IPv4 endpoint from a module-chosen source port.
    pub fn send_ipv4(
        &mut self,
        destination: SocketAddrV4,
        protocol: IpProtocol,
        data: &[u8],
    ) -> DeviceResult<FrameId> {
        let frame_id = self.link.next_frame_id();
        self.link.send(&Request::TxIpv4 {
            frame_id,
            destination: *destination.ip(),
            destination_port: destination.port(),
            source_port: 0,
            protocol,
            close_socket: false,
            data: data.to_vec(),
        })
    }

    /// Frames completed by whatever bytes are available.
    pub fn poll(&mut self) -> Vec<Frame> {
        self.link.poll()
    }

    /// Decoded frames completed by whatever bytes are available.
    pub fn poll_api(&mut self) -> Vec<ApiFrame> {
        self.link.poll_api()
    }

    /// Abandon any partially received frame.
    pub fn reset_parser(&mut self) {
        self.link.reset_parser();
    }

    /// Parser counters.
    pub fn stats(&self) -> ParserStats {
        self.link.stats()
    }

    /// The shared link.
    pub fn link(&self) -> &Link<T> {
        &self.link
    }

    /// The shared link, mutably.
    pub fn link_mut(&mut self) -> &mut Link<T> {
        &mut self.link
    }
}
