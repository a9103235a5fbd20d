//! Mesh family driver.

use xbee_api::{
    Address64, ApiFrame, Family, Frame, FrameId, ParserStats, Request, REMOTE_APPLY_CHANGES_MASK,
    UNKNOWN_NETWORK_ADDRESS,
};

use crate::config::DeviceConfig;
use crate::error::{DeviceError, DeviceResult};
use crate::link::Link;
use crate::transport::Transport;

/// Driver for mesh networking modules.
///
/// Transmits use the 64-bit addressed request with an 84-byte data limit. Remote
/// configuration of other nodes is available; IPv4 transmits are not.
#[derive(Debug)]
pub struct MeshDevice<T> {
    link: Link<T>,
}

impl<T: Transport> MeshDevice<T> {
    /// Open a driver over `transport`. The configuration must name the mesh family.
    pub fn new(config: &DeviceConfig, transport: T) -> DeviceResult<Self> {
        if config.family != Family::Mesh {
            return Err(DeviceError::Config(format!(
                "device {} is configured for the {} family, not mesh",
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

    /// Query a local setting. The value arrives in an AT command response.
    pub fn query(&mut self, command: &str) -> DeviceResult<FrameId> {
        self.set_parameter(command, &[])
    }

    /// Queue a local setting until [`MeshDevice::apply_changes`].
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

    /// Set or query a setting on another node.
    pub fn remote_command(
        &mut self,
        destination: Address64,
        command: &str,
        parameter: &[u8],
        apply_changes: bool,
    ) -> DeviceResult<FrameId> {
        let frame_id = self.link.next_frame_id();
        self.link.send(&Request::RemoteAtCommand {
            frame_id,
            destination,
            network_address: UNKNOWN_NETWORK_ADDRESS,
            options: if apply_changes { REMOTE_APPLY_CHANGES_MASK } else { 0 },
            command: command.to_string(),
            parameter: parameter.to_vec(),
        })
    }

    /// Transmit data to a 64-bit address.
    pub fn send_tx64(
        &mut self,
        destination: Address64,
        data: &[u8],
        disable_ack: bool,
    ) -> DeviceResult<FrameId> {
        let frame_id = self.link.next_frame_id();
        self.link.send(&Request::Tx64 {
            frame_id,
            destination,
            disable_ack,
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
