//! Common types used in the protocol.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// A 64-bit module address (serial number or packed IPv4 address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address64(pub u64);

impl Address64 {
    /// The broadcast address.
    pub const BROADCAST: Address64 = Address64(0x0000_0000_0000_FFFF);

    /// Create an address from its numeric value.
    pub const fn new(value: u64) -> Self {
        Address64(value)
    }

    /// Pack the octets of a dotted-quad IPv4 address into the low 32 bits.
    ///
    /// `192.168.10.25` becomes `0x00000000C0A80A19`.
    pub const fn from_ipv4_octets(a: u8, b: u8, c: u8, d: u8) -> Self {
        Address64(((a as u64) << 24) | ((b as u64) << 16) | ((c as u64) << 8) | d as u64)
    }

    /// Read an address from the first 8 bytes of a slice. Returns None if too short.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 8] = slice.get(..8)?.try_into().ok()?;
        Some(Address64(u64::from_be_bytes(bytes)))
    }

    /// Big-endian wire representation.
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Get the numeric value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<Ipv4Addr> for Address64 {
    fn from(addr: Ipv4Addr) -> Self {
        let [a, b, c, d] = addr.octets();
        Address64::from_ipv4_octets(a, b, c, d)
    }
}

impl fmt::Display for Address64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// Pack dotted-quad octets into a 64-bit address field.
pub const fn ipv4_to_address64(a: u8, b: u8, c: u8, d: u8) -> Address64 {
    Address64::from_ipv4_octets(a, b, c, d)
}

/// Frame ID used to correlate a request with its status or response frame.
///
/// The value is opaque to the codec. Zero asks the module not to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameId(pub u8);

impl FrameId {
    /// No status or response frame is wanted.
    pub const NONE: FrameId = FrameId(DUMMY_FRAME_ID);

    /// Get the raw byte.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether the module will answer this frame.
    pub const fn expects_response(self) -> bool {
        self.0 != DUMMY_FRAME_ID
    }
}

impl From<u8> for FrameId {
    fn from(value: u8) -> Self {
        FrameId(value)
    }
}

/// Hands out non-zero frame IDs in a cycle (1, 2, ..., 255, 1, ...).
#[derive(Debug, Clone, Default)]
pub struct FrameIdAllocator {
    last: u8,
}

impl FrameIdAllocator {
    /// Create an allocator whose first ID is 1.
    pub fn new() -> Self {
        FrameIdAllocator { last: 0 }
    }

    /// Next correlator; never [`FrameId::NONE`].
    pub fn next_id(&mut self) -> FrameId {
        self.last = match self.last.wrapping_add(1) {
            0 => 1,
            id => id,
        };
        FrameId(self.last)
    }
}

/// Whether reserved bytes are escaped on the wire (`AP = 2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Escaping {
    /// Every byte after the delimiter is sent as-is (`AP = 1`).
    #[default]
    Disabled,
    /// Reserved bytes are sent as `ESCAPE, byte ^ 0x20` (`AP = 2`).
    Enabled,
}

impl Escaping {
    /// Returns true when escaping is on.
    pub const fn is_enabled(self) -> bool {
        matches!(self, Escaping::Enabled)
    }
}

impl From<bool> for Escaping {
    fn from(enabled: bool) -> Self {
        if enabled {
            Escaping::Enabled
        } else {
            Escaping::Disabled
        }
    }
}

/// Values of the `AP` (API enable) command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiMode {
    /// Transparent serial pass-through, no framing.
    Transparent,
    /// API framing without escaping.
    #[default]
    Api,
    /// API framing with escaping.
    ApiEscaped,
}

impl ApiMode {
    /// Escaping setting for a framed connection, or None in transparent mode.
    pub const fn escaping(self) -> Option<Escaping> {
        match self {
            ApiMode::Transparent => None,
            ApiMode::Api => Some(Escaping::Disabled),
            ApiMode::ApiEscaped => Some(Escaping::Enabled),
        }
    }
}

impl From<ApiMode> for u8 {
    fn from(mode: ApiMode) -> Self {
        match mode {
            ApiMode::Transparent => 0,
            ApiMode::Api => 1,
            ApiMode::ApiEscaped => 2,
        }
    }
}

impl TryFrom<u8> for ApiMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ApiMode::Transparent),
            1 => Ok(ApiMode::Api),
            2 => Ok(ApiMode::ApiEscaped),
            other => Err(other),
        }
    }
}

/// A category of radio module sharing the base framing protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Mesh networking modules (XBee series 2).
    Mesh,
    /// WiFi modules (XBee S6, IEEE 802.11b/g/n).
    Wifi,
}

impl Family {
    /// Maximum data bytes accepted by this family's transmit requests.
    pub const fn tx_data_limit(self) -> usize {
        match self {
            Family::Mesh => MESH_TX_DATA_MAX_LENGTH,
            Family::Wifi => WIFI_TX_DATA_MAX_LENGTH,
        }
    }

    /// Returns the family as a lowercase string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Family::Mesh => "mesh",
            Family::Wifi => "wifi",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
