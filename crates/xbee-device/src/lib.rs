//! XBee device drivers.
//!
//! Family drivers ([`MeshDevice`], [`WifiDevice`]) on top of a shared [`Link`] that
//! composes the frame builder and parser from `xbee-api` with a byte [`Transport`].
//! Everything is poll-driven: sends write a complete frame synchronously and
//! `poll` returns whatever frames the available bytes complete, never blocking.
//!
//! # Example
//!
//! ```rust,ignore
//! use xbee_device::{ChannelTransport, DeviceConfig, MeshDevice};
//! use xbee_api::Family;
//!
//! let (host, module) = ChannelTransport::pair();
//! let mut device = MeshDevice::new(&DeviceConfig::new("coordinator", Family::Mesh), host)?;
//!
//! device.query("NI")?;
//! for frame in device.poll_api() {
//!     // ...
//! }
//! ```

mod config;
mod error;
mod link;
mod mesh;
mod transport;
mod wifi;

pub use config::*;
pub use error::*;
pub use link::*;
pub use mesh::*;
pub use transport::*;
pub use wifi::*;
