//! XBee API Frame Protocol
//!
//! This crate provides the framing layer used to talk to XBee radio modules over a
//! serial link: building outgoing frames, incrementally parsing incoming ones, and
//! the table of two-character AT configuration commands carried inside them.
//!
//! # Protocol Overview
//!
//! Every message is a frame:
//!
//! - **Delimiter** `0x7E`, never escaped
//! - **Length** (big-endian u16) covering the type byte and payload
//! - **Type** byte selecting the payload layout
//! - **Checksum** `0xFF - sum(type, payload)`
//!
//! In escaped API mode (`AP=2`) the bytes `0x7E`, `0x7D`, `0x11` and `0x13` after the
//! delimiter are sent as `0x7D, byte ^ 0x20`. The checksum is always computed over
//! the unescaped bytes.
//!
//! # Example
//!
//! ```rust,ignore
//! use xbee_api::{ApiFrame, Escaping, Family, FrameId, FrameParser, Request};
//!
//! // Build a request
//! let request = Request::AtCommand {
//!     frame_id: FrameId(1),
//!     command: "NI".into(),
//!     parameter: Vec::new(),
//! };
//! let bytes = request.encode(Family::Wifi, Escaping::Disabled)?;
//!
//! // Parse whatever arrives, in any number of pieces
//! let mut parser = FrameParser::new(Escaping::Disabled);
//! for frame in parser.feed(&received) {
//!     let decoded = ApiFrame::decode(&frame)?;
//! }
//! ```

mod codec;
mod commands;
mod constants;
mod error;
mod frame;
mod parser;
mod requests;
mod responses;
mod types;

pub use codec::*;
pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use parser::*;
pub use requests::*;
pub use responses::*;
pub use types::*;
