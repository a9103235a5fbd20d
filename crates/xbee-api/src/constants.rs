//! Protocol constants
//!
//! Reserved bytes, frame type codes and size limits of the XBee API framing
//! protocol.

// ============================================================================
// Reserved Bytes
// ============================================================================

/// Start-of-frame delimiter. Never escaped.
pub const FRAME_DELIMITER: u8 = 0x7E;
/// Escape marker; the following byte is XORed with [`ESCAPE_MASK`].
pub const ESCAPE: u8 = 0x7D;
/// Software flow control: resume transmission.
pub const XON: u8 = 0x11;
/// Software flow control: pause transmission.
pub const XOFF: u8 = 0x13;
/// Mask applied to an escaped byte.
pub const ESCAPE_MASK: u8 = 0x20;

/// Initial value of the running checksum accumulator.
pub const CHECKSUM_SEED: u8 = 0xFF;

// ============================================================================
// Frame Types (host → module)
// ============================================================================

/// Transmit request with 64-bit destination address.
pub const API_TX64_REQUEST: u8 = 0x00;
/// Remote AT command request.
pub const API_REMOTE_COMMAND_REQUEST: u8 = 0x07;
/// Local AT command, applied immediately.
pub const API_AT_COMMAND: u8 = 0x08;
/// Local AT command, value queued until `AC` is issued.
pub const API_AT_QUEUE_PARAMETER_VALUE: u8 = 0x09;
/// Transmit request with IPv4 destination (WiFi family).
pub const API_TX_IPV4: u8 = 0x20;

// ============================================================================
// Frame Types (module → host)
// ============================================================================

/// Receive packet with 64-bit source address.
pub const API_RX64_INDICATOR: u8 = 0x80;
/// I/O sample received from a remote module.
pub const API_IO_SAMPLE_RX_INDICATOR: u8 = 0x82;
/// Response to a remote AT command request.
pub const API_REMOTE_COMMAND_RESPONSE: u8 = 0x87;
/// Response to a local AT command.
pub const API_AT_COMMAND_RESPONSE: u8 = 0x88;
/// Delivery status of a transmit request.
pub const API_TX_STATUS: u8 = 0x89;
/// Unsolicited modem status.
pub const API_MODEM_STATUS: u8 = 0x8A;
/// Receive packet with IPv4 source (WiFi family).
pub const API_RX_IPV4: u8 = 0xB0;

// ============================================================================
// Frame IDs
// ============================================================================

/// Frame ID that tells the module not to send a status frame.
pub const DUMMY_FRAME_ID: u8 = 0x00;

// ============================================================================
// Sizes
// ============================================================================

/// Bytes before the data of a TX64 request: type, frame ID, address (8), options.
pub const TX64_REQUEST_HEADER_LENGTH: usize = 11;
/// Bytes before the data of an IPv4 transmit request: type, frame ID, address (4),
/// destination port (2), source port (2), protocol, options.
pub const TX_IPV4_HEADER_LENGTH: usize = 11;
/// Maximum transmit data for the WiFi family.
pub const WIFI_TX_DATA_MAX_LENGTH: usize = 1398;
/// Maximum transmit data for the mesh family.
pub const MESH_TX_DATA_MAX_LENGTH: usize = 84;

/// TX64 option bit that disables the acknowledgement.
pub const TX64_DISABLE_ACK_MASK: u8 = 0x01;
/// IPv4 transmit option bit that closes the socket after sending.
pub const TX_IPV4_CLOSE_SOCKET_MASK: u8 = 0x02;
/// Remote command option bit that applies changes on the remote module.
pub const REMOTE_APPLY_CHANGES_MASK: u8 = 0x02;

/// 16-bit network address meaning "unknown, use the 64-bit address".
pub const UNKNOWN_NETWORK_ADDRESS: u16 = 0xFFFE;

/// Largest length value the 16-bit header can carry.
pub const MAX_FRAME_LENGTH: usize = u16::MAX as usize;
/// Default parser limit on the declared length (type + payload).
pub const DEFAULT_MAX_FRAME_LENGTH: u16 = 1500;

/// Length of an AT command mnemonic.
pub const AT_COMMAND_LENGTH: usize = 2;

/// Human-readable name of a frame type, for logging.
pub fn frame_type_name(frame_type: u8) -> &'static str {
    match frame_type {
        API_TX64_REQUEST => "tx64_request",
        API_REMOTE_COMMAND_REQUEST => "remote_command_request",
        API_AT_COMMAND => "at_command",
        API_AT_QUEUE_PARAMETER_VALUE => "at_queue_parameter_value",
        API_TX_IPV4 => "tx_ipv4",
        API_RX64_INDICATOR => "rx64_indicator",
        API_IO_SAMPLE_RX_INDICATOR => "io_sample_rx_indicator",
        API_REMOTE_COMMAND_RESPONSE => "remote_command_response",
        API_AT_COMMAND_RESPONSE => "at_command_response",
        API_TX_STATUS => "tx_status",
        API_MODEM_STATUS => "modem_status",
        API_RX_IPV4 => "rx_ipv4",
        _ => "unknown",
    }
}
