//! Integration tests driving the family drivers against an in-memory module.

use std::net::{Ipv4Addr, SocketAddrV4};

use xbee_api::*;
use xbee_device::*;

// ============================================================================
// Helpers
// ============================================================================

fn mesh(api_mode: ApiMode) -> (MeshDevice<ChannelTransport>, ChannelTransport) {
    let (host, module) = ChannelTransport::pair();
    let config = DeviceConfig::new("coordinator", Family::Mesh).with_api_mode(api_mode);
    (MeshDevice::new(&config, host).unwrap(), module)
}

fn wifi() -> (WifiDevice<ChannelTransport>, ChannelTransport) {
    let (host, module) = ChannelTransport::pair();
    let config = DeviceConfig::new("sensor", Family::Wifi);
    (WifiDevice::new(&config, host).unwrap(), module)
}

/// Frames the module end has received.
fn received(module: &mut ChannelTransport, escaping: Escaping) -> Vec<Frame> {
    FrameParser::new(escaping).feed(&module.drain())
}

/// Transport whose next write can be made to fail.
struct FlakyTransport {
    inner: ChannelTransport,
    fail_next_write: bool,
}

impl Transport for FlakyTransport {
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "write timed out",
            )));
        }
        self.inner.write_byte(byte)
    }

    fn poll_byte(&mut self) -> Option<u8> {
        self.inner.poll_byte()
    }
}

// ============================================================================
// Transmit
// ============================================================================

#[test]
fn test_query_node_identifier_bytes() {
    let (mut device, mut module) = mesh(ApiMode::Api);

    let frame_id = device.query("NI").unwrap();
    assert_eq!(frame_id, FrameId(1));

    let checksum = 0xFF - ((0x08u32 + 0x01 + 0x4E + 0x49) % 256) as u8;
    assert_eq!(module.drain(), vec![0x7E, 0x00, 0x04, 0x08, 0x01, 0x4E, 0x49, checksum]);
}

#[test]
fn test_frame_ids_advance_per_send() {
    let (mut device, mut module) = wifi();

    assert_eq!(device.set_parameter("NI", b"kitchen").unwrap(), FrameId(1));
    assert_eq!(device.queue_parameter("PL", &[0x02]).unwrap(), FrameId(2));
    assert_eq!(device.apply_changes().unwrap(), FrameId(3));

    let frames = received(&mut module, Escaping::Disabled);
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].frame_type, API_AT_COMMAND);
    assert_eq!(frames[0].payload, b"\x01NIkitchen".to_vec());
    assert_eq!(frames[1].frame_type, API_AT_QUEUE_PARAMETER_VALUE);
    assert_eq!(frames[1].payload, vec![0x02, b'P', b'L', 0x02]);
    assert_eq!(frames[2].payload, vec![0x03, b'A', b'C']);
}

#[test]
fn test_wifi_payload_limit_writes_nothing() {
    let (mut device, mut module) = wifi();
    let destination = Ipv4Addr::new(192, 168, 10, 25);

    let err = device.send_tx64(destination, &[0u8; 1399], false).unwrap_err();
    assert!(matches!(
        err,
        DeviceError::Protocol(ProtocolError::PayloadTooLarge { size: 1399, max: 1398 })
    ));
    assert_eq!(module.pending(), 0);

    device.send_tx64(destination, &[0u8; 1398], false).unwrap();
    let frames = received(&mut module, Escaping::Disabled);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].frame_type, API_TX64_REQUEST);
    assert_eq!(&frames[0].payload[1..9], &[0, 0, 0, 0, 0xC0, 0xA8, 0x0A, 0x19]);
    assert_eq!(frames[0].payload[9], 0x00);
    assert_eq!(frames[0].length(), TX64_REQUEST_HEADER_LENGTH + 1398);
}

#[test]
fn test_mesh_payload_limit() {
    let (mut device, mut module) = mesh(ApiMode::Api);
    let destination = Address64::new(0x0013_A200_400A_0127);

    assert!(matches!(
        device.send_tx64(destination, &[0u8; 85], true),
        Err(DeviceError::Protocol(ProtocolError::PayloadTooLarge { size: 85, max: 84 }))
    ));
    assert_eq!(module.pending(), 0);

    device.send_tx64(destination, &[0u8; 84], true).unwrap();
    let frames = received(&mut module, Escaping::Disabled);
    assert_eq!(frames[0].payload[9], TX64_DISABLE_ACK_MASK);
}

#[test]
fn test_invalid_commands_write_nothing() {
    let (mut device, mut module) = mesh(ApiMode::Api);

    assert!(matches!(
        device.query("ZZ"),
        Err(DeviceError::Protocol(ProtocolError::UnknownCommand(_)))
    ));
    assert!(matches!(
        device.set_parameter("VR", &[0x01]),
        Err(DeviceError::Protocol(ProtocolError::ReadOnlyCommand(_)))
    ));
    assert!(matches!(
        device.set_parameter("NI", &[b'n'; 21]),
        Err(DeviceError::Protocol(ProtocolError::ParameterTooLong { .. }))
    ));
    assert_eq!(module.pending(), 0);
}

#[test]
fn test_remote_command() {
    let (mut device, mut module) = mesh(ApiMode::Api);
    let destination = Address64::new(0x0013_A200_4000_0001);

    device.remote_command(destination, "D1", &[0x05], true).unwrap();

    let frames = received(&mut module, Escaping::Disabled);
    assert_eq!(frames[0].frame_type, API_REMOTE_COMMAND_REQUEST);
    assert_eq!(&frames[0].payload[1..9], &destination.to_bytes());
    assert_eq!(&frames[0].payload[9..11], &[0xFF, 0xFE]);
    assert_eq!(frames[0].payload[11], REMOTE_APPLY_CHANGES_MASK);
    assert_eq!(&frames[0].payload[12..], b"D1\x05");
}

#[test]
fn test_send_ipv4() {
    let (mut device, mut module) = wifi();
    let destination = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 9750);

    device.send_ipv4(destination, IpProtocol::Udp, b"ping").unwrap();

    let frames = received(&mut module, Escaping::Disabled);
    assert_eq!(frames[0].frame_type, API_TX_IPV4);
    assert_eq!(
        frames[0].payload,
        vec![0x01, 10, 0, 0, 2, 0x26, 0x16, 0x00, 0x00, 0x00, 0x00, b'p', b'i', b'n', b'g']
    );
}

#[test]
fn test_escaped_link() {
    let (mut device, mut module) = mesh(ApiMode::ApiEscaped);

    device.set_parameter("ID", &[0x7E, 0x11]).unwrap();

    let bytes = module.drain();
    assert_eq!(bytes.iter().filter(|&&b| b == FRAME_DELIMITER).count(), 1);
    assert!(!bytes.contains(&XON));

    let frame = decode_frame(&bytes, Escaping::Enabled).unwrap();
    assert_eq!(frame.payload, vec![0x01, b'I', b'D', 0x7E, 0x11]);
}

#[test]
fn test_family_mismatch_rejected() {
    let (host, _module) = ChannelTransport::pair();
    let config = DeviceConfig::new("sensor", Family::Wifi);
    assert!(matches!(MeshDevice::new(&config, host), Err(DeviceError::Config(_))));

    let (host, _module) = ChannelTransport::pair();
    let config = DeviceConfig::new("coordinator", Family::Mesh);
    assert!(matches!(WifiDevice::new(&config, host), Err(DeviceError::Config(_))));
}

// ============================================================================
// Receive
// ============================================================================

#[test]
fn test_incremental_poll() {
    let (mut device, mut module) = wifi();
    let bytes = Frame::new(API_MODEM_STATUS, vec![0x02]).encode(Escaping::Disabled).unwrap();

    for &b in &bytes[..bytes.len() - 1] {
        module.write_byte(b).unwrap();
        assert!(device.poll().is_empty());
    }
    module.write_byte(bytes[bytes.len() - 1]).unwrap();

    assert_eq!(device.poll_api(), vec![ApiFrame::ModemStatus(ModemStatus::Joined)]);
}

#[test]
fn test_response_matches_request() {
    let (mut device, mut module) = wifi();
    let frame_id = device.query("MY").unwrap();
    module.drain();

    let mut payload = vec![frame_id.value(), b'M', b'Y', 0x00];
    payload.extend_from_slice(&[192, 168, 1, 40]);
    module
        .write_all(&Frame::new(API_AT_COMMAND_RESPONSE, payload).encode(Escaping::Disabled).unwrap())
        .unwrap();

    let frames = device.poll_api();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].frame_id(), Some(frame_id));
    match &frames[0] {
        ApiFrame::AtCommandResponse { command, status, data, .. } => {
            assert_eq!(command, b"MY");
            assert!(status.is_ok());
            assert_eq!(data, &vec![192, 168, 1, 40]);
        }
        other => panic!("unexpected frame {:?}", other),
    }
}

#[test]
fn test_corrupt_frame_then_valid_frame() {
    let (mut device, mut module) = mesh(ApiMode::Api);

    let mut bad = Frame::new(API_TX_STATUS, vec![0x01, 0x00]).encode(Escaping::Disabled).unwrap();
    bad[4] ^= 0xFF;
    module.write_all(&bad).unwrap();
    module
        .write_all(&Frame::new(API_TX_STATUS, vec![0x02, 0x00]).encode(Escaping::Disabled).unwrap())
        .unwrap();

    let frames = device.poll_api();
    assert_eq!(
        frames,
        vec![ApiFrame::TransmitStatus {
            frame_id: FrameId(2),
            status: DeliveryStatus::Success
        }]
    );
    assert_eq!(device.stats().checksum_errors, 1);
    assert_eq!(device.stats().frames, 1);
}

#[test]
fn test_truncated_payload_is_skipped() {
    let (mut device, mut module) = wifi();
    module
        .write_all(&Frame::new(API_AT_COMMAND_RESPONSE, vec![0x01]).encode(Escaping::Disabled).unwrap())
        .unwrap();
    module
        .write_all(&Frame::new(API_MODEM_STATUS, vec![0x00]).encode(Escaping::Disabled).unwrap())
        .unwrap();

    assert_eq!(device.poll_api(), vec![ApiFrame::ModemStatus(ModemStatus::HardwareReset)]);
}

#[test]
fn test_reset_parser_abandons_partial_frame() {
    let (mut device, mut module) = wifi();
    let bytes = Frame::new(API_MODEM_STATUS, vec![0x03]).encode(Escaping::Disabled).unwrap();

    module.write_all(&bytes[..3]).unwrap();
    assert!(device.poll().is_empty());
    device.reset_parser();

    module.write_all(&bytes[3..]).unwrap();
    assert!(device.poll().is_empty());

    module.write_all(&bytes).unwrap();
    assert_eq!(device.poll(), vec![Frame::new(API_MODEM_STATUS, vec![0x03])]);
}

// ============================================================================
// Transport Failures
// ============================================================================

#[test]
fn test_write_failure_leaves_link_usable() {
    let (host, mut module) = ChannelTransport::pair();
    let transport = FlakyTransport {
        inner: host,
        fail_next_write: false,
    };
    let config = DeviceConfig::new("flaky", Family::Wifi);
    let mut device = WifiDevice::new(&config, transport).unwrap();

    // Half of an incoming frame is already buffered by the parser
    let incoming = Frame::new(API_MODEM_STATUS, vec![0x02]).encode(Escaping::Disabled).unwrap();
    module.write_all(&incoming[..3]).unwrap();
    assert!(device.poll().is_empty());

    device.link_mut().transport_mut().fail_next_write = true;
    assert!(matches!(
        device.query("NI"),
        Err(DeviceError::Transport(TransportError::Io(_)))
    ));
    assert_eq!(module.pending(), 0);

    // The next send goes out whole and the pending frame still completes
    let frame_id = device.query("NI").unwrap();
    assert_eq!(frame_id, FrameId(2));
    let sent = received(&mut module, Escaping::Disabled);
    assert_eq!(sent, vec![Frame::new(API_AT_COMMAND, vec![0x02, b'N', b'I'])]);

    module.write_all(&incoming[3..]).unwrap();
    assert_eq!(device.poll(), vec![Frame::new(API_MODEM_STATUS, vec![0x02])]);
}

#[test]
fn test_closed_transport() {
    let (mut device, module) = mesh(ApiMode::Api);
    drop(module);

    assert!(matches!(
        device.query("NI"),
        Err(DeviceError::Transport(TransportError::Closed))
    ));
    assert!(device.poll().is_empty());
}

/// Non-blocking serial stand-in that accepts four bytes per call and refuses the
/// call after each accepted one.
#[derive(Default)]
struct CongestedPort {
    written: Vec<u8>,
    refuse: bool,
}

impl std::io::Read for CongestedPort {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::ErrorKind::WouldBlock.into())
    }
}

impl std::io::Write for CongestedPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.refuse = !self.refuse;
        if !self.refuse {
            return Err(std::io::ErrorKind::WouldBlock.into());
        }
        let n = buf.len().min(4);
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_congested_stream_writes_whole_frames() {
    let config = DeviceConfig::new("sensor", Family::Wifi);
    let mut device = WifiDevice::new(&config, StreamTransport::new(CongestedPort::default())).unwrap();

    assert_eq!(device.query("NI").unwrap(), FrameId(1));
    let destination = SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 20), 9750);
    let data = vec![0x7E; 1398];
    assert_eq!(device.send_ipv4(destination, IpProtocol::Udp, &data).unwrap(), FrameId(2));

    let written = device.link().transport().get_ref().written.clone();
    let frames = FrameParser::new(Escaping::Disabled).feed(&written);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].payload, vec![0x01, b'N', b'I']);
    assert_eq!(frames[1].frame_type, API_TX_IPV4);
    assert!(frames[1].payload.ends_with(&data));
}
