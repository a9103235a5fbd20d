//! Shared link core.
//!
//! A [`Link`] owns everything one serial connection needs: the transport, a frame
//! builder and parser configured for the connection's escaping, the module family,
//! a frame ID allocator and the metric labels. The family drivers wrap a link by
//! value and expose only the requests their family accepts.

use tracing::{debug, trace, warn};
use xbee_api::{
    frame_type_name, ApiFrame, Escaping, Family, Frame, FrameBuilder, FrameId, FrameIdAllocator,
    FrameParser, ParserStats, ProtocolError, Request,
};
use xbee_metrics::{metric_defs, MetricLabels};

use crate::config::DeviceConfig;
use crate::error::DeviceResult;
use crate::transport::Transport;

/// One framed connection to a module.
#[derive(Debug)]
pub struct Link<T> {
    name: String,
    family: Family,
    transport: T,
    builder: FrameBuilder,
    parser: FrameParser,
    frame_ids: FrameIdAllocator,
    labels: MetricLabels,
    max_bytes_per_poll: usize,
    /// Discarded-byte count already reported as a metric.
    reported_discarded: u64,
}

impl<T: Transport> Link<T> {
    /// Create a link from a validated configuration.
    pub fn new(config: &DeviceConfig, transport: T) -> DeviceResult<Self> {
        config.validate()?;
        let escaping = config.escaping()?;

        debug!(
            device = %config.name,
            family = %config.family,
            escaped = escaping.is_enabled(),
            max_frame_length = config.max_frame_length,
            "opening link"
        );

        Ok(Self {
            name: config.name.clone(),
            family: config.family,
            transport,
            builder: FrameBuilder::new(escaping),
            parser: FrameParser::with_max_frame_length(escaping, config.max_frame_length),
            frame_ids: FrameIdAllocator::new(),
            labels: MetricLabels::new(config.name.clone(), config.family.as_str()),
            max_bytes_per_poll: config.max_bytes_per_poll,
            reported_discarded: 0,
        })
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module family.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Escaping setting of the connection.
    pub fn escaping(&self) -> Escaping {
        self.builder.escaping()
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The underlying transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the link, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Allocate the next frame ID.
    pub fn next_frame_id(&mut self) -> FrameId {
        self.frame_ids.next_id()
    }

    /// Validate, encode and write a request.
    ///
    /// The complete byte sequence is produced before the first write, so a rejected
    /// request writes nothing. A transport failure fails this send only; the parser
    /// and allocator are unaffected.
    pub fn send(&mut self, request: &Request) -> DeviceResult<FrameId> {
        let frame_type = request.name();

        let bytes = match request.encode(self.family, self.builder.escaping()) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(device = %self.name, frame_type, error = %e, "request rejected");
                metrics::counter!(
                    metric_defs::LINK_TX_REJECTED.name,
                    &self.labels.with_frame_type(frame_type)
                )
                .increment(1);
                return Err(e.into());
            }
        };

        if let Err(e) = self.transport.write_all(&bytes) {
            warn!(device = %self.name, frame_type, error = %e, "transport write failed");
            metrics::counter!(metric_defs::LINK_TX_FAILURES.name, &self.labels.to_labels())
                .increment(1);
            return Err(e.into());
        }

        let frame_id = request.frame_id();
        debug!(
            device = %self.name,
            frame_type,
            frame_id = frame_id.value(),
            bytes = bytes.len(),
            "sent frame"
        );

        let labels = self.labels.to_labels();
        metrics::counter!(
            metric_defs::LINK_TX_FRAMES.name,
            &self.labels.with_frame_type(frame_type)
        )
        .increment(1);
        metrics::counter!(metric_defs::LINK_TX_BYTES.name, &labels).increment(bytes.len() as u64);
        metrics::histogram!(metric_defs::LINK_TX_FRAME_SIZE.name, &labels).record(bytes.len() as f64);

        Ok(frame_id)
    }

    /// Read the bytes the transport has available, up to the configured per-poll
    /// budget, and return the frames they complete.
    ///
    /// Never blocks. Corrupt frames are dropped, logged and counted.
    pub fn poll(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();

        for _ in 0..self.max_bytes_per_poll {
            let Some(byte) = self.transport.poll_byte() else {
                break;
            };
            match self.parser.push_byte(byte) {
                Ok(Some(frame)) => {
                    let frame_type = frame_type_name(frame.frame_type);
                    trace!(
                        device = %self.name,
                        frame_type,
                        length = frame.length(),
                        "received frame"
                    );
                    metrics::counter!(
                        metric_defs::LINK_RX_FRAMES.name,
                        &self.labels.with_frame_type(frame_type)
                    )
                    .increment(1);
                    frames.push(frame);
                }
                Ok(None) => {}
                Err(e) => self.record_drop(&e),
            }
        }

        let discarded = self.parser.stats().discarded_bytes;
        if discarded > self.reported_discarded {
            metrics::counter!(metric_defs::LINK_RX_DISCARDED_BYTES.name, &self.labels.to_labels())
                .increment(discarded - self.reported_discarded);
            self.reported_discarded = discarded;
        }

        frames
    }

    /// Like [`Link::poll`], decoding each frame by type.
    ///
    /// Frames too short for their type are logged and skipped.
    pub fn poll_api(&mut self) -> Vec<ApiFrame> {
        let frames = self.poll();
        let mut decoded = Vec::with_capacity(frames.len());

        for frame in &frames {
            match ApiFrame::decode(frame) {
                Ok(api) => decoded.push(api),
                Err(e) => {
                    debug!(
                        device = %self.name,
                        frame_type = frame_type_name(frame.frame_type),
                        error = %e,
                        "undecodable frame"
                    );
                    metrics::counter!(metric_defs::LINK_RX_MALFORMED.name, &self.labels.to_labels())
                        .increment(1);
                }
            }
        }

        decoded
    }

    /// Abandon any partially received frame.
    pub fn reset_parser(&mut self) {
        self.parser.reset();
    }

    /// Parser counters.
    pub fn stats(&self) -> ParserStats {
        self.parser.stats()
    }

    fn record_drop(&self, error: &ProtocolError) {
        debug!(device = %self.name, error = %error, "dropped frame");

        let metric = match error {
            ProtocolError::ChecksumMismatch { .. } => &metric_defs::LINK_RX_CHECKSUM_ERRORS,
            ProtocolError::FrameTooLarge { .. } => &metric_defs::LINK_RX_OVERSIZE,
            ProtocolError::EmptyFrame => &metric_defs::LINK_RX_EMPTY,
            ProtocolError::Interrupted { .. } => &metric_defs::LINK_RX_INTERRUPTED,
            _ => return,
        };
        metrics::counter!(metric.name, &self.labels.to_labels()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ChannelTransport;
    use xbee_api::{ApiMode, API_MODEM_STATUS};

    fn link(family: Family) -> (Link<ChannelTransport>, ChannelTransport) {
        let (host, module) = ChannelTransport::pair();
        let config = DeviceConfig::new("test", family);
        (Link::new(&config, host).unwrap(), module)
    }

    #[test]
    fn test_transparent_config_rejected() {
        let (host, _module) = ChannelTransport::pair();
        let config = DeviceConfig::new("test", Family::Wifi).with_api_mode(ApiMode::Transparent);
        assert!(Link::new(&config, host).is_err());
    }

    #[test]
    fn test_frame_ids_cycle() {
        let (mut link, _module) = link(Family::Mesh);
        assert_eq!(link.next_frame_id(), FrameId(1));
        assert_eq!(link.next_frame_id(), FrameId(2));
        for _ in 0..253 {
            link.next_frame_id();
        }
        assert_eq!(link.next_frame_id(), FrameId(1));
    }

    #[test]
    fn test_poll_counts_discarded_bytes() {
        let (mut link, mut module) = link(Family::Wifi);
        module.write_all(&[0x01, 0x02]).unwrap();
        module
            .write_all(&Frame::new(API_MODEM_STATUS, vec![0x00]).encode(Escaping::Disabled).unwrap())
            .unwrap();

        let frames = link.poll();
        assert_eq!(frames, vec![Frame::new(API_MODEM_STATUS, vec![0x00])]);
        assert_eq!(link.stats().discarded_bytes, 2);
        assert_eq!(link.reported_discarded, 2);
        assert!(link.poll().is_empty());
    }

    /// Transport whose receive side never runs dry.
    struct Endless {
        polled: usize,
    }

    impl Transport for Endless {
        fn write_byte(&mut self, _byte: u8) -> Result<(), crate::error::TransportError> {
            Ok(())
        }

        fn poll_byte(&mut self) -> Option<u8> {
            self.polled += 1;
            Some(0x00)
        }
    }

    #[test]
    fn test_poll_returns_on_endless_stream() {
        let config = DeviceConfig::new("busy", Family::Wifi).with_max_bytes_per_poll(64);
        let mut link = Link::new(&config, Endless { polled: 0 }).unwrap();

        assert!(link.poll().is_empty());
        assert_eq!(link.transport().polled, 64);
        assert!(link.poll().is_empty());
        assert_eq!(link.transport().polled, 128);
        assert_eq!(link.stats().discarded_bytes, 128);
    }

    #[test]
    fn test_poll_budget_resumes_partial_frame() {
        let (host, mut module) = ChannelTransport::pair();
        let config = DeviceConfig::new("test", Family::Wifi).with_max_bytes_per_poll(3);
        let mut link = Link::new(&config, host).unwrap();

        let frame = Frame::new(API_MODEM_STATUS, vec![0x06]);
        module.write_all(&frame.encode(Escaping::Disabled).unwrap()).unwrap();

        assert!(link.poll().is_empty());
        assert_eq!(link.transport().pending(), 3);
        assert_eq!(link.poll(), vec![frame]);
        assert_eq!(link.transport().pending(), 0);
    }

    #[test]
    fn test_accessors() {
        let (link, _module) = link(Family::Mesh);
        assert_eq!(link.name(), "test");
        assert_eq!(link.family(), Family::Mesh);
        assert_eq!(link.escaping(), Escaping::Disabled);
        assert_eq!(link.transport().pending(), 0);
    }
}
