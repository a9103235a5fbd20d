//! Metrics for XBee serial links.
//!
//! Every metric a link records is declared here as a [`Metric`] constant so names,
//! units and label keys live in one place. The crate re-exports `metrics`; install
//! any recorder and call [`describe_metrics`] once at startup.
//!
//! # Example
//!
//! ```rust,ignore
//! use xbee_metrics::{describe_metrics, metric_defs, MetricLabels};
//!
//! describe_metrics();
//!
//! let labels = MetricLabels::new("coordinator", "mesh");
//! metrics::counter!(metric_defs::LINK_TX_FRAMES.name, &labels.to_labels()).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_histogram, Unit};

/// The kind of metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A histogram for recording distributions.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// ```rust
/// use xbee_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const FRAMES: Metric = Metric::counter("xbee.example.frames")
///     .with_description("Frames seen")
///     .with_unit(Unit::Count)
///     .with_labels(&["device"]);
///
/// assert_eq!(FRAMES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "xbee.link.tx_frames").
    pub name: &'static str,
    /// Counter or histogram.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// Unit of measurement, if any.
    pub unit: Option<Unit>,
    /// Label keys recorded with this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    /// Declares a counter.
    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Counter,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Declares a histogram.
    pub const fn histogram(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Histogram,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Sets the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the label keys.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Label Keys
    // ========================================================================

    /// Labels present on every link metric.
    pub const LINK_LABELS: &[&str] = &["device", "family"];

    /// Link labels plus the frame type name.
    pub const FRAME_TYPE_LABELS: &[&str] = &["device", "family", "frame_type"];

    // ========================================================================
    // Transmit
    // ========================================================================

    /// Frames written to the transport.
    ///
    /// Labels: device, family, frame_type
    pub const LINK_TX_FRAMES: Metric = Metric::counter("xbee.link.tx_frames")
        .with_description("Frames written to the transport")
        .with_unit(Unit::Count)
        .with_labels(FRAME_TYPE_LABELS);

    /// Encoded bytes written to the transport, escape bytes included.
    pub const LINK_TX_BYTES: Metric = Metric::counter("xbee.link.tx_bytes")
        .with_description("Encoded bytes written to the transport")
        .with_unit(Unit::Bytes)
        .with_labels(LINK_LABELS);

    /// Requests rejected before anything was written.
    ///
    /// Labels: device, family, frame_type
    pub const LINK_TX_REJECTED: Metric = Metric::counter("xbee.link.tx_rejected")
        .with_description("Requests rejected by validation before any write")
        .with_unit(Unit::Count)
        .with_labels(FRAME_TYPE_LABELS);

    /// Sends that failed in the transport.
    pub const LINK_TX_FAILURES: Metric = Metric::counter("xbee.link.tx_failures")
        .with_description("Sends that failed with a transport error")
        .with_unit(Unit::Count)
        .with_labels(LINK_LABELS);

    /// Encoded frame size.
    pub const LINK_TX_FRAME_SIZE: Metric = Metric::histogram("xbee.link.tx_frame_size_bytes")
        .with_description("Encoded size of transmitted frames in bytes")
        .with_unit(Unit::Bytes)
        .with_labels(LINK_LABELS);

    // ========================================================================
    // Receive
    // ========================================================================

    /// Valid frames decoded.
    ///
    /// Labels: device, family, frame_type
    pub const LINK_RX_FRAMES: Metric = Metric::counter("xbee.link.rx_frames")
        .with_description("Valid frames decoded")
        .with_unit(Unit::Count)
        .with_labels(FRAME_TYPE_LABELS);

    /// Frames dropped for a bad checksum.
    pub const LINK_RX_CHECKSUM_ERRORS: Metric = Metric::counter("xbee.link.rx_checksum_errors")
        .with_description("Frames dropped because the checksum did not match")
        .with_unit(Unit::Count)
        .with_labels(LINK_LABELS);

    /// Frames dropped for a declared length above the maximum.
    pub const LINK_RX_OVERSIZE: Metric = Metric::counter("xbee.link.rx_oversize")
        .with_description("Frames dropped because the declared length exceeded the maximum")
        .with_unit(Unit::Count)
        .with_labels(LINK_LABELS);

    /// Frames dropped for a declared length of zero.
    pub const LINK_RX_EMPTY: Metric = Metric::counter("xbee.link.rx_empty")
        .with_description("Frames dropped because the declared length was zero")
        .with_unit(Unit::Count)
        .with_labels(LINK_LABELS);

    /// Frames abandoned when a new delimiter arrived.
    pub const LINK_RX_INTERRUPTED: Metric = Metric::counter("xbee.link.rx_interrupted")
        .with_description("Frames abandoned because a new delimiter arrived")
        .with_unit(Unit::Count)
        .with_labels(LINK_LABELS);

    /// Frames whose payload was too short for their type.
    pub const LINK_RX_MALFORMED: Metric = Metric::counter("xbee.link.rx_malformed")
        .with_description("Valid frames whose payload could not be decoded")
        .with_unit(Unit::Count)
        .with_labels(LINK_LABELS);

    /// Bytes skipped while hunting for a delimiter.
    pub const LINK_RX_DISCARDED_BYTES: Metric = Metric::counter("xbee.link.rx_discarded_bytes")
        .with_description("Bytes skipped while searching for a frame delimiter")
        .with_unit(Unit::Bytes)
        .with_labels(LINK_LABELS);

    /// Returns a slice of all defined metrics.
    pub const ALL: &[&Metric] = &[
        // Transmit
        &LINK_TX_FRAMES,
        &LINK_TX_BYTES,
        &LINK_TX_REJECTED,
        &LINK_TX_FAILURES,
        &LINK_TX_FRAME_SIZE,
        // Receive
        &LINK_RX_FRAMES,
        &LINK_RX_CHECKSUM_ERRORS,
        &LINK_RX_OVERSIZE,
        &LINK_RX_EMPTY,
        &LINK_RX_INTERRUPTED,
        &LINK_RX_MALFORMED,
        &LINK_RX_DISCARDED_BYTES,
    ];
}

/// Labels identifying the link a metric belongs to.
///
/// ```rust
/// use xbee_metrics::MetricLabels;
///
/// let labels = MetricLabels::new("sensor-7", "wifi");
/// let extended = labels.with(&[("frame_type", "tx64_request".to_string())]);
/// assert_eq!(extended.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLabels {
    /// Configured device name.
    pub device: String,
    /// Module family (mesh, wifi).
    pub family: String,
}

impl MetricLabels {
    /// Creates labels for a device.
    pub fn new(device: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            family: family.into(),
        }
    }

    /// Converts the labels to the `metrics` crate label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![("device", self.device.clone()), ("family", self.family.clone())]
    }

    /// Returns labels with additional key-value pairs.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }

    /// Returns labels with the frame type added.
    pub fn with_frame_type(&self, frame_type: &'static str) -> Vec<(&'static str, String)> {
        self.with(&[("frame_type", frame_type.to_string())])
    }
}

/// Describes all link metrics.
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
