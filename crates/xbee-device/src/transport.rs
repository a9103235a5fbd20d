//! The byte transport a link runs over.
//!
//! A transport only needs to write one byte at a time and hand back received bytes
//! without blocking. Opening ports, baud rates and timeouts belong to whoever
//! constructs it.

use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::warn;

use crate::error::TransportError;

/// Ordered, non-blocking byte stream to a module.
pub trait Transport {
    /// Queue one byte for transmission.
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError>;

    /// Next received byte, or `None` if nothing is available right now.
    fn poll_byte(&mut self) -> Option<u8>;

    /// Queue a sequence of bytes, stopping at the first failure.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        (**self).write_byte(byte)
    }

    fn poll_byte(&mut self) -> Option<u8> {
        (**self).poll_byte()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write_all(bytes)
    }
}

/// In-memory transport backed by a pair of channels.
///
/// One end can drive a device while the other plays the module, or the far end can
/// be handed to a thread that owns a real serial port.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: Sender<u8>,
    rx: Receiver<u8>,
}

impl ChannelTransport {
    /// Create two connected ends.
    pub fn pair() -> (ChannelTransport, ChannelTransport) {
        let (a_tx, b_rx) = crossbeam_channel::unbounded();
        let (b_tx, a_rx) = crossbeam_channel::unbounded();
        (
            ChannelTransport { tx: a_tx, rx: a_rx },
            ChannelTransport { tx: b_tx, rx: b_rx },
        )
    }

    /// Number of bytes waiting to be polled.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Drain every byte currently waiting.
    pub fn drain(&mut self) -> Vec<u8> {
        self.rx.try_iter().collect()
    }
}

impl Transport for ChannelTransport {
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        self.tx.send(byte).map_err(|_| TransportError::Closed)
    }

    fn poll_byte(&mut self) -> Option<u8> {
        match self.rx.try_recv() {
            Ok(byte) => Some(byte),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        for &byte in bytes {
            self.tx.send(byte).map_err(|_| TransportError::Closed)?;
        }
        Ok(())
    }
}

/// Transport over any `Read + Write` stream in non-blocking mode.
///
/// The stream must already be non-blocking (for example via `set_nonblocking`);
/// a `WouldBlock` read is reported as no data. Writes are not: `write_all` keeps
/// retrying until the whole frame is out, so a frame is never left half written
/// unless the stream fails or the optional write timeout expires.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
    write_timeout: Option<Duration>,
}

impl<S: Read + Write> StreamTransport<S> {
    /// Wrap a non-blocking stream. Writes wait as long as it takes.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            write_timeout: None,
        }
    }

    /// Give up on a write that cannot finish within `timeout`.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Configured write timeout, if any.
    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout
    }

    fn timed_out(&self, started: Instant) -> bool {
        self.write_timeout
            .is_some_and(|timeout| started.elapsed() >= timeout)
    }

    /// Underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> Transport for StreamTransport<S> {
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        self.write_all(&[byte])
    }

    fn poll_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.stream.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            Ok(_) => None,
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => None,
            Err(e) => {
                warn!(error = %e, "transport read failed");
                None
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let started = Instant::now();
        let mut written = 0;

        while written < bytes.len() {
            match self.stream.write(&bytes[written..]) {
                Ok(0) => return Err(TransportError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if self.timed_out(started) {
                        warn!(written, total = bytes.len(), "transport write timed out");
                        return Err(TransportError::TimedOut {
                            written,
                            total: bytes.len(),
                        });
                    }
                    std::thread::yield_now();
                }
                Err(e) => return Err(io_error(e)),
            }
        }

        loop {
            match self.stream.flush() {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if self.timed_out(started) {
                        warn!(written, total = bytes.len(), "transport flush timed out");
                        return Err(TransportError::TimedOut {
                            written,
                            total: bytes.len(),
                        });
                    }
                    std::thread::yield_now();
                }
                Err(e) => return Err(io_error(e)),
            }
        }
    }
}

fn io_error(e: std::io::Error) -> TransportError {
    if e.kind() == ErrorKind::BrokenPipe {
        TransportError::Closed
    } else {
        TransportError::Io(e)
    }
}
