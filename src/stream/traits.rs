//! Core trait for the byte-stream abstraction.
//!
//! Defines the `PortStream` trait that allows both real device streams and
//! mock implementations to be used interchangeably by the session.

use super::error::StreamError;
use std::time::Duration;

/// Trait for non-blocking byte-stream I/O against a serial device.
///
/// The session owns exactly one boxed `PortStream` while it is open. Real
/// streams wrap a file handle put into non-blocking mode at open time; mocks
/// simulate the same contract for tests.
pub trait PortStream: Send + std::fmt::Debug {
    /// Write bytes to the stream.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, StreamError>;

    /// Read bytes from the stream into the provided buffer.
    ///
    /// Returns the number of bytes actually read. On a non-blocking stream
    /// with no data pending, implementations return either `Ok(0)` or an
    /// `Io` error whose kind is `WouldBlock`.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, StreamError>;

    /// Set the stream's response-timeout attribute.
    ///
    /// Only consulted if the stream is ever used in blocking mode. Streams
    /// opened by this crate stay non-blocking for their whole lifetime, so
    /// the attribute is inert in practice; it is stored anyway to keep the
    /// documented contract of the original interface.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), StreamError>;

    /// Close the stream, releasing the underlying handle.
    ///
    /// Closing is best-effort: a `false` return reports failure without an
    /// error value, and the stream may be retried or abandoned. Closing an
    /// already-closed stream returns `true`.
    fn close(&mut self) -> bool {
        true
    }

    /// The device path (or mock identifier) this stream is attached to.
    fn path(&self) -> &str;
}
