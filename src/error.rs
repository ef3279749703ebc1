//! Session-level error types.
//!
//! One variant per operation failure kind. Stream-level errors live in
//! `stream::StreamError` and are wrapped here when they cross into the
//! session API.

use crate::stream::StreamError;
use thiserror::Error;

/// Errors surfaced by session operations.
///
/// Every failure is reported synchronously at the point of violation; no
/// operation retries internally. Flush failures inside `send` are not
/// errors at all; they surface as a [`FlushOutcome`](crate::FlushOutcome)
/// diagnostic instead.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The device path did not pass the `stty` validity probe.
    #[error("specified serial device {0:?} is not valid")]
    InvalidDevice(String),

    /// Configuration was attempted while the port is open.
    #[error("serial port is already open")]
    AlreadyOpen,

    /// The session has been closed and cannot be reused.
    #[error("session is closed")]
    SessionClosed,

    /// The operation requires a configured device.
    #[error("serial device must be configured first")]
    NotConfigured,

    /// The open-mode token does not match the `[raw]+?b?` grammar.
    #[error("invalid opening mode {0:?}; use fopen() modes")]
    InvalidMode(String),

    /// The device node could not be opened as a stream.
    #[error("unable to open serial port {path}")]
    PortOpen {
        path: String,
        #[source]
        source: StreamError,
    },

    /// The requested baud rate is not in the whitelist.
    #[error("invalid baud rate {0}")]
    InvalidBaudRate(u32),

    /// The `stty` baud-rate call exited nonzero.
    #[error("unable to set baud rate: {stdout}{stderr}")]
    BaudRateSet { stdout: String, stderr: String },

    /// The operation requires an open port.
    #[error("serial port is not open")]
    PortNotOpen,

    /// The line-discipline utility could not be spawned at all.
    #[error("failed to invoke line-discipline utility: {0}")]
    CommandFailed(#[source] std::io::Error),

    /// A stream I/O error that is not plain quiescence.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl SessionError {
    /// Create a PortOpen error from a device path.
    pub fn port_open(path: impl Into<String>, source: StreamError) -> Self {
        Self::PortOpen {
            path: path.into(),
            source,
        }
    }
}

/// A specialized `Result` type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::InvalidDevice("/dev/ttyS9".into());
        assert_eq!(
            err.to_string(),
            "specified serial device \"/dev/ttyS9\" is not valid"
        );

        let err = SessionError::InvalidMode("rw".into());
        assert!(err.to_string().contains("fopen() modes"));

        let err = SessionError::BaudRateSet {
            stdout: String::new(),
            stderr: "stty: invalid argument".into(),
        };
        assert!(err.to_string().contains("invalid argument"));

        assert_eq!(
            SessionError::PortNotOpen.to_string(),
            "serial port is not open"
        );
    }

    #[test]
    fn test_stream_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: SessionError = StreamError::Io(io).into();
        assert!(matches!(err, SessionError::Stream(_)));
    }
}
