//! Stream-specific error types.
//!
//! Defines error types for byte-stream operations, separate from session-level
//! errors to maintain clean separation of concerns.

use thiserror::Error;

/// Errors that can occur on the underlying byte stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The device node could not be opened.
    #[error("unable to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred during stream operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream has already been closed.
    #[error("stream is closed")]
    Closed,
}

impl StreamError {
    /// Create an Open error from a device path.
    pub fn open(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only signals that no data is currently available
    /// from a non-blocking stream.
    pub fn is_quiescent(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}
