//! Byte-stream abstraction for the serial device.
//!
//! This module provides:
//! - `PortStream`: the trait the session drives for non-blocking I/O
//! - `FileStream`: the real implementation over an open device node
//! - `MockStream`: a test double with queued reads and a write log
//! - `StreamError`: stream-level errors

mod error;
mod file;
mod mock;
mod traits;

pub use error::StreamError;
pub use file::FileStream;
pub use mock::MockStream;
pub use traits::PortStream;
