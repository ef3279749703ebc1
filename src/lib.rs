//! ttyline
//!
//! Line-oriented serial port sessions over stty-configured non-blocking
//! streams: configure a device for raw (non-echoing) operation, open it as a
//! byte stream, send newline-terminated commands, and read framed responses
//! back with the device's command echo filtered out.
//!
//! # Modules
//!
//! - `session`: the `SerialSession` lifecycle (configure → open → send/read → close)
//! - `stream`: byte-stream abstraction (`PortStream`, `FileStream`, `MockStream`)
//! - `runner`: pluggable external-process invocation (`stty`)
//! - `configurator`: the line-discipline calls built on a runner
//! - `mode`: `fopen`-style open-mode grammar
//! - `framing`: response framing and echo filtering
//! - `baud`: baud-rate whitelist
//! - `config`: TOML configuration with environment overrides
//! - `error`: session-level error handling

pub mod baud;
pub mod config;
pub mod configurator;
pub mod error;
pub mod framing;
pub mod mode;
pub mod runner;
pub mod session;
pub mod stream;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
pub use error::{SessionError, SessionResult};
pub use framing::LINE_TERMINATOR;
pub use mode::OpenMode;
pub use runner::{CommandRunner, ExecOutput, MockRunner, SystemRunner};
pub use session::{FlushOutcome, SerialSession, SessionState, DEFAULT_SEND_WAIT};
pub use stream::{FileStream, MockStream, PortStream, StreamError};
