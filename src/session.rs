//! The serial session lifecycle.
//!
//! `SerialSession` coordinates device configuration, the open byte stream,
//! and buffered line-oriented I/O: configure → open → send/read → close.
//! The session is strictly single-threaded and synchronous; the only
//! suspension point is the timed post-send delay.

use crate::baud;
use crate::configurator::DeviceConfigurator;
use crate::error::{SessionError, SessionResult};
use crate::framing::{self, LINE_TERMINATOR};
use crate::mode::OpenMode;
use crate::runner::{CommandRunner, SystemRunner};
use crate::stream::{FileStream, PortStream};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Chunk size per poll attempt when a byte count is requested.
const COUNTED_CHUNK: usize = 128;

/// Chunk size per poll attempt when no byte count is requested.
const UNCOUNTED_CHUNK: usize = 10;

/// Default post-send delay giving the device time to reply.
pub const DEFAULT_SEND_WAIT: Duration = Duration::from_millis(100);

/// Lifecycle state of a session.
///
/// Transitions run one way: Unconfigured → Configured → Open → Closed.
/// Closed is reachable from Open only, and a closed session is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconfigured,
    Configured,
    Open,
    Closed,
}

/// Diagnostic result of draining the pending write buffer.
///
/// Flushing never errors: a lost write is reported here (and logged) but the
/// no-retry, buffer-discarding behavior is kept. Callers may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Buffered bytes were handed to the stream.
    Flushed,
    /// The write failed; the buffered bytes were discarded anyway.
    WriteFailed,
    /// The port is not open; the buffer was retained.
    NotOpen,
    /// Auto-flush is disabled; the bytes remain buffered.
    Deferred,
    /// Nothing was pending.
    Empty,
}

/// A single serial-port communication session.
///
/// ```
/// use ttyline::{MockRunner, MockStream, SerialSession};
///
/// let runner = MockRunner::new();
/// let mut session = SerialSession::with_runner(Box::new(runner));
/// session.configure("/dev/ttyUSB0")?;
///
/// let mut device = MockStream::new("/dev/ttyUSB0");
/// device.enqueue_read(b"AT\r\nOK\r\n");
/// session.open_with("r+b", Box::new(device))?;
///
/// session.send("AT");
/// let reply = session.read_without_command(None)?.unwrap_or_default();
/// assert_eq!(reply, vec!["OK".to_string()]);
/// # Ok::<(), ttyline::SessionError>(())
/// ```
#[derive(Debug)]
pub struct SerialSession {
    device_path: Option<String>,
    state: SessionState,
    handle: Option<Box<dyn PortStream>>,
    pending: Vec<u8>,
    last_command: Option<String>,
    auto_flush: bool,
    runner: Box<dyn CommandRunner>,
}

impl SerialSession {
    /// Create a session that configures devices through the real `stty`.
    pub fn new() -> Self {
        Self::with_runner(Box::new(SystemRunner::new()))
    }

    /// Create a session with an injected command runner.
    pub fn with_runner(runner: Box<dyn CommandRunner>) -> Self {
        Self {
            device_path: None,
            state: SessionState::Unconfigured,
            handle: None,
            pending: Vec::new(),
            last_command: None,
            auto_flush: true,
            runner,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The configured device path, if any.
    pub fn device_path(&self) -> Option<&str> {
        self.device_path.as_deref()
    }

    /// Whether the port is open.
    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// The most recently sent payload, without its line terminator.
    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    /// Bytes currently waiting in the pending write buffer.
    pub fn pending_bytes(&self) -> usize {
        self.pending.len()
    }

    /// Whether `send` flushes immediately.
    pub fn auto_flush(&self) -> bool {
        self.auto_flush
    }

    /// Enable or disable immediate flushing on `send`.
    pub fn set_auto_flush(&mut self, auto_flush: bool) {
        self.auto_flush = auto_flush;
    }

    /// Validate `device` and put it into raw, non-echoing operation.
    ///
    /// Runs the `stty` validity probe and, on success, disables local echo
    /// and transitions to Configured. Reconfiguring a Configured session is
    /// legal (the stty calls are idempotent per device); configuring while
    /// Open or after Closed is not.
    pub fn configure(&mut self, device: &str) -> SessionResult<()> {
        match self.state {
            SessionState::Open => return Err(SessionError::AlreadyOpen),
            SessionState::Closed => return Err(SessionError::SessionClosed),
            SessionState::Unconfigured | SessionState::Configured => {}
        }

        let configurator = DeviceConfigurator::new(self.runner.as_ref());
        configurator.probe(device)?;
        configurator.disable_echo(device)?;

        self.device_path = Some(device.to_string());
        self.state = SessionState::Configured;
        debug!(device, "session configured");
        Ok(())
    }

    /// Open the configured device as a non-blocking byte stream.
    ///
    /// `mode` must match the `[raw]+?b?` grammar. Opening an already-open
    /// session is a successful no-op.
    pub fn open(&mut self, mode: &str) -> SessionResult<()> {
        let Some(parsed) = self.pre_open(mode)? else {
            return Ok(());
        };
        let path = self.device_path.clone().ok_or(SessionError::NotConfigured)?;
        let stream = FileStream::open(&path, &parsed)
            .map_err(|e| SessionError::port_open(path.as_str(), e))?;
        self.finish_open(Box::new(stream));
        Ok(())
    }

    /// Open with a caller-supplied stream instead of the device node.
    ///
    /// State and mode-grammar checks are identical to [`open`](Self::open);
    /// only the stream construction is replaced. This is the injection seam
    /// for tests and alternate transports.
    pub fn open_with(
        &mut self,
        mode: &str,
        stream: Box<dyn PortStream>,
    ) -> SessionResult<()> {
        if self.pre_open(mode)?.is_none() {
            return Ok(());
        }
        self.finish_open(stream);
        Ok(())
    }

    /// Shared open guards. `Ok(None)` means already open (no-op).
    fn pre_open(&self, mode: &str) -> SessionResult<Option<OpenMode>> {
        if self.state == SessionState::Open {
            return Ok(None);
        }
        if self.state != SessionState::Configured {
            return Err(SessionError::NotConfigured);
        }
        OpenMode::parse(mode)
            .map(Some)
            .ok_or_else(|| SessionError::InvalidMode(mode.to_string()))
    }

    fn finish_open(&mut self, stream: Box<dyn PortStream>) {
        debug!(path = stream.path(), "serial port opened");
        self.handle = Some(stream);
        self.state = SessionState::Open;
    }

    /// Close the stream, best-effort.
    ///
    /// Returns `true` when the port ends up closed (including the not-open
    /// no-op) and `false` when the stream refused to close, in which case
    /// the session stays Open.
    pub fn close(&mut self) -> bool {
        if self.state != SessionState::Open {
            return true;
        }
        let closed = match self.handle.as_mut() {
            Some(handle) => handle.close(),
            None => true,
        };
        if closed {
            self.handle = None;
            self.state = SessionState::Closed;
            debug!("serial port closed");
        } else {
            warn!("closing serial port failed; session stays open");
        }
        closed
    }

    /// Set the device baud rate through the line-discipline utility.
    ///
    /// Legal while Configured or Open. The rate must be on the whitelist.
    pub fn set_baud_rate(&mut self, rate: u32) -> SessionResult<()> {
        if !matches!(self.state, SessionState::Configured | SessionState::Open) {
            return Err(SessionError::NotConfigured);
        }
        if !baud::is_supported(rate) {
            return Err(SessionError::InvalidBaudRate(rate));
        }
        let path = self.device_path.clone().ok_or(SessionError::NotConfigured)?;
        DeviceConfigurator::new(self.runner.as_ref()).set_baud(&path, rate)
    }

    /// Set the stream's response-timeout attribute.
    ///
    /// The stream stays non-blocking for its whole lifetime, so the
    /// attribute is inert in practice; it is stored anyway to keep the
    /// documented contract of the original interface.
    pub fn set_timeout(&mut self, timeout: Duration) -> SessionResult<()> {
        if self.state != SessionState::Open {
            return Err(SessionError::PortNotOpen);
        }
        match self.handle.as_mut() {
            Some(handle) => handle.set_timeout(timeout).map_err(Into::into),
            None => Err(SessionError::PortNotOpen),
        }
    }

    /// Send a newline-terminated command with the default post-send delay.
    pub fn send(&mut self, payload: &str) -> FlushOutcome {
        self.send_with_wait(payload, DEFAULT_SEND_WAIT)
    }

    /// Send a newline-terminated command, then sleep `wait`.
    ///
    /// The payload plus line terminator is appended to the pending buffer
    /// and recorded as the last command. With auto-flush on (the default)
    /// the buffer is drained immediately; the outcome is diagnostic only
    /// and never an error. The delay is a plain timed sleep, not
    /// conditioned on any response.
    pub fn send_with_wait(&mut self, payload: &str, wait: Duration) -> FlushOutcome {
        self.pending.extend_from_slice(payload.as_bytes());
        self.pending.extend_from_slice(LINE_TERMINATOR.as_bytes());
        self.last_command = Some(payload.to_string());

        let outcome = if self.auto_flush {
            self.flush()
        } else {
            FlushOutcome::Deferred
        };

        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        outcome
    }

    /// Drain the pending buffer to the stream.
    ///
    /// Against an open port the buffered bytes are written once and the
    /// buffer is cleared whether the write succeeded or not; lost bytes
    /// are reported in the outcome and logged, never retried. Against a
    /// non-open port nothing is written and the buffer is retained.
    pub fn flush(&mut self) -> FlushOutcome {
        if self.pending.is_empty() {
            return FlushOutcome::Empty;
        }
        if self.state != SessionState::Open {
            return FlushOutcome::NotOpen;
        }
        let Some(handle) = self.handle.as_mut() else {
            return FlushOutcome::NotOpen;
        };

        let result = handle.write_bytes(&self.pending);
        let discarded = std::mem::take(&mut self.pending);
        match result {
            Ok(n) => {
                trace!(bytes = n, "flushed pending buffer");
                FlushOutcome::Flushed
            }
            Err(e) => {
                warn!(
                    error = %e,
                    discarded = discarded.len(),
                    "write flush failed; pending bytes discarded"
                );
                FlushOutcome::WriteFailed
            }
        }
    }

    /// Poll the stream for a response burst and frame it into lines.
    ///
    /// Returns `Ok(None)` when no bytes were accumulated; callers express a
    /// default via `.unwrap_or(...)`. With `count` set, polling reads
    /// 128-byte chunks until the count is exceeded; without it, 10-byte
    /// chunks. Either way the loop continues only while every attempt
    /// returns a completely full chunk; the first short or empty read ends
    /// the burst. This is a heuristic end-of-burst detector, not EOF: a
    /// device that emits exact multiples of the chunk size per polling tick
    /// can terminate it early.
    pub fn read(&mut self, count: Option<usize>) -> SessionResult<Option<Vec<String>>> {
        if self.state != SessionState::Open {
            return Err(SessionError::PortNotOpen);
        }
        let raw = self.accumulate(count)?;
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(framing::frame_lines(&raw)))
    }

    /// [`read`](Self::read), minus the device's echo of the last command.
    ///
    /// Removes at most the first exact occurrence; everything else comes
    /// back in original order. An empty framed response maps to `Ok(None)`
    /// just like an empty burst.
    pub fn read_without_command(
        &mut self,
        count: Option<usize>,
    ) -> SessionResult<Option<Vec<String>>> {
        let Some(lines) = self.read(count)? else {
            return Ok(None);
        };
        if lines.is_empty() {
            return Ok(None);
        }
        match &self.last_command {
            Some(command) => Ok(Some(framing::strip_echo(lines, command))),
            None => Ok(Some(lines)),
        }
    }

    /// The chunked accumulation loop.
    fn accumulate(&mut self, count: Option<usize>) -> SessionResult<Vec<u8>> {
        let handle = self.handle.as_mut().ok_or(SessionError::PortNotOpen)?;
        let mut accumulated: Vec<u8> = Vec::new();
        let mut expected = 0usize;
        let mut chunk_buf = [0u8; COUNTED_CHUNK];

        loop {
            let chunk = match count {
                // Once the expected total exceeds the cap, the remaining
                // request would be non-positive: the burst is over.
                Some(cap) if expected > cap => break,
                Some(_) => COUNTED_CHUNK,
                None => UNCOUNTED_CHUNK,
            };

            let n = match handle.read_bytes(&mut chunk_buf[..chunk]) {
                Ok(n) => n,
                Err(e) if e.is_quiescent() => 0,
                Err(e) => return Err(e.into()),
            };
            accumulated.extend_from_slice(&chunk_buf[..n]);
            expected += chunk;

            // Continue only while every attempt so far filled its chunk.
            if expected != accumulated.len() {
                break;
            }
        }

        trace!(bytes = accumulated.len(), "accumulated response burst");
        Ok(accumulated)
    }
}

impl Default for SerialSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SerialSession {
    fn drop(&mut self) {
        if self.state == SessionState::Open {
            if let Some(handle) = self.handle.as_mut() {
                if !handle.close() {
                    warn!("stream refused to close during teardown; releasing handle anyway");
                }
            }
            // The handle is released on every teardown path.
            self.handle = None;
            self.state = SessionState::Closed;
        }
    }
}
