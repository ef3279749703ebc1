//! Mock stream implementation for testing.
//!
//! Provides a `MockStream` that simulates the non-blocking device stream
//! without hardware. Reads drain a byte queue, writes are logged, and both
//! write failures and close failures can be scripted.

use super::error::StreamError;
use super::traits::PortStream;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Inner state of the mock stream, protected by a mutex for interior
/// mutability.
#[derive(Debug, Default)]
struct MockStreamState {
    /// Bytes returned by subsequent read operations.
    read_queue: VecDeque<u8>,
    /// Every write that reached the stream, in order.
    write_log: Vec<Vec<u8>>,
    /// Fail write operations while set.
    fail_writes: bool,
    /// Refuse close requests while set.
    refuse_close: bool,
    /// Whether the stream has been closed.
    closed: bool,
    /// Last response-timeout attribute stored via `set_timeout`.
    timeout: Option<Duration>,
}

/// Mock device stream for tests.
///
/// Clones share state, so a test can keep a handle while the session owns
/// the boxed stream:
///
/// ```
/// use ttyline::stream::{MockStream, PortStream};
///
/// let mut stream = MockStream::new("MOCK0");
/// let probe = stream.clone();
///
/// stream.enqueue_read(b"OK\r\n");
/// let mut buffer = [0u8; 16];
/// let n = stream.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"OK\r\n");
/// assert_eq!(probe.available_bytes(), 0);
/// ```
#[derive(Clone)]
pub struct MockStream {
    name: String,
    state: Arc<Mutex<MockStreamState>>,
}

impl MockStream {
    /// Create a new mock stream with the given identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockStreamState::default())),
        }
    }

    /// Queue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.read_queue.extend(data);
    }

    /// Get a copy of every write that reached the stream.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().write_log.clone()
    }

    /// Fail write operations until called again with `false`.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    /// Refuse close requests until called again with `false`.
    pub fn set_refuse_close(&mut self, refuse: bool) {
        self.state.lock().unwrap().refuse_close = refuse;
    }

    /// Whether the stream has been closed.
    pub fn was_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// Number of queued bytes not yet read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().unwrap().read_queue.len()
    }

    /// The response-timeout attribute last stored via `set_timeout`.
    pub fn stored_timeout(&self) -> Option<Duration> {
        self.state.lock().unwrap().timeout
    }
}

impl PortStream for MockStream {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, StreamError> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(StreamError::Closed);
        }
        if state.fail_writes {
            return Err(StreamError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted write failure",
            )));
        }
        state.write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, StreamError> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(StreamError::Closed);
        }

        let mut bytes_read = 0;
        for slot in buffer.iter_mut() {
            match state.read_queue.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        if bytes_read == 0 {
            // Matches a drained non-blocking descriptor.
            Err(StreamError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "no data available",
            )))
        } else {
            Ok(bytes_read)
        }
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), StreamError> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(StreamError::Closed);
        }
        state.timeout = Some(timeout);
        Ok(())
    }

    fn close(&mut self) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return true;
        }
        if state.refuse_close {
            return false;
        }
        state.closed = true;
        true
    }

    fn path(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MockStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStream")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .field("closed", &self.was_closed())
            .finish()
    }
}
