//! Non-blocking file-backed stream implementation.
//!
//! Opens the device node as a plain byte stream. Baud rate, echo, and the
//! rest of the line discipline are configured out-of-band through `stty`;
//! this type only carries bytes.

use super::error::StreamError;
use super::traits::PortStream;
use crate::mode::OpenMode;
use std::fs::File;
use std::io::{Read, Write};
use std::time::Duration;

/// Byte stream over an open device node.
pub struct FileStream {
    /// The underlying handle; `None` once closed.
    file: Option<File>,
    /// The device path for identification.
    path: String,
    /// Response-timeout attribute. Inert while the handle is non-blocking.
    timeout: Option<Duration>,
}

impl FileStream {
    /// Open the device node at `path` with the given mode.
    ///
    /// The handle is put into non-blocking mode at open time and stays
    /// non-blocking for its whole lifetime. On unix the open also avoids
    /// acquiring the tty as a controlling terminal.
    pub fn open(path: &str, mode: &OpenMode) -> Result<Self, StreamError> {
        let mut opts = mode.open_options();

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY);
        }

        let file = opts.open(path).map_err(|e| StreamError::open(path, e))?;

        Ok(Self {
            file: Some(file),
            path: path.to_string(),
            timeout: None,
        })
    }

    fn file_mut(&mut self) -> Result<&mut File, StreamError> {
        self.file.as_mut().ok_or(StreamError::Closed)
    }
}

impl PortStream for FileStream {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, StreamError> {
        self.file_mut()?.write(data).map_err(StreamError::Io)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, StreamError> {
        self.file_mut()?.read(buffer).map_err(StreamError::Io)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), StreamError> {
        if self.file.is_none() {
            return Err(StreamError::Closed);
        }
        self.timeout = Some(timeout);
        Ok(())
    }

    fn close(&mut self) -> bool {
        // Dropping the handle releases the descriptor; the OS exposes no
        // failure path for plain close that we could report here.
        self.file.take();
        true
    }

    fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for FileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStream")
            .field("path", &self.path)
            .field("open", &self.file.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn temp_device() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fake-tty");
        std::fs::File::create(&path).expect("create backing file");
        (dir, path.to_string_lossy().into_owned())
    }

    #[test]
    fn test_open_missing_path_fails() {
        let mode = OpenMode::parse("r+b").unwrap();
        let result = FileStream::open("/definitely/not/a/device", &mode);
        assert!(matches!(result, Err(StreamError::Open { .. })));
    }

    #[test]
    fn test_write_then_read_back() {
        let (_dir, path) = temp_device();
        let mode = OpenMode::parse("r+b").unwrap();

        let mut stream = FileStream::open(&path, &mode).expect("open");
        let n = stream.write_bytes(b"AT\n").expect("write");
        assert_eq!(n, 3);

        let contents = std::fs::read(&path).expect("read back");
        assert_eq!(contents, b"AT\n");
    }

    #[test]
    fn test_read_at_eof_is_empty() {
        let (_dir, path) = temp_device();
        let mode = OpenMode::parse("r").unwrap();

        let mut stream = FileStream::open(&path, &mode).expect("open");
        let mut buffer = [0u8; 16];
        let n = stream.read_bytes(&mut buffer).expect("read");
        assert_eq!(n, 0);
    }

    #[test]
    fn test_close_is_idempotent_and_poisons_io() {
        let (_dir, path) = temp_device();
        let mode = OpenMode::parse("r+").unwrap();
        let mut stream = FileStream::open(&path, &mode).expect("open");

        assert!(stream.close());
        assert!(stream.close());

        let mut buffer = [0u8; 4];
        assert!(matches!(
            stream.read_bytes(&mut buffer),
            Err(StreamError::Closed)
        ));
        assert!(matches!(
            stream.write_bytes(b"x"),
            Err(StreamError::Closed)
        ));
        assert!(matches!(
            stream.set_timeout(Duration::from_secs(1)),
            Err(StreamError::Closed)
        ));
    }

    #[test]
    fn test_append_mode_appends() {
        let (_dir, path) = temp_device();
        {
            let mut f = std::fs::OpenOptions::new()
                .write(true)
                .open(&path)
                .unwrap();
            f.write_all(b"first\n").unwrap();
        }
        let mode = OpenMode::parse("a").unwrap();
        let mut stream = FileStream::open(&path, &mode).expect("open");
        stream.write_bytes(b"second\n").expect("write");

        let contents = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(contents, "first\nsecond\n");
    }
}
