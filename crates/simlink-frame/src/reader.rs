use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Default maximum command line length: 64 MiB.
pub const DEFAULT_MAX_LINE: usize = 64 * 1024 * 1024;

/// Configuration for the command line reader.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Maximum line length in bytes, newline included. Default: 64 MiB.
    pub max_line_len: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE,
        }
    }
}

/// Reads complete `\n`-terminated command lines from any `Read` stream.
///
/// Handles partial reads internally. Bytes following a line stay buffered for
/// the next call, so a host may pipeline any number of commands.
pub struct LineReader<T> {
    inner: T,
    buf: BytesMut,
    /// Prefix of `buf` already known to contain no newline.
    scanned: usize,
    config: ReaderConfig,
}

impl<T: Read> LineReader<T> {
    /// Create a new line reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Create a new line reader with explicit configuration.
    pub fn with_config(inner: T, config: ReaderConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            scanned: 0,
            config,
        }
    }

    /// Read the next complete line, trailing `\n` included (blocking).
    ///
    /// Returns `Err(FrameError::EndOfInput)` when the stream ends between
    /// lines and `Err(FrameError::PartialLine)` when it ends inside one.
    pub fn read_line(&mut self) -> Result<Bytes> {
        loop {
            if let Some(pos) = self.buf[self.scanned..].iter().position(|&b| b == b'\n') {
                let end = self.scanned + pos + 1;
                if end > self.config.max_line_len {
                    return Err(FrameError::LineTooLong {
                        size: end,
                        max: self.config.max_line_len,
                    });
                }
                self.scanned = 0;
                return Ok(self.buf.split_to(end).freeze());
            }
            self.scanned = self.buf.len();
            if self.scanned >= self.config.max_line_len {
                return Err(FrameError::LineTooLong {
                    size: self.scanned,
                    max: self.config.max_line_len,
                });
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() {
                    return Err(FrameError::EndOfInput);
                }
                let partial = String::from_utf8_lossy(&self.buf).into_owned();
                return Err(FrameError::PartialLine(partial));
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }
}
