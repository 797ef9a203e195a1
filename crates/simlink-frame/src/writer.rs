use std::io::{ErrorKind, Write};

use crate::error::{FrameError, Result};

/// Writes complete messages to any `Write` stream.
///
/// Each call writes one fully formatted message and flushes, so a host that
/// pipelines commands makes progress message by message.
pub struct MessageWriter<T> {
    inner: T,
}

impl<T: Write> MessageWriter<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Write a complete message, trailing newline included, then flush.
    pub fn write_message(&mut self, message: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < message.len() {
            match self.inner.write(&message[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
