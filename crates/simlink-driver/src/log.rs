use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{DriverError, Result};

/// Incremental reader of the simulation log.
///
/// Each [`tail`](LogTailer::tail) returns the bytes appended since the
/// previous one, so concatenating every tail reproduces the file.
#[derive(Debug)]
pub struct LogTailer {
    path: PathBuf,
    file: Option<File>,
    cursor: u64,
}

impl LogTailer {
    /// The file is opened on the first tail, not here.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            cursor: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes already returned.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Return everything appended since the last call.
    ///
    /// Only bytes that have reached the file are seen; the caller flushes the
    /// engine's output first.
    pub fn tail(&mut self) -> Result<Vec<u8>> {
        let file = match self.file.take() {
            Some(file) => file,
            None => File::open(&self.path).map_err(|source| DriverError::LogOpen {
                path: self.path.clone(),
                source,
            })?,
        };
        let file = self.file.insert(file);

        let end = file.seek(SeekFrom::End(0)).map_err(DriverError::LogRead)?;
        if end < self.cursor {
            return Err(DriverError::LogTruncated {
                cursor: self.cursor,
                end,
            });
        }
        let readable = end - self.cursor;
        if readable > u64::from(u32::MAX) {
            return Err(DriverError::LogTooLarge(readable));
        }
        let len = usize::try_from(readable).map_err(|_| DriverError::LogTooLarge(readable))?;

        file.seek(SeekFrom::Start(self.cursor))
            .map_err(DriverError::LogRead)?;
        let mut data = vec![0u8; len];
        file.read_exact(&mut data).map_err(DriverError::LogRead)?;
        self.cursor = end;

        tracing::debug!(bytes = len, cursor = end, "gathered simulation log");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use std::fs::OpenOptions;
    use std::io::Write;

    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("simlink-log-{tag}-{}", std::process::id()))
    }

    fn append(path: &Path, data: &[u8]) {
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .unwrap()
            .write_all(data)
            .unwrap();
    }

    #[test]
    fn tails_concatenate_to_file_contents() {
        let path = temp_path("concat");
        std::fs::write(&path, b"").unwrap();
        let mut tailer = LogTailer::new(&path);

        append(&path, b"hello\n");
        assert_eq!(tailer.tail().unwrap(), b"hello\n");
        append(&path, b"world");
        assert_eq!(tailer.tail().unwrap(), b"world");
        assert_eq!(tailer.tail().unwrap(), b"");
        assert_eq!(tailer.cursor(), 11);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_log_is_an_open_error() {
        let path = temp_path("missing");
        let _ = std::fs::remove_file(&path);
        let mut tailer = LogTailer::new(&path);
        assert!(matches!(tailer.tail(), Err(DriverError::LogOpen { .. })));
    }

    #[test]
    fn open_is_retried_after_failure() {
        let path = temp_path("late");
        let _ = std::fs::remove_file(&path);
        let mut tailer = LogTailer::new(&path);
        assert!(tailer.tail().is_err());

        append(&path, b"late\n");
        assert_eq!(tailer.tail().unwrap(), b"late\n");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn shrinking_log_is_reported() {
        let path = temp_path("shrink");
        std::fs::write(&path, b"0123456789").unwrap();
        let mut tailer = LogTailer::new(&path);
        assert_eq!(tailer.tail().unwrap().len(), 10);

        std::fs::write(&path, b"01").unwrap();
        assert!(matches!(
            tailer.tail(),
            Err(DriverError::LogTruncated { cursor: 10, end: 2 })
        ));

        let _ = std::fs::remove_file(&path);
    }
}
