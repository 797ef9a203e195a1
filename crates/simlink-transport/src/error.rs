use std::path::PathBuf;

/// Errors that can occur while rebinding the process's standard streams.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to duplicate an original standard stream.
    #[error("failed to duplicate {stream}: {source}")]
    Duplicate {
        stream: &'static str,
        source: std::io::Error,
    },

    /// Failed to point a standard stream at a file.
    #[error("failed to redirect {stream} to {}: {source}", path.display())]
    Redirect {
        stream: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TransportError>;
