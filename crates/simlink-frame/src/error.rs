/// Errors that can occur while reading commands or writing messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error on the command or message stream.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An I/O error on the execution script.
    #[error("execution script I/O error: {0}")]
    Script(#[source] std::io::Error),

    /// The command stream ended between commands.
    #[error("unexpected end of input")]
    EndOfInput,

    /// The command stream ended in the middle of a line.
    #[error("read partial line {0:?}")]
    PartialLine(String),

    /// A command line longer than the configured maximum.
    #[error("command line too long ({size} bytes, max {max})")]
    LineTooLong { size: usize, max: usize },

    /// The message stream refused further bytes.
    #[error("message stream closed")]
    ConnectionClosed,

    /// An execution script that does not follow the transcript format.
    #[error("malformed execution script at byte {offset}: {reason}")]
    MalformedScript { offset: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, FrameError>;
