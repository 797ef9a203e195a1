use std::path::PathBuf;

use simlink_bits::BitsError;
use simlink_frame::FrameError;
use simlink_transport::TransportError;

use crate::config::ConfigError;

/// Errors that end a simulation session.
///
/// The `Display` text is what the host receives in the `e` message, so every
/// variant renders as a single line.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Reading a command or writing a message failed.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The standard streams could not be rebound.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The environment held an unusable setting.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A command line starting with an unknown character.
    #[error("unknown opcode {0:?}")]
    UnknownOpcode(char),

    /// A command that does not follow its grammar.
    #[error("{0}")]
    Syntax(String),

    /// A count or id field with no hex digits.
    #[error("could not scan integer while {context}")]
    MissingInteger { context: &'static str },

    /// A count or id field beyond `i32::MAX`.
    #[error("scanned out-of-bounds integer while {context}")]
    IntegerOutOfRange { context: &'static str },

    /// A count or id field with a sign.
    #[error("scanned negative integer while {context}")]
    NegativeInteger { context: &'static str },

    /// A port value that could not be decoded or encoded.
    #[error("{source} when {context}")]
    Value {
        context: &'static str,
        #[source]
        source: BitsError,
    },

    /// The engine does not know the port.
    #[error("invalid port ID '{id:X}' when {context}")]
    InvalidPort { id: u32, context: &'static str },

    /// The engine reported a non-positive width.
    #[error("encountered port {id:X} with invalid bit width {width} when {context}")]
    InvalidPortWidth {
        id: u32,
        width: i32,
        context: &'static str,
    },

    /// The simulation log could not be opened.
    #[error("could not open log file '{}': {source}", path.display())]
    LogOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The simulation log could not be read.
    #[error("failed to gather log: {0}")]
    LogRead(#[source] std::io::Error),

    /// The simulation log shrank below the read cursor.
    #[error("log file shrank from {cursor} to {end} bytes")]
    LogTruncated { cursor: u64, end: u64 },

    /// More unread log than an 8-hex-digit count can describe.
    #[error("log is too long to be encoded as a single `LOG` message ({0} bytes)")]
    LogTooLarge(u64),

    /// The execution script could not be created.
    #[error("failed to open execution script '{}' for writing: {source}", path.display())]
    ScriptOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The backend was expected to disable address-space randomization.
    #[error("backend did not relaunch the executable with ASLR disabled as expected")]
    AslrEnabled,
}

pub type Result<T> = std::result::Result<T, DriverError>;
