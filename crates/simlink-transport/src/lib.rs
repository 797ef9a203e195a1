//! Process-boundary plumbing for a simulation process.
//!
//! A compiled simulation talks to its host over the stdin/stdout it was
//! launched with, while anything the simulation itself prints must end up in
//! a log file. [`StdioStreams`] performs that swap:
//! - the original stdin and stdout become the command and message streams
//! - fd 1 is pointed at the simulation log
//! - fd 0 is pointed at `/dev/null`

pub mod error;

#[cfg(unix)]
pub mod stdio;

pub mod aslr;

pub use aslr::aslr_disabled;
pub use error::{Result, TransportError};

#[cfg(unix)]
pub use stdio::StdioStreams;
