//! Line framing for the simlink control protocol.
//!
//! Commands arrive as single `\n`-terminated lines. Messages leave as
//! `<code> <body>\n`, written and flushed as one unit so a pipelining host
//! always sees whole messages. The only body that may contain newlines is a
//! `LOG` tail, which carries its own 8-hex-digit byte count.
//!
//! [`Link`] ties a command reader and a message writer to an optional
//! [`ExecutionScript`] so the transcript is produced by the same code path as
//! the wire bytes.

pub mod code;
pub mod error;
pub mod link;
pub mod reader;
pub mod script;
pub mod writer;

pub use code::{CommandCode, MessageCode};
pub use error::{FrameError, Result};
pub use link::Link;
pub use reader::{LineReader, ReaderConfig, DEFAULT_MAX_LINE};
pub use script::{parse_script, ExecutionScript, ScriptEntry};
pub use writer::MessageWriter;
