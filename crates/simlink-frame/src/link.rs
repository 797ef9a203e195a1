use std::fs::File;
use std::io::{Read, Write};

use bytes::{Bytes, BytesMut};

use crate::code::MessageCode;
use crate::error::{FrameError, Result};
use crate::reader::LineReader;
use crate::script::ExecutionScript;
use crate::writer::MessageWriter;

const INITIAL_MESSAGE_CAPACITY: usize = 256;

/// Both directions of the protocol plus the optional execution script.
///
/// Messages are assembled with [`begin`](Link::begin), [`push`](Link::push)
/// and [`end`](Link::end). Nothing reaches either sink until `end`, which
/// writes the finished message to the message stream and then to the script,
/// so the two never disagree about what was sent.
pub struct Link<R, W, S = File> {
    reader: LineReader<R>,
    writer: MessageWriter<W>,
    script: Option<ExecutionScript<S>>,
    pending: BytesMut,
}

impl<R: Read, W: Write> Link<R, W, File> {
    /// A link without an execution script.
    pub fn new(commands: R, messages: W) -> Self {
        Self::build(commands, messages, None)
    }
}

impl<R: Read, W: Write, S: Write> Link<R, W, S> {
    /// A link that records every command and message to `script`.
    pub fn with_script(commands: R, messages: W, script: ExecutionScript<S>) -> Self {
        Self::build(commands, messages, Some(script))
    }

    fn build(commands: R, messages: W, script: Option<ExecutionScript<S>>) -> Self {
        Self {
            reader: LineReader::new(commands),
            writer: MessageWriter::new(messages),
            script,
            pending: BytesMut::with_capacity(INITIAL_MESSAGE_CAPACITY),
        }
    }

    /// Read the next command line, trailing `\n` included, and record it.
    ///
    /// A partial final line is still recorded, newline-terminated, before its
    /// error is returned.
    pub fn read_command(&mut self) -> Result<Bytes> {
        let line = match self.reader.read_line() {
            Ok(line) => line,
            Err(FrameError::PartialLine(partial)) => {
                if let Some(script) = self.script.as_mut() {
                    let mut line = partial.clone().into_bytes();
                    line.push(b'\n');
                    script.record_command(&line)?;
                }
                return Err(FrameError::PartialLine(partial));
            }
            Err(err) => return Err(err),
        };
        tracing::trace!(line = %String::from_utf8_lossy(&line).trim_end(), "command");
        if let Some(script) = self.script.as_mut() {
            script.record_command(&line)?;
        }
        Ok(line)
    }

    /// Start a message: `<code> `.
    pub fn begin(&mut self, code: MessageCode) {
        self.pending.clear();
        self.pending.extend_from_slice(&[code.as_byte(), b' ']);
    }

    /// Append a body fragment to the message in progress.
    pub fn push(&mut self, fragment: &[u8]) {
        self.pending.extend_from_slice(fragment);
    }

    /// Terminate the message in progress and deliver it to every sink.
    pub fn end(&mut self) -> Result<()> {
        self.pending.extend_from_slice(b"\n");
        self.writer.write_message(&self.pending)?;
        if let Some(script) = self.script.as_mut() {
            script.record_message(&self.pending)?;
        }
        self.pending.clear();
        Ok(())
    }

    /// Send a whole message with a single body.
    pub fn send(&mut self, code: MessageCode, body: &[u8]) -> Result<()> {
        self.begin(code);
        self.push(body);
        self.end()
    }

    /// `r ready`
    pub fn send_ready(&mut self) -> Result<()> {
        self.send(MessageCode::Ready, b"ready")
    }

    /// `k ack`
    pub fn send_ack(&mut self) -> Result<()> {
        self.send(MessageCode::Ack, b"ack")
    }

    /// `b <8-hex width> <value>`
    pub fn send_bits(&mut self, width: u32, value: &str) -> Result<()> {
        self.begin(MessageCode::Bits);
        self.push(format!("{width:08X} ").as_bytes());
        self.push(value.as_bytes());
        self.end()
    }

    /// `l <8-hex count> <bytes>`; the caller guarantees `data` fits a `u32`.
    pub fn send_log(&mut self, data: &[u8]) -> Result<()> {
        self.begin(MessageCode::Log);
        self.push(format!("{:08X} ", data.len()).as_bytes());
        self.push(data);
        self.end()
    }

    /// `e <text>`, with any newline in `text` replaced by a space.
    pub fn send_error(&mut self, text: &str) -> Result<()> {
        let text = text.replace(['\r', '\n'], " ");
        self.send(MessageCode::Error, text.as_bytes())
    }

    /// The execution script, if one is attached.
    pub fn script(&self) -> Option<&ExecutionScript<S>> {
        self.script.as_ref()
    }

    /// Borrow the message stream.
    pub fn messages(&self) -> &W {
        self.writer.get_ref()
    }

    /// Consume the link and return its streams.
    pub fn into_parts(self) -> (R, W, Option<S>) {
        (
            self.reader.into_inner(),
            self.writer.into_inner(),
            self.script.map(ExecutionScript::into_inner),
        )
    }
}
