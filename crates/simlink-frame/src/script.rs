//! Execution scripts: a numbered transcript of every command and message.
//!
//! ```text
//! 0< r ready
//! 1> S 2A ABC
//! 1< k ack
//! 2> L
//! 2< l 00000006 hello
//!
//! 3> D
//! ```
//!
//! Commands are numbered from 1 and messages from 0 (`READY` answers no
//! command). With a limit of `L` commands the recorder stops after command
//! `L`, appending a note and a synthetic `D` so the transcript still replays
//! to a clean exit.

use std::io::Write;

use crate::error::{FrameError, Result};

/// Records commands and messages to a sink, flushing after every event.
pub struct ExecutionScript<S> {
    sink: S,
    message_count: u64,
    command_count: u64,
    limit: Option<u32>,
    truncated: bool,
}

impl<S: Write> ExecutionScript<S> {
    /// Create a recorder, optionally limited to `limit` commands.
    pub fn new(sink: S, limit: Option<u32>) -> Self {
        Self {
            sink,
            message_count: 0,
            command_count: 1,
            limit,
            truncated: false,
        }
    }

    /// Record one command line as read, trailing newline included.
    pub fn record_command(&mut self, line: &[u8]) -> Result<()> {
        if self.truncated {
            return Ok(());
        }
        if self.limit_reached() {
            return self.truncate();
        }

        write!(self.sink, "{}> ", self.command_count).map_err(FrameError::Script)?;
        self.sink.write_all(line).map_err(FrameError::Script)?;
        self.command_count += 1;

        if self.limit_reached() {
            return self.truncate();
        }
        self.sink.flush().map_err(FrameError::Script)
    }

    /// Record one complete message, trailing newline included.
    pub fn record_message(&mut self, message: &[u8]) -> Result<()> {
        let index = self.message_count;
        self.message_count += 1;
        if self.limit.is_some_and(|limit| index >= u64::from(limit)) {
            return Ok(());
        }

        write!(self.sink, "{index}< ").map_err(FrameError::Script)?;
        self.sink.write_all(message).map_err(FrameError::Script)?;
        self.sink.flush().map_err(FrameError::Script)
    }

    /// Whether the command limit has been hit and recording has stopped.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Consume the recorder and return the sink.
    pub fn into_inner(self) -> S {
        self.sink
    }

    fn limit_reached(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.command_count > u64::from(limit))
    }

    fn truncate(&mut self) -> Result<()> {
        self.truncated = true;
        let limit = self.limit.unwrap_or_default();
        tracing::debug!(limit, "execution script limit reached");
        writeln!(
            self.sink,
            "# Execution script limited to {limit} commands (not counting implicit 'Done')."
        )
        .map_err(FrameError::Script)?;
        writeln!(self.sink, "{}> D", self.command_count).map_err(FrameError::Script)?;
        self.sink.flush().map_err(FrameError::Script)
    }
}

/// One event of a parsed execution script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptEntry {
    /// A command as sent by the host, without its trailing newline.
    Command { index: u64, line: Vec<u8> },
    /// A message as sent by the process: its code and the body after
    /// `<code> `, without the trailing newline.
    Message { index: u64, code: u8, body: Vec<u8> },
    /// A `#` annotation line, without the leading `# `.
    Note(String),
}

/// Parse an execution script back into its events.
///
/// `LOG` message bodies are skipped by their byte count, so log text that
/// happens to look like a transcript line is never mistaken for one.
pub fn parse_script(script: &[u8]) -> Result<Vec<ScriptEntry>> {
    let mut entries = Vec::new();
    let mut pos = 0usize;

    while pos < script.len() {
        if script[pos] == b'#' {
            let end = line_end(script, pos)?;
            let text = &script[pos + 1..end];
            let text = text.strip_prefix(b" ").unwrap_or(text);
            entries.push(ScriptEntry::Note(
                String::from_utf8_lossy(text).into_owned(),
            ));
            pos = end + 1;
            continue;
        }

        let digits = script[pos..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits == 0 {
            return Err(malformed(pos, "expected an event number"));
        }
        let index = std::str::from_utf8(&script[pos..pos + digits])
            .ok()
            .and_then(|text| text.parse::<u64>().ok())
            .ok_or_else(|| malformed(pos, "event number out of range"))?;
        pos += digits;

        let direction = script.get(pos).copied();
        if script.get(pos + 1) != Some(&b' ') {
            return Err(malformed(pos, "expected `> ` or `< ` after event number"));
        }
        pos += 2;

        match direction {
            Some(b'>') => {
                let end = line_end(script, pos)?;
                entries.push(ScriptEntry::Command {
                    index,
                    line: script[pos..end].to_vec(),
                });
                pos = end + 1;
            }
            Some(b'<') => {
                let code = *script
                    .get(pos)
                    .ok_or_else(|| malformed(pos, "missing message code"))?;
                if script.get(pos + 1) != Some(&b' ') {
                    return Err(malformed(pos, "expected space after message code"));
                }
                let body_start = pos + 2;
                let end = if code == b'l' {
                    log_body_end(script, body_start)?
                } else {
                    line_end(script, body_start)?
                };
                entries.push(ScriptEntry::Message {
                    index,
                    code,
                    body: script[body_start..end].to_vec(),
                });
                pos = end + 1;
            }
            _ => return Err(malformed(pos - 2, "expected `>` or `<` after event number")),
        }
    }

    Ok(entries)
}

fn line_end(script: &[u8], from: usize) -> Result<usize> {
    script[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|offset| from + offset)
        .ok_or_else(|| malformed(from, "unterminated line"))
}

/// End of an `l <count> <bytes>` body: the newline after `count` bytes.
fn log_body_end(script: &[u8], from: usize) -> Result<usize> {
    let count = script
        .get(from..from + 8)
        .and_then(|digits| std::str::from_utf8(digits).ok())
        .and_then(|digits| usize::from_str_radix(digits, 16).ok())
        .ok_or_else(|| malformed(from, "expected 8-digit log byte count"))?;
    if script.get(from + 8) != Some(&b' ') {
        return Err(malformed(from + 8, "expected space after log byte count"));
    }
    let end = from + 9 + count;
    if script.get(end) != Some(&b'\n') {
        return Err(malformed(end.min(script.len()), "log body shorter than its byte count"));
    }
    Ok(end)
}

fn malformed(offset: usize, reason: &str) -> FrameError {
    FrameError::MalformedScript {
        offset,
        reason: reason.to_string(),
    }
}
