use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use simlink::frame::{CommandCode, MessageCode, ScriptEntry};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum EntryOutput<'a> {
    Command {
        index: u64,
        name: &'a str,
        text: String,
    },
    Message {
        index: u64,
        name: &'a str,
        code: String,
        body: String,
    },
    Note {
        text: &'a str,
    },
}

impl<'a> EntryOutput<'a> {
    fn from_entry(entry: &'a ScriptEntry) -> Self {
        match entry {
            ScriptEntry::Command { index, line } => EntryOutput::Command {
                index: *index,
                name: command_name(line),
                text: String::from_utf8_lossy(line).into_owned(),
            },
            ScriptEntry::Message { index, code, body } => EntryOutput::Message {
                index: *index,
                name: message_name(*code),
                code: char::from(*code).to_string(),
                body: String::from_utf8_lossy(body).into_owned(),
            },
            ScriptEntry::Note(text) => EntryOutput::Note { text },
        }
    }
}

/// Print parsed execution-script entries.
///
/// `Raw` prints only the command lines, newline-terminated, so the output can
/// be fed straight back into `simlink sim`.
pub fn print_entries(entries: &[ScriptEntry], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for entry in entries {
                println!(
                    "{}",
                    serde_json::to_string(&EntryOutput::from_entry(entry))
                        .unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "DIR", "KIND", "TEXT"]);
            for entry in entries {
                let row = match entry {
                    ScriptEntry::Command { index, line } => vec![
                        index.to_string(),
                        ">".to_string(),
                        command_name(line).to_string(),
                        preview(line),
                    ],
                    ScriptEntry::Message { index, code, body } => vec![
                        index.to_string(),
                        "<".to_string(),
                        message_name(*code).to_string(),
                        preview(body),
                    ],
                    ScriptEntry::Note(text) => {
                        vec![String::new(), "#".to_string(), "NOTE".to_string(), text.clone()]
                    }
                };
                table.add_row(row);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for entry in entries {
                match entry {
                    ScriptEntry::Command { index, line } => {
                        println!("{index:>5} > {:<8} {}", command_name(line), preview(line))
                    }
                    ScriptEntry::Message { index, code, body } => {
                        println!("{index:>5} < {:<8} {}", message_name(*code), preview(body))
                    }
                    ScriptEntry::Note(text) => println!("      # {text}"),
                }
            }
        }
        OutputFormat::Raw => {
            let mut data = Vec::new();
            for entry in entries {
                if let ScriptEntry::Command { line, .. } = entry {
                    data.extend_from_slice(line);
                    data.push(b'\n');
                }
            }
            print_raw(&data);
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn command_name(line: &[u8]) -> &'static str {
    line.first()
        .copied()
        .and_then(CommandCode::from_byte)
        .map(CommandCode::name)
        .unwrap_or("UNKNOWN")
}

pub fn message_name(code: u8) -> &'static str {
    MessageCode::from_byte(code)
        .map(MessageCode::name)
        .unwrap_or("UNKNOWN")
}

/// Single-line rendering: newlines are escaped.
fn preview(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_come_from_code_tables() {
        assert_eq!(command_name(b"S 2A ABC"), "SET_BITS");
        assert_eq!(command_name(b"?"), "UNKNOWN");
        assert_eq!(command_name(b""), "UNKNOWN");
        assert_eq!(message_name(b'b'), "BITS");
    }

    #[test]
    fn preview_escapes_newlines() {
        assert_eq!(preview(b"hello\nworld"), "hello\\nworld");
    }

    #[test]
    fn entries_serialize_with_kind_tag() {
        let entry = ScriptEntry::Message {
            index: 2,
            code: b'b',
            body: b"00000008 -10".to_vec(),
        };
        let json = serde_json::to_string(&EntryOutput::from_entry(&entry)).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"message","index":2,"name":"BITS","code":"b","body":"00000008 -10"}"#
        );
    }
}
