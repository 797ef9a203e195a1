//! Command grammar.
//!
//! Counts and ids are hex with no sign or prefix and at most `i32::MAX`.
//! Value fields are left as raw text: they can only be decoded once the
//! target port's width is known.

use simlink_bits::Signedness;
use simlink_frame::CommandCode;

use crate::error::{DriverError, Result};

/// A parsed command line, borrowing its value fields from the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Done,
    Log,
    GetBits { signedness: Signedness, id: u32 },
    SetBits { id: u32, value: &'a [u8] },
    Run { timesteps: i32 },
    Tick(TickCommand<'a>),
    Trace { enable: bool },
}

/// Arguments of `T <id> <in>,<out>-<ts>*<max>[ <id>=<value>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickCommand<'a> {
    pub ticking_id: u32,
    pub in_phase: &'a [u8],
    pub out_of_phase: &'a [u8],
    pub timesteps_per_phase: i32,
    pub max_cycles: i32,
    pub sentinel: Option<(u32, &'a [u8])>,
}

impl<'a> Command<'a> {
    /// Parse one command line, trailing `\n` included.
    pub fn parse(line: &'a [u8]) -> Result<Self> {
        let mut scanner = Scanner::new(line);
        let opcode = scanner.next_byte().unwrap_or(b'\n');
        let code = CommandCode::from_byte(opcode)
            .ok_or(DriverError::UnknownOpcode(char::from(opcode)))?;

        let command = match code {
            CommandCode::Done => Command::Done,
            CommandCode::Log => Command::Log,
            CommandCode::GetBits => {
                scanner.expect(b' ', "space after `GET_BITS` command")?;
                let signedness = scanner
                    .next_byte()
                    .and_then(Signedness::from_flag)
                    .ok_or_else(|| {
                        DriverError::Syntax(
                            "expected `s` or `u` argument to `GET_BITS` command".to_string(),
                        )
                    })?;
                scanner.expect(b' ', "space after signedness of `GET_BITS` command")?;
                let id = scanner.scan_id("parsing port ID for GET_BITS command")?;
                Command::GetBits { signedness, id }
            }
            CommandCode::SetBits => {
                scanner.expect(b' ', "space after `SET_BITS` command")?;
                let id = scanner.scan_id("parsing port ID for SET_BITS command")?;
                scanner.expect(b' ', "space after port ID for `SET_BITS` command")?;
                let value = scanner.take_until(b'\n');
                Command::SetBits { id, value }
            }
            CommandCode::Run => {
                scanner.expect(b' ', "space after `RUN` command")?;
                let timesteps = scanner.scan_count("parsing time for RUN command")?;
                Command::Run { timesteps }
            }
            CommandCode::Tick => Command::Tick(parse_tick(&mut scanner)?),
            CommandCode::Trace => {
                scanner.expect(b' ', "space after `TRACE` command")?;
                let enable = match scanner.next_byte() {
                    Some(b'1') => true,
                    Some(b'0') => false,
                    _ => {
                        return Err(DriverError::Syntax(
                            "expected `1` or `0` argument to `TRACE` command".to_string(),
                        ))
                    }
                };
                Command::Trace { enable }
            }
        };

        scanner.expect_end(code)?;
        Ok(command)
    }

    pub fn code(&self) -> CommandCode {
        match self {
            Command::Done => CommandCode::Done,
            Command::Log => CommandCode::Log,
            Command::GetBits { .. } => CommandCode::GetBits,
            Command::SetBits { .. } => CommandCode::SetBits,
            Command::Run { .. } => CommandCode::Run,
            Command::Tick(_) => CommandCode::Tick,
            Command::Trace { .. } => CommandCode::Trace,
        }
    }
}

fn parse_tick<'a>(scanner: &mut Scanner<'a>) -> Result<TickCommand<'a>> {
    scanner.expect(b' ', "space after `TICK` command")?;
    let ticking_id = scanner.scan_id("parsing ticking port ID for TICK command")?;
    scanner.expect(b' ', "space after ticking port ID for `TICK` command")?;
    let in_phase = scanner.take_value_until(b',');
    scanner.expect(b',', "comma after in-phase value for `TICK` command")?;
    let out_of_phase = scanner.take_value_until(b'-');
    scanner.expect(b'-', "dash after out-of-phase value for `TICK` command")?;
    let timesteps_per_phase = scanner.scan_count("parsing timesteps per phase for TICK command")?;
    scanner.expect(b'*', "asterisk after timesteps per phase for `TICK` command")?;
    let max_cycles = scanner.scan_count("parsing max cycles for TICK command")?;
    if max_cycles == 0 {
        return Err(DriverError::Syntax(
            "max cycle count for `TICK` command should be greater than 0".to_string(),
        ));
    }

    let sentinel = if scanner.peek() == Some(b' ') {
        scanner.next_byte();
        let id = scanner.scan_id("parsing sentinel port ID for TICK command")?;
        scanner.expect(b'=', "`=` after sentinel port ID for `TICK` command")?;
        Some((id, scanner.take_until(b'\n')))
    } else {
        None
    };

    Ok(TickCommand {
        ticking_id,
        in_phase,
        out_of_phase,
        timesteps_per_phase,
        max_cycles,
        sentinel,
    })
}

/// Byte cursor over one command line.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    line: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(line: &'a [u8]) -> Self {
        Self { line, pos: 0 }
    }

    pub fn peek(&self) -> Option<u8> {
        self.line.get(self.pos).copied()
    }

    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consume `byte` or fail with "expected <what>".
    pub fn expect(&mut self, byte: u8, what: &str) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(DriverError::Syntax(format!("expected {what}")))
        }
    }

    /// Consume the trailing newline, which must be the last byte.
    pub fn expect_end(&mut self, code: CommandCode) -> Result<()> {
        if self.peek() == Some(b'\n') && self.pos + 1 == self.line.len() {
            self.pos += 1;
            Ok(())
        } else {
            Err(DriverError::Syntax(format!(
                "unexpected data at end of `{}` command",
                code.name()
            )))
        }
    }

    /// Scan a hex count in `0..=i32::MAX`.
    pub fn scan_count(&mut self, context: &'static str) -> Result<i32> {
        if matches!(self.peek(), Some(b'-' | b'+')) {
            return Err(DriverError::NegativeInteger { context });
        }
        let digits = self.line[self.pos..]
            .iter()
            .take_while(|b| b.is_ascii_hexdigit())
            .count();
        if digits == 0 {
            return Err(DriverError::MissingInteger { context });
        }

        let mut value: i64 = 0;
        for &byte in &self.line[self.pos..self.pos + digits] {
            let digit = char::from(byte).to_digit(16).unwrap_or_default();
            value = value * 16 + i64::from(digit);
            if value > i64::from(i32::MAX) {
                return Err(DriverError::IntegerOutOfRange { context });
            }
        }
        self.pos += digits;
        i32::try_from(value).map_err(|_| DriverError::IntegerOutOfRange { context })
    }

    /// Scan a port id.
    pub fn scan_id(&mut self, context: &'static str) -> Result<u32> {
        self.scan_count(context).map(i32::unsigned_abs)
    }

    /// Everything up to (not including) `stop` or the newline.
    pub fn take_until(&mut self, stop: u8) -> &'a [u8] {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte == stop || byte == b'\n' {
                break;
            }
            self.pos += 1;
        }
        &self.line[start..self.pos]
    }

    /// Like [`take_until`](Self::take_until), but a leading `-` belongs to
    /// the value even when `stop` is `-`.
    pub fn take_value_until(&mut self, stop: u8) -> &'a [u8] {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        self.take_until(stop);
        &self.line[start..self.pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_commands() {
        assert_eq!(Command::parse(b"D\n").unwrap(), Command::Done);
        assert_eq!(Command::parse(b"L\n").unwrap(), Command::Log);
    }

    #[test]
    fn parses_get_bits() {
        assert_eq!(
            Command::parse(b"G s 5\n").unwrap(),
            Command::GetBits {
                signedness: Signedness::Signed,
                id: 5
            }
        );
        assert_eq!(
            Command::parse(b"G u 1F\n").unwrap(),
            Command::GetBits {
                signedness: Signedness::Unsigned,
                id: 0x1F
            }
        );
    }

    #[test]
    fn parses_set_bits_with_raw_value() {
        assert_eq!(
            Command::parse(b"S 2A ABC\n").unwrap(),
            Command::SetBits {
                id: 0x2A,
                value: b"ABC"
            }
        );
        assert_eq!(
            Command::parse(b"S 1 -7\n").unwrap(),
            Command::SetBits { id: 1, value: b"-7" }
        );
    }

    #[test]
    fn parses_run_and_trace() {
        assert_eq!(
            Command::parse(b"R 64\n").unwrap(),
            Command::Run { timesteps: 100 }
        );
        assert_eq!(
            Command::parse(b"W 1\n").unwrap(),
            Command::Trace { enable: true }
        );
        assert_eq!(
            Command::parse(b"W 0\n").unwrap(),
            Command::Trace { enable: false }
        );
    }

    #[test]
    fn parses_tick_with_sentinel() {
        let Command::Tick(tick) = Command::parse(b"T 0 1,0-A*64 7=1\n").unwrap() else {
            panic!("expected tick");
        };
        assert_eq!(
            tick,
            TickCommand {
                ticking_id: 0,
                in_phase: b"1",
                out_of_phase: b"0",
                timesteps_per_phase: 10,
                max_cycles: 100,
                sentinel: Some((7, b"1".as_slice())),
            }
        );
    }

    #[test]
    fn tick_values_may_be_negative() {
        let Command::Tick(tick) = Command::parse(b"T 3 -1,-2-1*1\n").unwrap() else {
            panic!("expected tick");
        };
        assert_eq!(tick.in_phase, b"-1");
        assert_eq!(tick.out_of_phase, b"-2");
        assert_eq!(tick.timesteps_per_phase, 1);
        assert_eq!(tick.sentinel, None);
    }

    #[test]
    fn tick_requires_positive_max_cycles() {
        let err = Command::parse(b"T 0 1,0-1*0\n").unwrap_err();
        assert!(err.to_string().contains("greater than 0"));
    }

    #[test]
    fn unknown_opcode() {
        let err = Command::parse(b"X\n").unwrap_err();
        assert!(matches!(err, DriverError::UnknownOpcode('X')));
    }

    #[test]
    fn bare_commands_reject_trailing_data() {
        let err = Command::parse(b"D \n").unwrap_err();
        assert_eq!(err.to_string(), "unexpected data at end of `DONE` command");
        assert!(Command::parse(b"L x\n").is_err());
        assert!(Command::parse(b"R 1 2\n").is_err());
    }

    #[test]
    fn trace_argument_must_be_flag() {
        let err = Command::parse(b"W 2\n").unwrap_err();
        assert!(err.to_string().contains("`TRACE`"));
        assert!(Command::parse(b"W 10\n").is_err());
    }

    #[test]
    fn counts_are_strict_hex() {
        assert!(matches!(
            Command::parse(b"R -1\n"),
            Err(DriverError::NegativeInteger { .. })
        ));
        assert!(matches!(
            Command::parse(b"R \n"),
            Err(DriverError::MissingInteger { .. })
        ));
        assert!(matches!(
            Command::parse(b"R 80000000\n"),
            Err(DriverError::IntegerOutOfRange { .. })
        ));
        assert_eq!(
            Command::parse(b"R 7FFFFFFF\n").unwrap(),
            Command::Run {
                timesteps: i32::MAX
            }
        );
        assert!(Command::parse(b"R 0x10\n").is_err());
    }

    #[test]
    fn missing_separator_is_syntax_error() {
        let err = Command::parse(b"S 1\n").unwrap_err();
        assert_eq!(err.to_string(), "expected space after port ID for `SET_BITS` command");
        let err = Command::parse(b"G x 1\n").unwrap_err();
        assert!(matches!(err, DriverError::Syntax(_)));
    }

    #[test]
    fn command_code_round_trips() {
        for line in [&b"D\n"[..], b"L\n", b"G u 0\n", b"S 0 0\n", b"R 0\n", b"T 0 1,0-1*1\n", b"W 1\n"] {
            let command = Command::parse(line).unwrap();
            assert_eq!(command.code().as_byte(), line[0]);
        }
    }
}
