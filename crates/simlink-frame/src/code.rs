//! Message and command codes.
//!
//! Every message and command starts with one ASCII character naming its type.
//! Messages (process to host) use lowercase, commands (host to process) use
//! uppercase.

/// Messages written by the simulation process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCode {
    /// `r ready`: startup complete, always the first message.
    Ready,
    /// `e <text>`: terminal error; the process exits after sending it.
    Error,
    /// `k ack`: a side-effecting command completed.
    Ack,
    /// `b <8-hex width> <value>`: a value response.
    Bits,
    /// `l <8-hex count> <bytes>`: a simulation log tail.
    Log,
}

impl MessageCode {
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Ready => b'r',
            Self::Error => b'e',
            Self::Ack => b'k',
            Self::Bits => b'b',
            Self::Log => b'l',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'r' => Some(Self::Ready),
            b'e' => Some(Self::Error),
            b'k' => Some(Self::Ack),
            b'b' => Some(Self::Bits),
            b'l' => Some(Self::Log),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Error => "ERROR",
            Self::Ack => "ACK",
            Self::Bits => "BITS",
            Self::Log => "LOG",
        }
    }
}

/// Commands read from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCode {
    /// `D`: finish the simulation; no response.
    Done,
    /// `L`: request the log written since the previous `L`.
    Log,
    /// `G (s|u) <id>`: read a port.
    GetBits,
    /// `S <id> <value>`: write a port.
    SetBits,
    /// `R <timesteps>`: advance simulated time.
    Run,
    /// `T <id> <in>,<out>-<timesteps>*<max>[ <id>=<value>]`: drive a clock.
    Tick,
    /// `W (1|0)`: enable or disable waveform tracing.
    Trace,
}

impl CommandCode {
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Done => b'D',
            Self::Log => b'L',
            Self::GetBits => b'G',
            Self::SetBits => b'S',
            Self::Run => b'R',
            Self::Tick => b'T',
            Self::Trace => b'W',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'D' => Some(Self::Done),
            b'L' => Some(Self::Log),
            b'G' => Some(Self::GetBits),
            b'S' => Some(Self::SetBits),
            b'R' => Some(Self::Run),
            b'T' => Some(Self::Tick),
            b'W' => Some(Self::Trace),
            _ => None,
        }
    }

    /// Name used in error messages, e.g. `SET_BITS`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Done => "DONE",
            Self::Log => "LOG",
            Self::GetBits => "GET_BITS",
            Self::SetBits => "SET_BITS",
            Self::Run => "RUN",
            Self::Tick => "TICK",
            Self::Trace => "TRACE",
        }
    }
}
