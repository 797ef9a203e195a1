//! A register-level engine for exercising the protocol without a real
//! simulator.
//!
//! ```json
//! {
//!   "name": "counter",
//!   "ports": [
//!     { "id": 0, "name": "clock", "width": 1, "direction": "input" },
//!     { "id": 1, "name": "count", "width": 8, "direction": "output" },
//!     { "id": 2, "name": "data", "width": 12, "direction": "inout", "monitor": true }
//!   ],
//!   "counter": { "clock": 0, "output": 1 }
//! }
//! ```
//!
//! Every port is a plain register. Inputs and inouts are settable; every port
//! is gettable. With a `counter`, each `advance` that sees the clock at `1`
//! after having seen it at `0` increments the output register, wrapping at
//! its width. Writes to monitored ports are echoed to stdout, which a
//! launched simulation has pointed at its log.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use simlink_bits::{byte_count, inapplicable_mask, Bits, Signedness};
use simlink_driver::Engine;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate port id {0}")]
    DuplicatePort(u32),

    #[error("port '{0}' must have a width between 1 and 2147483647")]
    InvalidWidth(String),

    #[error("counter {role} refers to unknown port {id}")]
    UnknownCounterPort { role: &'static str, id: u32 },

    #[error("counter clock must be a settable port, got '{0}'")]
    ClockNotSettable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
    Inout,
}

impl Direction {
    pub fn is_settable(self) -> bool {
        matches!(self, Direction::Input | Direction::Inout)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
            Direction::Inout => "inout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub id: u32,
    pub name: String,
    pub width: u32,
    pub direction: Direction,
    #[serde(default)]
    pub monitor: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSpec {
    pub clock: u32,
    pub output: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub ports: Vec<PortSpec>,
    #[serde(default)]
    pub counter: Option<CounterSpec>,
}

#[derive(Debug)]
struct Register {
    spec: PortSpec,
    value: Vec<u8>,
}

#[derive(Debug)]
struct TraceFile {
    out: BufWriter<File>,
    enabled: bool,
}

/// A set of registers with an optional clocked counter.
#[derive(Debug)]
pub struct RegisterModel {
    name: String,
    registers: BTreeMap<u32, Register>,
    counter: Option<CounterSpec>,
    clock_was_high: bool,
    time: u64,
    trace: Option<TraceFile>,
}

impl RegisterModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ModelError> {
        let spec: ModelSpec = serde_json::from_str(text)?;
        Self::from_spec(spec)
    }

    pub fn from_spec(spec: ModelSpec) -> Result<Self, ModelError> {
        let mut registers = BTreeMap::new();
        for port in spec.ports {
            if port.width == 0 || i32::try_from(port.width).is_err() {
                return Err(ModelError::InvalidWidth(port.name));
            }
            let id = port.id;
            let value = vec![0u8; byte_count(port.width)];
            if registers.insert(id, Register { spec: port, value }).is_some() {
                return Err(ModelError::DuplicatePort(id));
            }
        }

        if let Some(counter) = spec.counter {
            let clock = registers
                .get(&counter.clock)
                .ok_or(ModelError::UnknownCounterPort {
                    role: "clock",
                    id: counter.clock,
                })?;
            if !clock.spec.direction.is_settable() {
                return Err(ModelError::ClockNotSettable(clock.spec.name.clone()));
            }
            if !registers.contains_key(&counter.output) {
                return Err(ModelError::UnknownCounterPort {
                    role: "output",
                    id: counter.output,
                });
            }
        }

        Ok(Self {
            name: spec.name.unwrap_or_else(|| "model".to_string()),
            registers,
            counter: spec.counter,
            clock_was_high: false,
            time: 0,
            trace: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Port definitions in id order.
    pub fn ports(&self) -> impl Iterator<Item = &PortSpec> {
        self.registers.values().map(|register| &register.spec)
    }

    pub fn counter(&self) -> Option<CounterSpec> {
        self.counter
    }

    /// Simulated time elapsed so far.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Current little-endian value of a port.
    pub fn value(&self, id: u32) -> Option<&[u8]> {
        self.registers.get(&id).map(|register| register.value.as_slice())
    }

    fn clock_edge(&mut self) -> bool {
        let Some(counter) = self.counter else {
            return false;
        };
        let high = self
            .registers
            .get(&counter.clock)
            .is_some_and(|register| register.value.first().is_some_and(|byte| byte & 1 == 1));
        let rising = high && !self.clock_was_high;
        self.clock_was_high = high;
        rising
    }

    fn increment(&mut self, id: u32) {
        let Some(register) = self.registers.get_mut(&id) else {
            return;
        };
        for byte in register.value.iter_mut() {
            let (next, carry) = byte.overflowing_add(1);
            *byte = next;
            if !carry {
                break;
            }
        }
        if let Some(top) = register.value.last_mut() {
            *top &= !inapplicable_mask(register.spec.width);
        }
    }

    fn trace_line(&mut self) {
        let Some(trace) = self.trace.as_mut().filter(|trace| trace.enabled) else {
            return;
        };
        let mut line = format!("#{}", self.time);
        for register in self.registers.values() {
            line.push(' ');
            line.push_str(&register.spec.name);
            line.push('=');
            line.push_str(&render(register));
        }
        if let Err(err) = writeln!(trace.out, "{line}") {
            warn!(error = %err, "failed to write trace");
            self.trace = None;
        }
    }
}

fn render(register: &Register) -> String {
    Bits::from_le_bytes(register.spec.width, register.value.clone())
        .and_then(|bits| bits.to_hex(Signedness::Unsigned))
        .unwrap_or_else(|_| "?".to_string())
}

impl Engine for RegisterModel {
    fn settable_width(&self, id: u32) -> Option<i32> {
        let register = self.registers.get(&id)?;
        if !register.spec.direction.is_settable() {
            return None;
        }
        i32::try_from(register.spec.width).ok()
    }

    fn gettable_width(&self, id: u32) -> Option<i32> {
        let register = self.registers.get(&id)?;
        i32::try_from(register.spec.width).ok()
    }

    fn write_port(&mut self, id: u32, value: &[u8]) {
        let Some(register) = self.registers.get_mut(&id) else {
            return;
        };
        let len = register.value.len().min(value.len());
        register.value[..len].copy_from_slice(&value[..len]);

        if register.spec.monitor {
            let mut out = io::stdout().lock();
            if let Err(err) = writeln!(out, "{} <= {}", register.spec.name, render(register)) {
                warn!(port = %register.spec.name, error = %err, "failed to print monitored write");
            }
        }
    }

    fn read_port(&mut self, id: u32, value: &mut [u8]) {
        if let Some(register) = self.registers.get(&id) {
            let len = register.value.len().min(value.len());
            value[..len].copy_from_slice(&register.value[..len]);
        }
    }

    fn advance(&mut self, timesteps: i32) {
        if self.clock_edge() {
            if let Some(counter) = self.counter {
                self.increment(counter.output);
            }
        }
        self.time = self.time.saturating_add(u64::from(timesteps.unsigned_abs()));
        self.trace_line();
    }

    fn trace_init(&mut self, path: &Path) {
        match File::create(path) {
            Ok(file) => {
                debug!(path = %path.display(), "trace file created");
                self.trace = Some(TraceFile {
                    out: BufWriter::new(file),
                    enabled: false,
                });
            }
            Err(err) => warn!(path = %path.display(), error = %err, "failed to create trace file"),
        }
    }

    fn trace_enable(&mut self) {
        if let Some(trace) = self.trace.as_mut() {
            trace.enabled = true;
        }
    }

    fn trace_disable(&mut self) {
        if let Some(trace) = self.trace.as_mut() {
            trace.enabled = false;
            if let Err(err) = trace.out.flush() {
                warn!(error = %err, "failed to flush trace");
            }
        }
    }

    fn finish(&mut self) {
        if let Some(trace) = self.trace.as_mut() {
            if let Err(err) = trace.out.flush() {
                warn!(error = %err, "failed to flush trace");
            }
        }
        if let Err(err) = io::stdout().flush() {
            warn!(error = %err, "failed to flush simulation output");
        }
    }
}
