use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

use simlink_bits::{Bits, Signedness};
use simlink_frame::Link;
use tracing::{debug, error, info, warn};

use crate::command::{Command, TickCommand};
use crate::config::DriverConfig;
use crate::engine::Engine;
use crate::error::{DriverError, Result};
use crate::log::LogTailer;
use crate::port::{GettablePort, SettablePort};
use crate::tick::{Sentinel, TickPlan, Ticker};

/// Width of the cycle count in a `TICK` response.
///
/// The count is rendered like any other value, without leading zeros: five
/// cycles is `b 00000040 5`, not `b 00000040 0000000000000005`. Hosts should
/// parse the value rather than match it as a fixed 16-digit field.
const CYCLE_COUNT_WIDTH: u32 = 64;

/// Serves host commands against an engine until `D` or the first error.
pub struct Driver<E, R, W, S = File> {
    engine: E,
    link: Link<R, W, S>,
    log: LogTailer,
    trace_path: PathBuf,
    received_done: bool,
    trace_initialized: bool,
}

impl<E: Engine, R: Read, W: Write, S: Write> Driver<E, R, W, S> {
    pub fn new(engine: E, link: Link<R, W, S>, config: &DriverConfig) -> Self {
        Self {
            engine,
            link,
            log: LogTailer::new(&config.log_path),
            trace_path: config.trace_path.clone(),
            received_done: false,
            trace_initialized: false,
        }
    }

    /// Send `READY`, process commands until `D`, then let the engine finish.
    ///
    /// On error a single `e` message is sent before returning it.
    pub fn run(&mut self) -> Result<()> {
        let result = self.serve();
        if let Err(err) = &result {
            report(&mut self.link, err);
        }
        result
    }

    fn serve(&mut self) -> Result<()> {
        self.link.send_ready()?;
        info!("simulation ready");
        while !self.received_done {
            self.process_command()?;
        }
        self.engine.finish();
        info!("simulation done");
        Ok(())
    }

    /// Read, parse and execute one command.
    pub fn process_command(&mut self) -> Result<()> {
        let line = self.link.read_command()?;
        let command = Command::parse(&line)?;
        debug!(command = command.code().name(), "processing command");

        match command {
            Command::Done => {
                self.received_done = true;
                Ok(())
            }
            Command::Log => {
                self.engine.flush_output();
                let data = self.log.tail()?;
                self.link.send_log(&data)?;
                Ok(())
            }
            Command::GetBits { signedness, id } => self.get_bits(signedness, id),
            Command::SetBits { id, value } => {
                let port =
                    SettablePort::resolve(&self.engine, id, "resolving port for SET_BITS command")?;
                let value = port.decode(value, "parsing value for SET_BITS command")?;
                port.write(&mut self.engine, &value);
                self.link.send_ack()?;
                Ok(())
            }
            Command::Run { timesteps } => {
                self.engine.advance(timesteps);
                self.link.send_ack()?;
                Ok(())
            }
            Command::Tick(tick) => self.tick(&tick),
            Command::Trace { enable } => {
                if enable {
                    if !self.trace_initialized {
                        self.engine.trace_init(&self.trace_path);
                        self.trace_initialized = true;
                    }
                    self.engine.trace_enable();
                } else {
                    self.engine.trace_disable();
                }
                self.link.send_ack()?;
                Ok(())
            }
        }
    }

    fn get_bits(&mut self, signedness: Signedness, id: u32) -> Result<()> {
        let port = GettablePort::resolve(&self.engine, id, "resolving port for GET_BITS command")?;
        let value = port.read(&mut self.engine)?;
        let text = value
            .to_hex(signedness)
            .map_err(|source| DriverError::Value {
                context: "encoding value for GET_BITS command",
                source,
            })?;
        self.link.send_bits(port.width(), &text)?;
        Ok(())
    }

    fn tick(&mut self, tick: &TickCommand<'_>) -> Result<()> {
        let ticking = SettablePort::resolve(
            &self.engine,
            tick.ticking_id,
            "resolving ticking port for TICK command",
        )?;
        let in_phase = ticking.decode(tick.in_phase, "parsing in-phase value for TICK command")?;
        let out_of_phase = ticking.decode(
            tick.out_of_phase,
            "parsing out-of-phase value for TICK command",
        )?;
        let sentinel = match tick.sentinel {
            Some((id, text)) => {
                let port = GettablePort::resolve(
                    &self.engine,
                    id,
                    "resolving sentinel port for TICK command",
                )?;
                let expected =
                    Bits::parse(text, port.width()).map_err(|source| DriverError::Value {
                        context: "parsing sentinel value for TICK command",
                        source,
                    })?;
                Some(Sentinel { port, expected })
            }
            None => None,
        };

        let plan = TickPlan {
            ticking,
            in_phase,
            out_of_phase,
            timesteps_per_phase: tick.timesteps_per_phase,
            max_cycles: u64::from(tick.max_cycles.unsigned_abs()),
            sentinel,
        };
        let cycles = Ticker::new(&plan)?.run(&mut self.engine);
        debug!(cycles, "tick finished");

        let text = Bits::from_u64(cycles)
            .to_hex(Signedness::Unsigned)
            .map_err(|source| DriverError::Value {
                context: "encoding cycle count for TICK command",
                source,
            })?;
        self.link.send_bits(CYCLE_COUNT_WIDTH, &text)?;
        Ok(())
    }

    /// Whether `D` has been processed.
    pub fn received_done(&self) -> bool {
        self.received_done
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn link(&self) -> &Link<R, W, S> {
        &self.link
    }

    pub fn into_parts(self) -> (E, Link<R, W, S>) {
        (self.engine, self.link)
    }
}

/// Log `err` and tell the host about it.
pub(crate) fn report<R: Read, W: Write, S: Write>(link: &mut Link<R, W, S>, err: &DriverError) {
    error!(error = %err, "simulation driver failed");
    if let Err(send_err) = link.send_error(&err.to_string()) {
        warn!(error = %send_err, "could not report error to host");
    }
}
