//! Command dispatcher for a compiled simulation process.
//!
//! This is the layer a simulation backend links against. The backend supplies
//! an [`Engine`] (port lookup, time advancement, waveform tracing) and calls
//! [`launch`]; the driver then serves the host's commands until `D`:
//!
//! | Command | Response |
//! |---|---|
//! | `D` | none |
//! | `L` | `l <count> <bytes>` |
//! | `G (s\|u) <id>` | `b <width> <value>` |
//! | `S <id> <value>` | `k ack` |
//! | `R <timesteps>` | `k ack` |
//! | `T <id> <in>,<out>-<ts>*<max>[ <id>=<value>]` | `b 00000040 <cycles>` |
//! | `W (1\|0)` | `k ack` |
//!
//! Every error is terminal: the driver sends one `e <text>` message and
//! stops.

pub mod command;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod launch;
pub mod log;
pub mod port;
pub mod tick;

#[cfg(test)]
mod mock;

pub use command::{Command, Scanner, TickCommand};
pub use config::{ConfigError, DriverConfig, LaunchOptions};
pub use driver::Driver;
pub use engine::Engine;
pub use error::{DriverError, Result};
#[cfg(unix)]
pub use launch::launch;
pub use launch::{serve, EXIT_FAILURE, EXIT_SUCCESS};
pub use log::LogTailer;
pub use port::{GettablePort, SettablePort};
pub use tick::{Sentinel, TickPhase, TickPlan, Ticker};
