//! Control protocol between a host and a compiled hardware simulation.
//!
//! The host writes newline-terminated commands to the simulation's stdin and
//! reads framed messages from its stdout; everything the simulation itself
//! prints is diverted to a log file the host can tail.
//!
//! # Crate Structure
//!
//! - [`bits`]: hex text codec for arbitrary-width port values
//! - [`frame`]: command reader, message writer, execution scripts
//! - [`transport`]: stdio rebinding and process probes
//! - [`driver`]: engine trait, command dispatcher, tick engine
//! - [`model`]: a register-level demo engine loaded from JSON (behind `model` feature)

/// Re-export bit-vector codec types.
pub mod bits {
    pub use simlink_bits::*;
}

/// Re-export framing types.
pub mod frame {
    pub use simlink_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use simlink_transport::*;
}

/// Re-export driver types.
pub mod driver {
    pub use simlink_driver::*;
}

#[cfg(feature = "model")]
pub mod model;
