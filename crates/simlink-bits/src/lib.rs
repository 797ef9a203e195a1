//! Arbitrary-width bit-vector codec for the simlink wire protocol.
//!
//! Port values travel as hex text in sign-magnitude form and are held
//! internally as little-endian two's-complement byte buffers:
//! - `ABC` is the unsigned value `0xABC`
//! - `-10` is the negative value `-0x10`, stored as its two's complement
//!
//! Every value is validated against the declared bit width of its port before
//! it reaches the simulation engine.

pub mod codec;
pub mod error;

pub use codec::{byte_count, inapplicable_mask, Bits, Signedness};
pub use error::{BitsError, Result};
