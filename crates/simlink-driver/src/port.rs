//! Port resolution: engine lookups with width validation.

use simlink_bits::Bits;

use crate::engine::Engine;
use crate::error::{DriverError, Result};

/// A port the host may drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettablePort {
    id: u32,
    width: u32,
}

impl SettablePort {
    pub fn resolve<E: Engine + ?Sized>(engine: &E, id: u32, context: &'static str) -> Result<Self> {
        let width = validate_width(id, engine.settable_width(id), context)?;
        Ok(Self { id, width })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Decode wire text at this port's width.
    pub fn decode(&self, text: &[u8], context: &'static str) -> Result<Bits> {
        Bits::parse(text, self.width).map_err(|source| DriverError::Value { context, source })
    }

    pub fn write<E: Engine + ?Sized>(&self, engine: &mut E, value: &Bits) {
        debug_assert_eq!(value.width(), self.width);
        engine.write_port(self.id, value.as_bytes());
    }
}

/// A port the host may sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GettablePort {
    id: u32,
    width: u32,
}

impl GettablePort {
    pub fn resolve<E: Engine + ?Sized>(engine: &E, id: u32, context: &'static str) -> Result<Self> {
        let width = validate_width(id, engine.gettable_width(id), context)?;
        Ok(Self { id, width })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// A zeroed buffer of this port's width.
    pub fn buffer(&self) -> Result<Bits> {
        Bits::zeroed(self.width).map_err(|source| DriverError::Value {
            context: "allocating port buffer",
            source,
        })
    }

    /// Sample the port into a fresh buffer.
    pub fn read<E: Engine + ?Sized>(&self, engine: &mut E) -> Result<Bits> {
        let mut value = self.buffer()?;
        self.read_into(engine, &mut value);
        Ok(value)
    }

    /// Sample the port into `value`, which is zeroed first.
    pub fn read_into<E: Engine + ?Sized>(&self, engine: &mut E, value: &mut Bits) {
        debug_assert_eq!(value.width(), self.width);
        let bytes = value.as_mut_bytes();
        bytes.fill(0);
        engine.read_port(self.id, bytes);
    }
}

fn validate_width(id: u32, width: Option<i32>, context: &'static str) -> Result<u32> {
    match width {
        None => Err(DriverError::InvalidPort { id, context }),
        Some(width) if width <= 0 => Err(DriverError::InvalidPortWidth { id, width, context }),
        Some(width) => Ok(width.unsigned_abs()),
    }
}
