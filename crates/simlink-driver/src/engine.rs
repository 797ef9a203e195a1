use std::io::{self, Write};
use std::path::Path;

/// The compiled simulation, as seen by the driver.
///
/// Port ids are the nonnegative integers the host sends on the wire. Values
/// cross this boundary as little-endian byte buffers of exactly
/// `ceil(width / 8)` bytes; the driver has already range-checked anything it
/// writes.
pub trait Engine {
    /// Width of a settable port, or `None` if the id is unknown.
    fn settable_width(&self, id: u32) -> Option<i32>;

    /// Width of a gettable port, or `None` if the id is unknown.
    fn gettable_width(&self, id: u32) -> Option<i32>;

    /// Drive a settable port.
    fn write_port(&mut self, id: u32, value: &[u8]);

    /// Sample a gettable port into a zeroed buffer.
    fn read_port(&mut self, id: u32, value: &mut [u8]);

    /// Advance simulated time. Blocks until the engine is done.
    fn advance(&mut self, timesteps: i32);

    /// Prepare waveform output at `path`. Called at most once.
    fn trace_init(&mut self, path: &Path) {
        tracing::debug!(path = %path.display(), "engine has no waveform support");
    }

    fn trace_enable(&mut self) {}

    fn trace_disable(&mut self) {}

    /// Push anything the engine has printed but still buffers to fd 1.
    ///
    /// Called before every log tail. The default covers output written
    /// through Rust's `stdout`; engines that print through another buffered
    /// stream must flush it here.
    fn flush_output(&mut self) {
        if let Err(err) = io::stdout().flush() {
            tracing::warn!(error = %err, "could not flush stdout");
        }
    }

    /// Final evaluation after the host sent `D`.
    fn finish(&mut self) {}
}

impl<E: Engine + ?Sized> Engine for &mut E {
    fn settable_width(&self, id: u32) -> Option<i32> {
        (**self).settable_width(id)
    }

    fn gettable_width(&self, id: u32) -> Option<i32> {
        (**self).gettable_width(id)
    }

    fn write_port(&mut self, id: u32, value: &[u8]) {
        (**self).write_port(id, value)
    }

    fn read_port(&mut self, id: u32, value: &mut [u8]) {
        (**self).read_port(id, value)
    }

    fn advance(&mut self, timesteps: i32) {
        (**self).advance(timesteps)
    }

    fn trace_init(&mut self, path: &Path) {
        (**self).trace_init(path)
    }

    fn trace_enable(&mut self) {
        (**self).trace_enable()
    }

    fn trace_disable(&mut self) {
        (**self).trace_disable()
    }

    fn flush_output(&mut self) {
        (**self).flush_output()
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}
