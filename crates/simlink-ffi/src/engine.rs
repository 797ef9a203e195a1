use std::ffi::{c_void, CString};
use std::os::raw::c_int;
use std::path::Path;

use simlink_driver::Engine;

use crate::backend::{
    SimlinkBackend, SimlinkHook, SimlinkInitializeTrace, SimlinkPortGetter, SimlinkPortSetter,
    SimlinkRunSimulation, SimlinkValueGetter, SimlinkValueSetter,
};

/// [`Engine`] over a validated [`SimlinkBackend`].
pub(crate) struct BackendEngine {
    ctx: *mut c_void,
    port_getter: SimlinkPortGetter,
    port_setter: SimlinkPortSetter,
    run_simulation: SimlinkRunSimulation,
    initialize_trace: Option<SimlinkInitializeTrace>,
    enable_trace: Option<SimlinkHook>,
    disable_trace: Option<SimlinkHook>,
    finish: Option<SimlinkHook>,
}

impl BackendEngine {
    /// Fails with the name of the first missing required callback.
    pub(crate) fn new(backend: &SimlinkBackend) -> Result<Self, &'static str> {
        Ok(Self {
            ctx: backend.ctx,
            port_getter: backend.port_getter.ok_or("port_getter")?,
            port_setter: backend.port_setter.ok_or("port_setter")?,
            run_simulation: backend.run_simulation.ok_or("run_simulation")?,
            initialize_trace: backend.initialize_trace,
            enable_trace: backend.enable_trace,
            disable_trace: backend.disable_trace,
            finish: backend.finish,
        })
    }

    fn getter(&self, id: u32) -> Option<(i32, SimlinkValueGetter)> {
        let id = c_int::try_from(id).ok()?;
        let mut width: c_int = 0;
        let mut getter: Option<SimlinkValueGetter> = None;
        // SAFETY: the callback came from the backend table and the out-pointers
        // refer to live locals.
        let rc = unsafe { (self.port_getter)(self.ctx, id, &mut width, &mut getter) };
        if rc != 0 {
            return None;
        }
        Some((width, getter?))
    }

    fn setter(&self, id: u32) -> Option<(i32, SimlinkValueSetter)> {
        let id = c_int::try_from(id).ok()?;
        let mut width: c_int = 0;
        let mut setter: Option<SimlinkValueSetter> = None;
        // SAFETY: as in `getter`.
        let rc = unsafe { (self.port_setter)(self.ctx, id, &mut width, &mut setter) };
        if rc != 0 {
            return None;
        }
        Some((width, setter?))
    }

    fn hook(&self, hook: Option<SimlinkHook>) {
        if let Some(hook) = hook {
            // SAFETY: optional callbacks are only called when the backend set them.
            unsafe { hook(self.ctx) }
        }
    }
}

impl Engine for BackendEngine {
    fn settable_width(&self, id: u32) -> Option<i32> {
        self.setter(id).map(|(width, _)| width)
    }

    fn gettable_width(&self, id: u32) -> Option<i32> {
        self.getter(id).map(|(width, _)| width)
    }

    fn write_port(&mut self, id: u32, value: &[u8]) {
        if let Some((_, setter)) = self.setter(id) {
            // SAFETY: the driver sized `value` to the width this backend reported.
            unsafe { setter(value.as_ptr()) }
        }
    }

    fn read_port(&mut self, id: u32, value: &mut [u8]) {
        if let Some((_, getter)) = self.getter(id) {
            // SAFETY: as in `write_port`.
            unsafe { getter(value.as_mut_ptr()) }
        }
    }

    fn advance(&mut self, timesteps: i32) {
        // SAFETY: required callback validated at construction.
        unsafe { (self.run_simulation)(self.ctx, timesteps) }
    }

    fn trace_init(&mut self, path: &Path) {
        let Some(initialize) = self.initialize_trace else {
            tracing::warn!("backend has no trace support");
            return;
        };
        match CString::new(path_bytes(path)) {
            // SAFETY: `path` outlives the call; the backend copies it if needed.
            Ok(path) => unsafe { initialize(self.ctx, path.as_ptr()) },
            Err(_) => tracing::warn!(path = %path.display(), "trace path contains NUL"),
        }
    }

    fn trace_enable(&mut self) {
        self.hook(self.enable_trace);
    }

    fn trace_disable(&mut self) {
        self.hook(self.disable_trace);
    }

    /// Backends print through C stdio, which is fully buffered once fd 1 is
    /// a file.
    fn flush_output(&mut self) {
        #[cfg(unix)]
        {
            // SAFETY: fflush(NULL) flushes every open output stream and takes
            // no pointers from us.
            if unsafe { libc::fflush(std::ptr::null_mut()) } != 0 {
                tracing::warn!(
                    error = %std::io::Error::last_os_error(),
                    "could not flush C stdio"
                );
            }
        }
        if let Err(err) = std::io::Write::flush(&mut std::io::stdout()) {
            tracing::warn!(error = %err, "could not flush stdout");
        }
    }

    fn finish(&mut self) {
        self.hook(self.finish);
    }
}


#[cfg(unix)]
fn path_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}
