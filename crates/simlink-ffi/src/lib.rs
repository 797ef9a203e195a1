//! simlink-ffi: C-ABI entry point for compiled simulations.
//!
//! A backend fills in a [`SimlinkBackend`] table and calls
//! [`simlink_launch`] from its `main`, passing the result to `exit`.

mod backend;
mod engine;
mod error;

use std::os::raw::{c_char, c_int};
use std::panic::AssertUnwindSafe;

use simlink_driver::{LaunchOptions, EXIT_FAILURE};

pub use backend::{
    SimlinkBackend, SimlinkHook, SimlinkInitializeTrace, SimlinkPortGetter, SimlinkPortSetter,
    SimlinkRunSimulation, SimlinkValueGetter, SimlinkValueSetter,
};

use engine::BackendEngine;

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

/// Serve the host protocol on this process's standard streams.
///
/// Returns the exit status for the caller to pass to `exit`. A null
/// `backend` or a missing required callback fails before the streams are
/// touched; the reason is available from [`simlink_last_error`].
///
/// # Safety
/// `backend` must be null or point to a valid [`SimlinkBackend`] whose
/// callbacks stay callable with its `ctx` until this function returns.
#[no_mangle]
pub unsafe extern "C" fn simlink_launch(
    backend: *const SimlinkBackend,
    require_aslr_disabled: bool,
) -> c_int {
    ffi_boundary(EXIT_FAILURE, || {
        error::clear_error_state();
        if backend.is_null() {
            error::set_error_message("backend cannot be null");
            return EXIT_FAILURE;
        }
        // SAFETY: non-null and valid per the caller's contract.
        let backend = unsafe { &*backend };
        let engine = match BackendEngine::new(backend) {
            Ok(engine) => engine,
            Err(missing) => {
                error::set_error_message(format!("backend callback `{missing}` cannot be null"));
                return EXIT_FAILURE;
            }
        };
        launch_engine(engine, LaunchOptions {
            require_aslr_disabled,
        })
    })
}

#[cfg(unix)]
fn launch_engine(engine: BackendEngine, options: LaunchOptions) -> c_int {
    simlink_driver::launch(engine, options)
}

#[cfg(not(unix))]
fn launch_engine(_engine: BackendEngine, _options: LaunchOptions) -> c_int {
    error::set_error_message("stdio rebinding is only supported on unix");
    EXIT_FAILURE
}

/// The last error recorded on this thread, or an empty string.
#[no_mangle]
pub extern "C" fn simlink_last_error() -> *const c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::ffi::{c_void, CStr};
    use std::io::Cursor;
    use std::ptr;

    use simlink_driver::{serve, DriverConfig, EXIT_SUCCESS};

    use super::*;

    thread_local! {
        static REGISTER: Cell<u8> = const { Cell::new(0) };
    }

    #[derive(Default)]
    struct Context {
        timesteps: i32,
        finished: bool,
    }

    unsafe extern "C" fn read_register(data: *mut u8) {
        // SAFETY: the driver passes a one-byte buffer for an 8-bit port.
        REGISTER.with(|register| unsafe { *data = register.get() });
    }

    unsafe extern "C" fn write_register(data: *const u8) {
        // SAFETY: as in `read_register`.
        REGISTER.with(|register| register.set(unsafe { *data }));
    }

    unsafe extern "C" fn port_getter(
        _ctx: *mut c_void,
        id: c_int,
        width: *mut c_int,
        getter: *mut Option<SimlinkValueGetter>,
    ) -> c_int {
        if id != 3 {
            return 1;
        }
        // SAFETY: out-pointers come from the engine adapter.
        unsafe {
            *width = 8;
            *getter = Some(read_register);
        }
        0
    }

    unsafe extern "C" fn port_setter(
        _ctx: *mut c_void,
        id: c_int,
        width: *mut c_int,
        setter: *mut Option<SimlinkValueSetter>,
    ) -> c_int {
        if id != 3 {
            return 1;
        }
        // SAFETY: as in `port_getter`.
        unsafe {
            *width = 8;
            *setter = Some(write_register);
        }
        0
    }

    unsafe extern "C" fn run_simulation(ctx: *mut c_void, timesteps: c_int) {
        // SAFETY: tests pass a `Context` as ctx.
        let context = unsafe { &mut *ctx.cast::<Context>() };
        context.timesteps += timesteps;
    }

    unsafe extern "C" fn finish(ctx: *mut c_void) {
        // SAFETY: as in `run_simulation`.
        let context = unsafe { &mut *ctx.cast::<Context>() };
        context.finished = true;
    }

    fn backend(context: &mut Context) -> SimlinkBackend {
        SimlinkBackend {
            ctx: ptr::from_mut(context).cast(),
            port_getter: Some(port_getter),
            port_setter: Some(port_setter),
            run_simulation: Some(run_simulation),
            initialize_trace: None,
            enable_trace: None,
            disable_trace: None,
            finish: Some(finish),
        }
    }

    fn last_error() -> String {
        let ptr = simlink_last_error();
        assert!(!ptr.is_null());
        // SAFETY: simlink_last_error returns a pointer to a thread-local CString.
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }

    #[test]
    fn null_backend_is_rejected() {
        // SAFETY: null is explicitly allowed.
        let status = unsafe { simlink_launch(ptr::null(), false) };
        assert_ne!(status, 0);
        assert_eq!(last_error(), "backend cannot be null");
    }

    #[test]
    fn missing_required_callback_is_rejected() {
        let mut context = Context::default();
        let mut table = backend(&mut context);
        table.run_simulation = None;

        // SAFETY: the table is valid; launch fails before calling anything.
        let status = unsafe { simlink_launch(&table, false) };
        assert_ne!(status, 0);
        assert_eq!(last_error(), "backend callback `run_simulation` cannot be null");
    }

    #[test]
    fn backend_engine_serves_commands() {
        let mut context = Context::default();
        let table = backend(&mut context);
        let engine = BackendEngine::new(&table).unwrap();

        let mut messages = Vec::new();
        let status = serve(
            engine,
            Cursor::new(b"S 3 A5\nR 7\nG u 3\nG u 4\n".to_vec()),
            &mut messages,
            &DriverConfig::default(),
            LaunchOptions::default(),
        );

        assert_eq!(status, EXIT_FAILURE);
        assert_eq!(
            String::from_utf8(messages).unwrap(),
            "r ready\nk ack\nk ack\nb 00000008 A5\n\
             e invalid port ID '4' when resolving port for GET_BITS command\n"
        );
        assert_eq!(context.timesteps, 7);
        assert!(!context.finished);
    }

    #[test]
    fn finish_hook_runs_after_done() {
        let mut context = Context::default();
        let table = backend(&mut context);
        let engine = BackendEngine::new(&table).unwrap();

        let mut messages = Vec::new();
        let status = serve(
            engine,
            Cursor::new(b"W 1\nD\n".to_vec()),
            &mut messages,
            &DriverConfig::default(),
            LaunchOptions::default(),
        );

        assert_eq!(status, EXIT_SUCCESS);
        assert_eq!(messages, b"r ready\nk ack\n");
        assert!(context.finished);
    }
}
