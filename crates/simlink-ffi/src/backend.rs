use std::ffi::c_void;
use std::os::raw::{c_char, c_int};

/// Reads a port's current value into a little-endian buffer.
pub type SimlinkValueGetter = unsafe extern "C" fn(data: *mut u8);

/// Drives a port from a little-endian buffer.
pub type SimlinkValueSetter = unsafe extern "C" fn(data: *const u8);

/// Looks up a gettable port. Returns nonzero if `id` is unknown.
pub type SimlinkPortGetter = unsafe extern "C" fn(
    ctx: *mut c_void,
    id: c_int,
    width: *mut c_int,
    getter: *mut Option<SimlinkValueGetter>,
) -> c_int;

/// Looks up a settable port. Returns nonzero if `id` is unknown.
pub type SimlinkPortSetter = unsafe extern "C" fn(
    ctx: *mut c_void,
    id: c_int,
    width: *mut c_int,
    setter: *mut Option<SimlinkValueSetter>,
) -> c_int;

pub type SimlinkRunSimulation = unsafe extern "C" fn(ctx: *mut c_void, timesteps: c_int);
pub type SimlinkInitializeTrace = unsafe extern "C" fn(ctx: *mut c_void, path: *const c_char);
pub type SimlinkHook = unsafe extern "C" fn(ctx: *mut c_void);

/// Callback table a compiled simulation hands to [`simlink_launch`](crate::simlink_launch).
///
/// `port_getter`, `port_setter` and `run_simulation` are required; the
/// tracing hooks and `finish` may be null.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SimlinkBackend {
    pub ctx: *mut c_void,
    pub port_getter: Option<SimlinkPortGetter>,
    pub port_setter: Option<SimlinkPortSetter>,
    pub run_simulation: Option<SimlinkRunSimulation>,
    pub initialize_trace: Option<SimlinkInitializeTrace>,
    pub enable_trace: Option<SimlinkHook>,
    pub disable_trace: Option<SimlinkHook>,
    pub finish: Option<SimlinkHook>,
}
