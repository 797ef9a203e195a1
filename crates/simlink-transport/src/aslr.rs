//! Address-space layout randomization probe.
//!
//! Some simulator backends only work when relaunched with randomization
//! disabled; the driver uses this probe to report a backend that failed to do
//! so instead of misbehaving later.

/// `ADDR_NO_RANDOMIZE` from `<sys/personality.h>`.
#[cfg(target_os = "linux")]
const ADDR_NO_RANDOMIZE: libc::c_int = 0x0040000;

/// Whether address-space randomization is disabled for this process.
///
/// Returns `None` where the platform offers no way to ask.
#[cfg(target_os = "linux")]
pub fn aslr_disabled() -> Option<bool> {
    // SAFETY: `personality(0xffffffff)` only queries the current execution
    // domain; it does not change it.
    let persona = unsafe { libc::personality(0xffff_ffff) };
    if persona == -1 {
        return None;
    }
    Some(persona & ADDR_NO_RANDOMIZE != 0)
}

/// Whether address-space randomization is disabled for this process.
///
/// Returns `None` where the platform offers no way to ask.
#[cfg(not(target_os = "linux"))]
pub fn aslr_disabled() -> Option<bool> {
    None
}
