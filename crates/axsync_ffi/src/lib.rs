//! Flat C interface over [`SyncSession`].
//!
//! The handle is opaque to C callers; every function takes the pointer
//! returned by [`axsync_new`] and the caller must not use it after
//! [`axsync_destroy`].

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int, CStr};
use std::path::Path;

use axsync_sim::{SigIn, SigOut, SyncSession};
use log::warn;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct axsync_model {
    _unused: [u8; 0],
}

pub const AXSYNC_STATUS_OK: c_int = 0;
pub const AXSYNC_STATUS_TRACE_OPEN_FAILED: c_int = 1;
pub const AXSYNC_STATUS_INVALID_ARGUMENT: c_int = 2;

/// Creates a model in its reset state with no trace attached.
#[no_mangle]
pub extern "C" fn axsync_new() -> *mut axsync_model {
    Box::into_raw(Box::new(SyncSession::new())) as *mut axsync_model
}

/// # Safety
///
/// `model` must come from [`axsync_new`] and not have been destroyed.
#[no_mangle]
pub unsafe extern "C" fn axsync_destroy(model: *mut axsync_model) {
    assert!(!model.is_null());
    // Dropping the session finalizes any attached trace.
    drop(Box::from_raw(model as *mut SyncSession));
}

/// Attaches a trace at `path`, or detaches when `path` is NULL.
///
/// Returns [`AXSYNC_STATUS_TRACE_OPEN_FAILED`] only when the new destination
/// cannot be opened. Failing to finalize the previous trace is logged.
///
/// # Safety
///
/// `model` must be live. `path` must be NULL or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn axsync_trace(
    model: *mut axsync_model,
    path: *const c_char,
    depth: c_int,
) -> c_int {
    assert!(!model.is_null());
    let session = &mut *(model as *mut SyncSession);

    let Ok(depth) = u32::try_from(depth) else {
        warn!("trace depth {depth} is negative");
        return AXSYNC_STATUS_INVALID_ARGUMENT;
    };
    let path = if path.is_null() {
        None
    } else {
        match CStr::from_ptr(path).to_str() {
            Ok(path) => Some(Path::new(path)),
            Err(_) => {
                warn!("trace path is not valid UTF-8");
                return AXSYNC_STATUS_INVALID_ARGUMENT;
            }
        }
    };
    match session.set_trace(path, depth) {
        Ok(()) => AXSYNC_STATUS_OK,
        Err(e) => {
            warn!("failed to open trace: {e}");
            AXSYNC_STATUS_TRACE_OPEN_FAILED
        }
    }
}

/// Evaluates one step: writes outputs for the previously latched inputs to
/// `output`, then latches `input`.
///
/// # Safety
///
/// `model` must be live; `input` and `output` must be valid and aligned.
#[no_mangle]
pub unsafe extern "C" fn axsync_eval(
    model: *mut axsync_model,
    input: *const SigIn,
    output: *mut SigOut,
) {
    assert!(!model.is_null() && !input.is_null() && !output.is_null());
    let session = &mut *(model as *mut SyncSession);
    *output = session.eval(&*input);
}
