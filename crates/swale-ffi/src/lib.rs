//! C FFI bindings for the Swale drainage kernel.
//!
//! Projects are assembled through a builder handle, then handed to a run
//! handle that wraps one [`swale_engine::Simulation`]. Every function
//! returns an `i32` [`status::SwaleStatus`]; out-parameters are written
//! only on success. This is the only crate of the workspace that contains
//! `unsafe` code.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run `$body` (which evaluates to an `i32` status), converting a panic
/// into `SwaleStatus::Panicked` instead of unwinding into C.
macro_rules! ffi_guard {
    ($body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(status) => status,
            Err(_) => $crate::status::SwaleStatus::Panicked as i32,
        }
    };
}

/// Lock a mutex, returning `SwaleStatus::InternalError` from the enclosing
/// closure if a previous panic poisoned it.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $crate::status::SwaleStatus::InternalError as i32,
        }
    };
}

pub mod handle;
pub mod project;
pub mod run;
pub mod status;
pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;

use status::SwaleStatus;

/// Borrow a C string as UTF-8.
#[allow(unsafe_code)]
pub(crate) fn c_str<'a>(ptr: *const c_char) -> Result<&'a str, SwaleStatus> {
    if ptr.is_null() {
        return Err(SwaleStatus::InvalidArgument);
    }
    // SAFETY: caller guarantees ptr is a valid null-terminated C string
    // that outlives the call.
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| SwaleStatus::InvalidArgument)
}

/// Borrow `len` values at `ptr`; null is accepted only for `len == 0`.
#[allow(unsafe_code)]
pub(crate) fn c_slice<'a, T>(ptr: *const T, len: usize) -> Result<&'a [T], SwaleStatus> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(SwaleStatus::InvalidArgument);
    }
    // SAFETY: caller guarantees ptr points to len valid, aligned values.
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

/// Write `value` through a non-null out-pointer.
#[allow(unsafe_code)]
pub(crate) fn write_out<T>(out: *mut T, value: T) -> Result<(), SwaleStatus> {
    if out.is_null() {
        return Err(SwaleStatus::InvalidArgument);
    }
    // SAFETY: caller guarantees out is valid and aligned for writes.
    unsafe { out.write(value) };
    Ok(())
}

/// Copy `values` into a caller buffer of `cap` elements and report the
/// count through `len_out` (which may be null).
#[allow(unsafe_code)]
pub(crate) fn write_buffer(
    values: &[f64],
    buf: *mut f64,
    cap: usize,
    len_out: *mut usize,
) -> Result<(), SwaleStatus> {
    if buf.is_null() && !values.is_empty() {
        return Err(SwaleStatus::InvalidArgument);
    }
    if cap < values.len() {
        return Err(SwaleStatus::BufferTooSmall);
    }
    if !values.is_empty() {
        // SAFETY: buf points to at least cap >= values.len() writable f64s.
        unsafe { std::ptr::copy_nonoverlapping(values.as_ptr(), buf, values.len()) };
    }
    if !len_out.is_null() {
        // SAFETY: len_out is valid per caller contract.
        unsafe { *len_out = values.len() };
    }
    Ok(())
}

/// Collapse a `Result<(), SwaleStatus>` into the status code.
pub(crate) fn status_of(result: Result<(), SwaleStatus>) -> i32 {
    match result {
        Ok(()) => SwaleStatus::Ok as i32,
        Err(status) => status as i32,
    }
}
