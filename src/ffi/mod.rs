//! The flat C surface.
//!
//! Every object handed out is an opaque boxed handle owned by the caller and
//! released through its matching `*_free` function; every free accepts null.
//! Strings returned by value (`*_datum_key`, `*_datum_to_string`,
//! `exiv2_xmp_datum_type`) are allocated with `malloc` so C callers may
//! release them with `free()` or [`exiv2_string_free`].
//!
//! Fallible calls take an optional `Exiv2Error **` slot. On failure the call
//! returns null (or nothing) and, if the slot is non-null, stores exactly one
//! error in it. Panics never cross the boundary; they surface as code 1.
//!
//! Handles are not synchronized: callers serialize access to an image and
//! everything derived from it.

mod error;
mod image;
#[cfg(feature = "logging")]
mod logging;
mod metadata;

pub use self::error::*;
pub use self::image::*;
#[cfg(feature = "logging")]
pub use self::logging::*;
pub use self::metadata::*;

use std::ffi::{CStr, c_char, c_void};
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::{Error, Result};

/// Run `f`, turning an `Err` or a panic into an error stored in `slot`.
///
/// # Safety
/// `slot` must be null or valid for a pointer write.
pub(crate) unsafe fn guard<T>(slot: *mut *mut Exiv2Error, fallback: T, f: impl FnOnce() -> Result<T>) -> T {
    let err = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => return value,
        Ok(Err(err)) => err,
        Err(panic) => {
            let what = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("Panic at the C boundary: {what}");
            Error::General(format!("Internal error: {what}"))
        }
    };

    log::debug!("Returning error {} to caller: {err}", err.code());
    if !slot.is_null() {
        // SAFETY: caller guarantees `slot` is writable.
        unsafe { *slot = Box::into_raw(Box::new(Exiv2Error::from(err))) };
    }
    fallback
}

/// Run `f` for calls without an error slot; a panic yields `fallback`.
pub(crate) fn shield<T>(fallback: T, f: impl FnOnce() -> T) -> T {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        log::error!("Panic at the C boundary");
        fallback
    })
}

/// Borrow a C string argument as UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn str_arg<'a>(ptr: *const c_char, what: &str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(Error::General(format!("{what} is null")));
    }
    // SAFETY: checked non-null; caller guarantees NUL termination.
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| Error::General(format!("{what} is not valid UTF-8")))
}

/// Borrow a handle argument mutably.
///
/// # Safety
/// `ptr` must be null or a live, unaliased handle.
pub(crate) unsafe fn handle_mut<'a, T>(ptr: *mut T, what: &str) -> Result<&'a mut T> {
    // SAFETY: caller guarantees validity.
    unsafe { ptr.as_mut() }.ok_or_else(|| Error::General(format!("{what} is null")))
}

pub(crate) fn into_handle<T>(value: T) -> *mut T {
    Box::into_raw(Box::new(value))
}

/// # Safety
/// `ptr` must be null or come from [`into_handle`] and not be freed yet.
pub(crate) unsafe fn free_handle<T>(ptr: *mut T) {
    if !ptr.is_null() {
        // SAFETY: caller guarantees `ptr` came from Box::into_raw.
        drop(unsafe { Box::from_raw(ptr) });
    }
}

/// Copy `s` into a `malloc` allocation with a trailing NUL.
pub(crate) fn malloc_string(s: &str) -> *const c_char {
    let bytes = s.as_bytes();
    // SAFETY: the allocation is len + 1 bytes and fully written before return.
    unsafe {
        let ptr = libc::malloc(bytes.len() + 1) as *mut u8;
        if ptr.is_null() {
            return std::ptr::null();
        }
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len());
        *ptr.add(bytes.len()) = 0;
        ptr as *const c_char
    }
}

/// Release a string returned by this library. Null is a no-op.
///
/// # Safety
/// `s` must be null or a string returned by this library and not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_string_free(s: *const c_char) {
    if !s.is_null() {
        // SAFETY: strings are allocated with libc::malloc.
        unsafe { libc::free(s as *mut c_void) };
    }
}

/// Library version as a packed integer: `(major << 24) | (minor << 16) | (patch << 8)`.
#[unsafe(no_mangle)]
pub extern "C" fn exiv2_version() -> u32 {
    let major: u32 = env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0);
    let minor: u32 = env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0);
    let patch: u32 = env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0);
    (major << 24) | (minor << 16) | (patch << 8)
}
