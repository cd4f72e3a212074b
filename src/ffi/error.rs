use std::ffi::{CString, c_char, c_int};

use crate::error::Error;

/// Captured failure handed to C callers through an `Exiv2Error **` out-parameter.
#[derive(Debug)]
pub struct Exiv2Error {
    code: c_int,
    what: CString,
}

impl Exiv2Error {
    pub fn code(&self) -> c_int {
        self.code
    }

    pub fn what(&self) -> &str {
        self.what.to_str().unwrap_or_default()
    }
}

impl From<Error> for Exiv2Error {
    fn from(err: Error) -> Self {
        let mut message = err.to_string().into_bytes();
        message.retain(|&b| b != 0);
        Self {
            code: err.code(),
            what: CString::new(message).unwrap_or_default(),
        }
    }
}

/// Numeric code of `err`, 0 for a null pointer.
///
/// # Safety
/// `err` must be null or a pointer produced by this library and not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_error_code(err: *const Exiv2Error) -> c_int {
    // SAFETY: caller guarantees `err` is null or live.
    unsafe { err.as_ref() }.map_or(0, Exiv2Error::code)
}

/// Message of `err`, borrowed until [`exiv2_error_free`]. Null for a null pointer.
///
/// # Safety
/// `err` must be null or a pointer produced by this library and not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_error_what(err: *const Exiv2Error) -> *const c_char {
    // SAFETY: caller guarantees `err` is null or live.
    unsafe { err.as_ref() }.map_or(std::ptr::null(), |e| e.what.as_ptr())
}

/// # Safety
/// `err` must be null or a pointer produced by this library and not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exiv2_error_free(err: *mut Exiv2Error) {
    // SAFETY: caller guarantees `err` is null or live and unaliased.
    unsafe { super::free_handle(err) }
}
