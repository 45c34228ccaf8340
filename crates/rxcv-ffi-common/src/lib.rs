//! Common FFI utilities for rxcv C-compatible interfaces.
//!
//! This crate holds the boundary discipline shared by every exported
//! function of the `rxcv` crate:
//!
//! - [`FfiResult`]: the `#[repr(C)]` result carrier returned by value
//! - [`try_execute`] / [`try_execute_or`]: run a unit of work, absorb any
//!   `Err` or panic, and produce a carrier instead
//! - [`HandleRegistry`]: arena of reference-counted slots addressed by
//!   generation-checked [`Handle`] tokens
//!
//! # Memory Ownership
//!
//! - A non-null `error` field of a returned carrier is owned by the caller
//! - Callers release it with the exported string free function
//!   (see [`define_string_free!`])
//! - NULL pointers are handled safely (no-op for free functions)

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

pub mod registry;
pub mod result;

pub use registry::{Handle, HandleRegistry, RegistryError};
pub use result::{try_execute, try_execute_or, FfiResult, ERROR_FALLBACK};

/// Allocate a C copy of `s` for the caller, or of `fallback` if `s`
/// contains an interior NUL.
///
/// Release the result with [`free_cstring`].
///
/// ```
/// use rxcv_ffi_common::{cstring_new_or_fallback, free_cstring};
///
/// let msg = cstring_new_or_fallback("decode failed", "operation failed");
/// unsafe { free_cstring(msg) };
/// ```
#[inline]
pub fn cstring_new_or_fallback(s: &str, fallback: &'static str) -> *mut c_char {
    CString::new(s)
        .or_else(|_| CString::new(fallback))
        .unwrap_or_default()
        .into_raw()
}

/// Reclaim a string handed out by [`cstring_new_or_fallback`]. Null is a
/// no-op.
///
/// # Safety
/// `ptr` must be null or come from `CString::into_raw` and not be freed
/// twice.
#[inline]
pub unsafe fn free_cstring(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr) });
}

/// Borrow a caller-supplied NUL-terminated UTF-8 string.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Result<&'a str, &'static str> {
    if ptr.is_null() {
        return Err("null string");
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| "string is not UTF-8")
}

/// Export `$fn_name() -> *const c_char` returning the crate version as a
/// static string that must not be freed.
#[macro_export]
macro_rules! define_version_fn {
    ($fn_name:ident) => {
        /// Library version as a static NUL-terminated string.
        #[no_mangle]
        pub extern "C" fn $fn_name() -> *const std::os::raw::c_char {
            concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
        }
    };
}

/// Export `$fn_name(*mut c_char)` releasing the `error` string of a
/// [`FfiResult`].
#[macro_export]
macro_rules! define_string_free {
    ($fn_name:ident) => {
        /// Free an error message returned in a result carrier.
        ///
        /// # Safety
        /// `s` must come from a result carrier of this library, or be null,
        /// and must not be freed twice.
        #[no_mangle]
        pub unsafe extern "C" fn $fn_name(s: *mut std::os::raw::c_char) {
            unsafe { $crate::free_cstring(s) };
        }
    };
}
