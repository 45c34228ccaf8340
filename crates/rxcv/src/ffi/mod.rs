//! C-compatible FFI interface
//!
//! Every exported function returns an [`FfiResult`] by value. `error` is
//! null on success; otherwise it holds a message the caller must release
//! with `rxcv_string_free`, and `ok` holds a fallback (`-1` for counts and
//! dimensions, `0.0` for measurements, `false` for status, null for
//! pointers, the null handle for constructors).
//!
//! # Memory Ownership Rules
//!
//! - Constructors return a [`Handle`]; the caller owns it and must release
//!   it exactly once with the matching `*_release` function
//! - Releasing a handle twice, or using a released handle, is reported as
//!   an error instead of touching freed memory
//! - Data pointers returned by accessors stay valid until the handle is
//!   released or used as the output of another operation
//! - Input byte ranges are only read during the call that receives them
//!
//! # Thread Safety
//!
//! Registries are internally locked and no lock is held while an operation
//! computes. Calls on distinct handles may run concurrently; concurrent
//! writes to the same output handle are last-writer-wins.
//!
//! # Safety
//!
//! Null pointers are checked. Non-null pointers must be valid for the
//! length passed alongside them.

pub mod bytes;
pub mod contours;
pub mod imgcodecs;
pub mod imgproc;
pub mod mat;

use std::os::raw::c_char;
use std::slice;

use rxcv_ffi_common::{cstr_to_str, try_execute, FfiResult, Handle};

use crate::config::{self, BoundaryConfig};
use crate::error::{CvError, Result};
use crate::logging;
use crate::mat::Mat;
use crate::registry::MATS;

/// C-compatible boundary configuration. Zero / null fields keep defaults.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RxcvConfigC {
    /// Largest `rows * cols * channels` of a matrix (0 for default)
    pub max_elements: usize,
    /// Largest caller byte buffer accepted (0 for default)
    pub max_buffer_len: usize,
    /// tracing filter used when `RXCV_LOG` is unset (null for default)
    pub log_filter: *const c_char,
}

impl RxcvConfigC {
    /// # Safety
    /// `log_filter` must be null or a valid NUL-terminated string.
    unsafe fn to_config(&self) -> Result<BoundaryConfig> {
        let defaults = BoundaryConfig::default();
        let log_filter = if self.log_filter.is_null() {
            defaults.log_filter.clone()
        } else {
            unsafe { c_str(self.log_filter, "log filter") }?.to_string()
        };
        Ok(BoundaryConfig {
            max_elements: match self.max_elements {
                0 => defaults.max_elements,
                n => n,
            },
            max_buffer_len: match self.max_buffer_len {
                0 => defaults.max_buffer_len,
                n => n,
            },
            log_filter,
        })
    }
}

// ============================================================================
// Library Setup
// ============================================================================

/// Install configuration and logging.
///
/// # Arguments
/// - `config`: Configuration, or NULL for defaults
///
/// # Returns
/// `ok` is true if this call installed the log subscriber, false if the
/// host process already had one.
///
/// # Safety
/// `config` must be null or point to a valid `RxcvConfigC`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn rxcv_init(config: *const RxcvConfigC) -> FfiResult<bool> {
    try_execute("rxcv_init", || {
        let config = if config.is_null() {
            BoundaryConfig::default()
        } else {
            unsafe { (*config).to_config() }?
        };
        let filter = config.log_filter.clone();
        config::install(config.clone())?;
        let installed = logging::init_with_filter(&filter);
        tracing::info!(
            max_elements = config.max_elements,
            max_buffer_len = config.max_buffer_len,
            log_filter = %filter,
            "rxcv initialized"
        );
        Ok::<_, CvError>(installed)
    })
}

rxcv_ffi_common::define_string_free!(rxcv_string_free);
rxcv_ffi_common::define_version_fn!(rxcv_version);

// ============================================================================
// Shared Helpers
// ============================================================================

/// Borrow a NUL-terminated UTF-8 argument.
///
/// # Safety
/// `ptr` must be null or a valid NUL-terminated string.
pub(crate) unsafe fn c_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str> {
    unsafe { cstr_to_str(ptr) }.map_err(|e| CvError::invalid(format!("{}: {}", what, e)))
}

/// Borrow a caller byte range for the duration of one call.
///
/// # Safety
/// `data` must be valid for reads of `len` bytes when non-null.
pub(crate) unsafe fn byte_slice<'a>(data: *const u8, len: usize) -> Result<&'a [u8]> {
    if data.is_null() {
        return Err(CvError::invalid("null data pointer"));
    }
    config::check_buffer_len(len)?;
    Ok(unsafe { slice::from_raw_parts(data, len) })
}

/// Mutable counterpart of [`byte_slice`].
///
/// # Safety
/// `data` must be valid for writes of `len` bytes when non-null.
pub(crate) unsafe fn byte_slice_mut<'a>(data: *mut u8, len: usize) -> Result<&'a mut [u8]> {
    if data.is_null() {
        return Err(CvError::invalid("null data pointer"));
    }
    Ok(unsafe { slice::from_raw_parts_mut(data, len) })
}

pub(crate) fn to_usize(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| CvError::invalid(format!("{} {} is negative", what, value)))
}

pub(crate) fn to_i32(value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| CvError::Limit(format!("{} does not fit in i32", value)))
}

/// Read `src`, compute, and replace `dst` with the result.
///
/// `dst` is checked before computing and left untouched on failure;
/// `src == dst` is allowed.
pub(crate) fn apply(src: Handle, dst: Handle, op: impl FnOnce(&Mat) -> Result<Mat>) -> Result<bool> {
    let input = MATS.get(src)?;
    let _ = MATS.get(dst)?;
    let output = op(&input)?;
    drop(input);
    MATS.replace(dst, output)?;
    Ok(true)
}
