//! Result carrier and the execute-and-capture adapter.
//!
//! Every exported function returns an [`FfiResult`] by value. Nothing that
//! goes wrong inside a call, whether an `Err` or a panic, unwinds into the
//! caller: the adapter turns it into a carrier whose `error` field holds the
//! message and whose `ok` field holds the fallback.

use std::any::Any;
use std::ffi::CStr;
use std::fmt::Display;
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use crate::{cstring_new_or_fallback, free_cstring};

/// Message used when a failure has no usable text (empty, or containing NUL).
pub const ERROR_FALLBACK: &str = "operation failed";

/// C-compatible result carrier.
///
/// `ok` is meaningful only when `error` is null. A non-null `error` is a
/// NUL-terminated message owned by the caller.
#[repr(C)]
#[derive(Debug)]
pub struct FfiResult<T> {
    /// Success value, or the fallback when `error` is set
    pub ok: T,
    /// Error message (owned by the caller, must be freed), null on success
    pub error: *mut c_char,
}

impl<T> FfiResult<T> {
    /// Successful carrier.
    pub fn ok(value: T) -> Self {
        Self {
            ok: value,
            error: ptr::null_mut(),
        }
    }

    /// Failed carrier holding `fallback` and a copy of `msg`.
    pub fn error(fallback: T, msg: &str) -> Self {
        let msg = if msg.is_empty() { ERROR_FALLBACK } else { msg };
        Self {
            ok: fallback,
            error: cstring_new_or_fallback(msg, ERROR_FALLBACK),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_null()
    }

    pub fn is_err(&self) -> bool {
        !self.error.is_null()
    }

    /// Convert back into a Rust `Result`, releasing the error message.
    ///
    /// Only valid for carriers produced by this crate; a carrier whose
    /// `error` was already freed must not be converted.
    pub fn into_result(self) -> Result<T, String> {
        if self.error.is_null() {
            return Ok(self.ok);
        }
        let msg = unsafe { CStr::from_ptr(self.error) }
            .to_string_lossy()
            .into_owned();
        unsafe { free_cstring(self.error) };
        Err(msg)
    }
}

/// Run `work` and capture its outcome, using `T::default()` on failure.
pub fn try_execute<T, E, F>(op: &str, work: F) -> FfiResult<T>
where
    T: Default,
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    try_execute_or(op, T::default(), work)
}

/// Run `work` and capture its outcome, using `fallback` on failure.
///
/// `op` names the exported function in log events.
pub fn try_execute_or<T, E, F>(op: &str, fallback: T, work: F) -> FfiResult<T>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(value)) => FfiResult::ok(value),
        Ok(Err(err)) => {
            let msg = err.to_string();
            tracing::debug!(op, error = %msg, "operation failed");
            FfiResult::error(fallback, &msg)
        }
        Err(payload) => {
            let msg = format!("panic: {}", panic_message(payload.as_ref()));
            tracing::warn!(op, error = %msg, "operation panicked");
            FfiResult::error(fallback, &msg)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}
