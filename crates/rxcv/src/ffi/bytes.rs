//! Byte buffer lifecycle and accessors

use std::ptr;

use rxcv_ffi_common::{try_execute, try_execute_or, FfiResult, Handle};

use crate::bytes::ByteBuffer;
use crate::registry::BYTES;

/// Create an empty byte buffer, typically the output of `rxcv_imencode`.
#[no_mangle]
pub extern "C" fn rxcv_bytes_new() -> FfiResult<Handle> {
    try_execute("rxcv_bytes_new", || BYTES.insert(ByteBuffer::new()))
}

#[no_mangle]
pub extern "C" fn rxcv_bytes_size(bytes: Handle) -> FfiResult<i64> {
    try_execute_or("rxcv_bytes_size", -1, || {
        BYTES.get(bytes).map(|b| b.len() as i64)
    })
}

/// Pointer to the buffer contents, valid until `bytes` is released or
/// refilled.
#[no_mangle]
pub extern "C" fn rxcv_bytes_data(bytes: Handle) -> FfiResult<*const u8> {
    try_execute_or("rxcv_bytes_data", ptr::null(), || {
        BYTES.get(bytes).map(|b| b.as_slice().as_ptr())
    })
}

#[no_mangle]
pub extern "C" fn rxcv_bytes_release(bytes: Handle) -> FfiResult<bool> {
    try_execute("rxcv_bytes_release", || BYTES.remove(bytes).map(|_| true))
}
