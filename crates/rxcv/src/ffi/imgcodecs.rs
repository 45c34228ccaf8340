//! Codec exports: file read/write and in-memory encode/decode

use std::os::raw::c_char;

use rxcv_ffi_common::{try_execute, FfiResult, Handle};

use crate::bytes::ByteBuffer;
use crate::consts::ImreadFlags;
use crate::error::{CvError, Result};
use crate::imgcodecs;
use crate::registry::{BYTES, MATS};

use super::{byte_slice, c_str};

/// Read an image file into a new matrix.
///
/// # Arguments
/// - `path`: NUL-terminated UTF-8 path
/// - `flags`: -1=unchanged, 0=grayscale, 1=color, 2=any depth, 4=any color
///
/// # Safety
/// `path` must be a valid NUL-terminated string.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn rxcv_imread(path: *const c_char, flags: i32) -> FfiResult<Handle> {
    try_execute("rxcv_imread", || {
        let path = unsafe { c_str(path, "path") }?;
        let mat = imgcodecs::imread(path, ImreadFlags::from_flags(flags)?)?;
        Ok::<_, CvError>(MATS.insert(mat)?)
    })
}

/// Write `mat` to `path`; the format follows the file extension.
///
/// # Safety
/// `path` must be a valid NUL-terminated string.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn rxcv_imwrite(mat: Handle, path: *const c_char) -> FfiResult<bool> {
    try_execute("rxcv_imwrite", || -> Result<bool> {
        let path = unsafe { c_str(path, "path") }?;
        imgcodecs::imwrite(&*MATS.get(mat)?, path)?;
        Ok(true)
    })
}

/// Encode `mat` into the byte buffer `bytes`, replacing its contents.
///
/// # Arguments
/// - `ext`: format extension such as ".png" or ".jpg"
///
/// # Safety
/// `ext` must be a valid NUL-terminated string.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn rxcv_imencode(mat: Handle, bytes: Handle, ext: *const c_char) -> FfiResult<bool> {
    try_execute("rxcv_imencode", || -> Result<bool> {
        let ext = unsafe { c_str(ext, "extension") }?;
        let _ = BYTES.get(bytes)?;
        let encoded = imgcodecs::imencode(&*MATS.get(mat)?, ext)?;
        BYTES.replace(bytes, ByteBuffer::from(encoded))?;
        Ok(true)
    })
}

/// Decode `len` bytes at `data` into a new matrix. The bytes are only read
/// during this call.
///
/// # Safety
/// `data` must be valid for reads of `len` bytes.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn rxcv_imdecode(data: *const u8, len: usize, flags: i32) -> FfiResult<Handle> {
    try_execute("rxcv_imdecode", || -> Result<Handle> {
        let data = unsafe { byte_slice(data, len) }?;
        let mat = imgcodecs::imdecode(data, ImreadFlags::from_flags(flags)?)?;
        Ok(MATS.insert(mat)?)
    })
}
