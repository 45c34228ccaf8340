//! Matrix lifecycle and accessors

use std::ptr;

use rxcv_ffi_common::{try_execute, try_execute_or, FfiResult, Handle};

use crate::consts::MatType;
use crate::error::Result;
use crate::mat::Mat;
use crate::registry::MATS;

use super::{byte_slice, byte_slice_mut, to_i32, to_usize};

fn insert(mat: Mat) -> Result<Handle> {
    Ok(MATS.insert(mat)?)
}

fn shape(rows: i32, cols: i32, typ: i32) -> Result<(usize, usize, MatType)> {
    Ok((
        to_usize(rows, "rows")?,
        to_usize(cols, "cols")?,
        MatType::from_raw(typ)?,
    ))
}

fn zeros(rows: i32, cols: i32, typ: i32) -> Result<Handle> {
    let (rows, cols, typ) = shape(rows, cols, typ)?;
    insert(Mat::zeros(rows, cols, typ)?)
}

fn read<T>(op: &str, fallback: T, mat: Handle, f: impl FnOnce(&Mat) -> Result<T>) -> FfiResult<T> {
    try_execute_or(op, fallback, || f(&*MATS.get(mat)?))
}

// ============================================================================
// Construction
// ============================================================================

/// Create an empty matrix.
#[no_mangle]
pub extern "C" fn rxcv_mat_new() -> FfiResult<Handle> {
    try_execute("rxcv_mat_new", || insert(Mat::empty()))
}

/// Create a zero-filled `rows x cols` matrix of type `typ`.
///
/// `typ` is `depth + ((channels - 1) << 3)`.
#[no_mangle]
pub extern "C" fn rxcv_mat_from_shape(rows: i32, cols: i32, typ: i32) -> FfiResult<Handle> {
    try_execute("rxcv_mat_from_shape", || zeros(rows, cols, typ))
}

/// Same as [`rxcv_mat_from_shape`].
#[no_mangle]
pub extern "C" fn rxcv_mat_zeros(rows: i32, cols: i32, typ: i32) -> FfiResult<Handle> {
    try_execute("rxcv_mat_zeros", || zeros(rows, cols, typ))
}

/// Create a matrix whose first channel is 1 and other channels 0.
#[no_mangle]
pub extern "C" fn rxcv_mat_ones(rows: i32, cols: i32, typ: i32) -> FfiResult<Handle> {
    try_execute("rxcv_mat_ones", || {
        let (rows, cols, typ) = shape(rows, cols, typ)?;
        insert(Mat::ones(rows, cols, typ)?)
    })
}

/// Create a matrix from a copy of `len` native-endian bytes at `data`.
///
/// `len` must equal `rows * cols * channels * element size`. The caller's
/// buffer is not retained.
///
/// # Safety
/// `data` must be valid for reads of `len` bytes.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn rxcv_mat_from_shape_vec(
    rows: i32,
    cols: i32,
    typ: i32,
    data: *const u8,
    len: usize,
) -> FfiResult<Handle> {
    try_execute("rxcv_mat_from_shape_vec", || {
        let (rows, cols, typ) = shape(rows, cols, typ)?;
        let bytes = unsafe { byte_slice(data, len) }?;
        insert(Mat::from_bytes(rows, cols, typ, bytes)?)
    })
}

/// Deep copy of `mat` under a new handle.
#[no_mangle]
pub extern "C" fn rxcv_mat_clone(mat: Handle) -> FfiResult<Handle> {
    try_execute("rxcv_mat_clone", || {
        let copy = Mat::clone(&*MATS.get(mat)?);
        insert(copy)
    })
}

/// Release a matrix. The handle is invalid afterwards.
#[no_mangle]
pub extern "C" fn rxcv_mat_release(mat: Handle) -> FfiResult<bool> {
    try_execute("rxcv_mat_release", || MATS.remove(mat).map(|_| true))
}

// ============================================================================
// Accessors
// ============================================================================

#[no_mangle]
pub extern "C" fn rxcv_mat_rows(mat: Handle) -> FfiResult<i32> {
    read("rxcv_mat_rows", -1, mat, |m| to_i32(m.rows()))
}

#[no_mangle]
pub extern "C" fn rxcv_mat_cols(mat: Handle) -> FfiResult<i32> {
    read("rxcv_mat_cols", -1, mat, |m| to_i32(m.cols()))
}

#[no_mangle]
pub extern "C" fn rxcv_mat_channels(mat: Handle) -> FfiResult<i32> {
    read("rxcv_mat_channels", -1, mat, |m| to_i32(m.channels()))
}

/// Type code (`depth + ((channels - 1) << 3)`).
#[no_mangle]
pub extern "C" fn rxcv_mat_type(mat: Handle) -> FfiResult<i32> {
    read("rxcv_mat_type", -1, mat, |m| Ok(m.mat_type().to_raw()))
}

#[no_mangle]
pub extern "C" fn rxcv_mat_depth(mat: Handle) -> FfiResult<i32> {
    read("rxcv_mat_depth", -1, mat, |m| Ok(m.depth() as i32))
}

/// Bytes per pixel across all channels.
#[no_mangle]
pub extern "C" fn rxcv_mat_elem_size(mat: Handle) -> FfiResult<i32> {
    read("rxcv_mat_elem_size", -1, mat, |m| to_i32(m.elem_size()))
}

/// `rows * cols * channels`
#[no_mangle]
pub extern "C" fn rxcv_mat_total(mat: Handle) -> FfiResult<i64> {
    read("rxcv_mat_total", -1, mat, |m| Ok(m.total() as i64))
}

#[no_mangle]
pub extern "C" fn rxcv_mat_is_empty(mat: Handle) -> FfiResult<bool> {
    read("rxcv_mat_is_empty", false, mat, |m| Ok(m.is_empty()))
}

/// Length of the element data in bytes.
#[no_mangle]
pub extern "C" fn rxcv_mat_data_len(mat: Handle) -> FfiResult<i64> {
    read("rxcv_mat_data_len", -1, mat, |m| Ok(m.as_bytes().len() as i64))
}

/// Pointer to the element data, valid until `mat` is released or
/// overwritten by an operation.
#[no_mangle]
pub extern "C" fn rxcv_mat_data(mat: Handle) -> FfiResult<*const u8> {
    read("rxcv_mat_data", ptr::null(), mat, |m| Ok(m.as_bytes().as_ptr()))
}

/// Copy the element data into `out` and return the number of bytes written.
///
/// # Safety
/// `out` must be valid for writes of `len` bytes.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn rxcv_mat_copy_to(mat: Handle, out: *mut u8, len: usize) -> FfiResult<i64> {
    read("rxcv_mat_copy_to", -1, mat, |m| {
        let out = unsafe { byte_slice_mut(out, len) }?;
        Ok(m.copy_to_slice(out)? as i64)
    })
}
