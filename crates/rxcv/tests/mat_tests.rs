//! Matrix and byte-buffer lifecycle through the exported functions

use pretty_assertions::assert_eq;
use rxcv::consts::{CV_32FC1, CV_8UC1, CV_8UC3};
use rxcv::ffi::bytes::*;
use rxcv::ffi::mat::*;
use rxcv::{FfiResult, Handle};

/// Unwrap a successful carrier
fn ok<T>(result: FfiResult<T>) -> T {
    result.into_result().unwrap()
}

/// Unwrap a failed carrier, returning its fallback and message
fn failed<T: Copy>(result: FfiResult<T>) -> (T, String) {
    let fallback = result.ok;
    (fallback, result.into_result().err().unwrap())
}

#[test]
fn test_from_shape_dimensions() {
    let mat = ok(rxcv_mat_from_shape(10, 20, CV_8UC3));

    assert_eq!(ok(rxcv_mat_rows(mat)), 10);
    assert_eq!(ok(rxcv_mat_cols(mat)), 20);
    assert_eq!(ok(rxcv_mat_channels(mat)), 3);
    assert_eq!(ok(rxcv_mat_type(mat)), CV_8UC3);
    assert_eq!(ok(rxcv_mat_depth(mat)), 0);
    assert_eq!(ok(rxcv_mat_elem_size(mat)), 3);
    assert_eq!(ok(rxcv_mat_total(mat)), 600);
    assert_eq!(ok(rxcv_mat_data_len(mat)), 600);
    assert!(!ok(rxcv_mat_is_empty(mat)));

    assert!(ok(rxcv_mat_release(mat)));
}

#[test]
fn test_new_is_empty() {
    let mat = ok(rxcv_mat_new());
    assert!(ok(rxcv_mat_is_empty(mat)));
    assert_eq!(ok(rxcv_mat_total(mat)), 0);
    ok(rxcv_mat_release(mat));
}

#[test]
fn test_from_shape_vec_copies_caller_data() {
    let mut data: Vec<u8> = (0..12).collect();
    let mat = ok(rxcv_mat_from_shape_vec(3, 4, CV_8UC1, data.as_ptr(), data.len()));

    // Caller memory is not retained
    data.iter_mut().for_each(|b| *b = 0);

    let mut out = vec![0u8; 12];
    assert_eq!(ok(rxcv_mat_copy_to(mat, out.as_mut_ptr(), out.len())), 12);
    assert_eq!(out, (0..12).collect::<Vec<u8>>());

    ok(rxcv_mat_release(mat));
}

#[test]
fn test_float_data_round_trip() {
    let values = [0.5f32, -1.25, 3.0, 1e6];
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
    let mat = ok(rxcv_mat_from_shape_vec(2, 2, CV_32FC1, bytes.as_ptr(), bytes.len()));

    assert_eq!(ok(rxcv_mat_elem_size(mat)), 4);
    let ptr = ok(rxcv_mat_data(mat));
    let view = unsafe { std::slice::from_raw_parts(ptr, bytes.len()) };
    assert_eq!(view, bytes.as_slice());

    ok(rxcv_mat_release(mat));
}

#[test]
fn test_from_shape_vec_rejects_wrong_length() {
    let data = [0u8; 5];
    let (handle, msg) = failed(rxcv_mat_from_shape_vec(2, 2, CV_8UC1, data.as_ptr(), data.len()));
    assert_eq!(handle, Handle::NULL);
    assert!(msg.contains("5"), "unexpected message: {}", msg);
}

#[test]
fn test_from_shape_vec_rejects_null_data() {
    let (handle, msg) = failed(rxcv_mat_from_shape_vec(2, 2, CV_8UC1, std::ptr::null(), 4));
    assert!(handle.is_null());
    assert!(msg.contains("null"));
}

#[test]
fn test_negative_dimensions_fail() {
    let (handle, msg) = failed(rxcv_mat_from_shape(-1, 4, CV_8UC1));
    assert!(handle.is_null());
    assert!(msg.contains("negative"));
}

#[test]
fn test_unknown_type_fails() {
    // depth 7 (half float) is not supported
    let (handle, _) = failed(rxcv_mat_zeros(2, 2, 7));
    assert!(handle.is_null());
}

#[test]
fn test_zeros_matches_from_shape() {
    let a = ok(rxcv_mat_from_shape(3, 2, CV_8UC3));
    let b = ok(rxcv_mat_zeros(3, 2, CV_8UC3));
    for mat in [a, b] {
        assert_eq!(ok(rxcv_mat_rows(mat)), 3);
        assert_eq!(ok(rxcv_mat_cols(mat)), 2);
        assert_eq!(ok(rxcv_mat_type(mat)), CV_8UC3);
        let mut out = vec![9u8; 18];
        ok(rxcv_mat_copy_to(mat, out.as_mut_ptr(), out.len()));
        assert_eq!(out, vec![0u8; 18]);
        ok(rxcv_mat_release(mat));
    }
    let (_, msg) = failed(rxcv_mat_zeros(2, -3, CV_8UC1));
    assert!(msg.contains("negative"));
}

#[test]
fn test_ones_sets_first_channel() {
    let mat = ok(rxcv_mat_ones(1, 2, CV_8UC3));
    let mut out = vec![9u8; 6];
    ok(rxcv_mat_copy_to(mat, out.as_mut_ptr(), out.len()));
    assert_eq!(out, vec![1, 0, 0, 1, 0, 0]);
    ok(rxcv_mat_release(mat));
}

#[test]
fn test_clone_is_independent() {
    let data = [1u8, 2, 3, 4];
    let original = ok(rxcv_mat_from_shape_vec(2, 2, CV_8UC1, data.as_ptr(), 4));
    let copy = ok(rxcv_mat_clone(original));
    assert_ne!(original, copy);

    ok(rxcv_mat_release(original));
    assert_eq!(ok(rxcv_mat_total(copy)), 4);
    ok(rxcv_mat_release(copy));
}

#[test]
fn test_copy_to_small_buffer_fails() {
    let mat = ok(rxcv_mat_zeros(4, 4, CV_8UC1));
    let mut out = [0u8; 8];
    let (written, msg) = failed(rxcv_mat_copy_to(mat, out.as_mut_ptr(), out.len()));
    assert_eq!(written, -1);
    assert!(msg.contains("smaller"));
    ok(rxcv_mat_release(mat));
}

#[test]
fn test_double_release_detected() {
    let mat = ok(rxcv_mat_zeros(2, 2, CV_8UC1));
    assert!(ok(rxcv_mat_release(mat)));

    let (released, msg) = failed(rxcv_mat_release(mat));
    assert!(!released);
    assert!(msg.contains("released"), "unexpected message: {}", msg);
}

#[test]
fn test_use_after_release_reports_fallbacks() {
    let mat = ok(rxcv_mat_zeros(2, 3, CV_8UC1));
    ok(rxcv_mat_release(mat));

    assert_eq!(failed(rxcv_mat_rows(mat)).0, -1);
    assert_eq!(failed(rxcv_mat_total(mat)).0, -1);
    assert!(!failed(rxcv_mat_is_empty(mat)).0);
    assert!(failed(rxcv_mat_data(mat)).0.is_null());
}

#[test]
fn test_released_slot_reuse_keeps_old_handle_stale() {
    let first = ok(rxcv_mat_zeros(1, 1, CV_8UC1));
    ok(rxcv_mat_release(first));
    let second = ok(rxcv_mat_zeros(5, 5, CV_8UC1));

    assert_ne!(first, second);
    assert!(rxcv_mat_rows(first).is_err());
    assert_eq!(ok(rxcv_mat_rows(second)), 5);
    ok(rxcv_mat_release(second));
}

#[test]
fn test_null_and_wrong_kind_handles() {
    let (_, msg) = failed(rxcv_mat_rows(Handle::NULL));
    assert!(msg.contains("null matrix handle"));

    let bytes = ok(rxcv_bytes_new());
    let (rows, msg) = failed(rxcv_mat_rows(bytes));
    assert_eq!(rows, -1);
    assert!(msg.contains("not a matrix handle"), "unexpected message: {}", msg);

    let mat = ok(rxcv_mat_new());
    assert!(rxcv_bytes_size(mat).is_err());

    ok(rxcv_mat_release(mat));
    ok(rxcv_bytes_release(bytes));
}

#[test]
fn test_bytes_lifecycle() {
    let bytes = ok(rxcv_bytes_new());
    assert_eq!(ok(rxcv_bytes_size(bytes)), 0);
    assert!(ok(rxcv_bytes_release(bytes)));
    assert_eq!(failed(rxcv_bytes_size(bytes)).0, -1);
    assert!(rxcv_bytes_release(bytes).is_err());
}

#[test]
fn test_error_message_freed_by_string_free() {
    let result = rxcv_mat_rows(Handle::NULL);
    assert!(result.is_err());
    unsafe { rxcv::ffi::rxcv_string_free(result.error) };
}
