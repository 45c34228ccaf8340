//! Codec exports: path read/write and byte-buffer encode/decode

use std::ffi::CString;

use pretty_assertions::assert_eq;
use rxcv::consts::{ImreadFlags, CV_8UC1, CV_8UC3};
use rxcv::ffi::bytes::*;
use rxcv::ffi::imgcodecs::*;
use rxcv::ffi::mat::*;
use rxcv::{FfiResult, Handle};

fn ok<T>(result: FfiResult<T>) -> T {
    result.into_result().unwrap()
}

fn gradient(rows: i32, cols: i32) -> (Handle, Vec<u8>) {
    let data: Vec<u8> = (0..rows * cols * 3).map(|i| (i * 7 % 256) as u8).collect();
    let mat = ok(rxcv_mat_from_shape_vec(rows, cols, CV_8UC3, data.as_ptr(), data.len()));
    (mat, data)
}

fn contents(mat: Handle) -> Vec<u8> {
    let len = ok(rxcv_mat_data_len(mat)) as usize;
    let mut out = vec![0u8; len];
    ok(rxcv_mat_copy_to(mat, out.as_mut_ptr(), len));
    out
}

fn encode(mat: Handle, ext: &str) -> Vec<u8> {
    let bytes = ok(rxcv_bytes_new());
    let ext = CString::new(ext).unwrap();
    assert!(ok(rxcv_imencode(mat, bytes, ext.as_ptr())));

    let len = ok(rxcv_bytes_size(bytes)) as usize;
    let ptr = ok(rxcv_bytes_data(bytes));
    let encoded = unsafe { std::slice::from_raw_parts(ptr, len) }.to_vec();
    ok(rxcv_bytes_release(bytes));
    encoded
}

#[test]
fn test_png_memory_round_trip() {
    let (mat, data) = gradient(4, 6);
    let encoded = encode(mat, ".png");
    assert_eq!(&encoded[1..4], b"PNG");

    let decoded = ok(rxcv_imdecode(encoded.as_ptr(), encoded.len(), ImreadFlags::COLOR));
    assert_eq!(ok(rxcv_mat_rows(decoded)), 4);
    assert_eq!(ok(rxcv_mat_cols(decoded)), 6);
    assert_eq!(ok(rxcv_mat_type(decoded)), CV_8UC3);
    assert_eq!(contents(decoded), data);

    ok(rxcv_mat_release(decoded));
    ok(rxcv_mat_release(mat));
}

#[test]
fn test_jpeg_memory_round_trip_keeps_shape() {
    let (mat, _) = gradient(16, 24);
    let encoded = encode(mat, ".jpg");
    assert_eq!(&encoded[..2], &[0xFF, 0xD8]);

    let decoded = ok(rxcv_imdecode(encoded.as_ptr(), encoded.len(), ImreadFlags::COLOR));
    assert_eq!(ok(rxcv_mat_rows(decoded)), 16);
    assert_eq!(ok(rxcv_mat_cols(decoded)), 24);
    assert_eq!(ok(rxcv_mat_channels(decoded)), 3);

    ok(rxcv_mat_release(decoded));
    ok(rxcv_mat_release(mat));
}

#[test]
fn test_decode_as_grayscale() {
    let (mat, _) = gradient(3, 3);
    let encoded = encode(mat, ".png");

    let gray = ok(rxcv_imdecode(encoded.as_ptr(), encoded.len(), ImreadFlags::GRAYSCALE));
    assert_eq!(ok(rxcv_mat_type(gray)), CV_8UC1);
    assert_eq!(ok(rxcv_mat_total(gray)), 9);

    ok(rxcv_mat_release(gray));
    ok(rxcv_mat_release(mat));
}

#[test]
fn test_encode_failure_keeps_buffer() {
    let (mat, _) = gradient(2, 2);
    let bytes = ok(rxcv_bytes_new());
    let ext = CString::new(".nope").unwrap();

    let result = rxcv_imencode(mat, bytes, ext.as_ptr());
    assert!(!result.ok);
    assert!(result.into_result().is_err());
    assert_eq!(ok(rxcv_bytes_size(bytes)), 0);

    ok(rxcv_bytes_release(bytes));
    assert!(rxcv_imencode(mat, bytes, CString::new(".png").unwrap().as_ptr())
        .into_result()
        .is_err());
    ok(rxcv_mat_release(mat));
}

#[test]
fn test_decode_rejects_bad_input() {
    let garbage = [1u8, 2, 3, 4, 5];
    let result = rxcv_imdecode(garbage.as_ptr(), garbage.len(), ImreadFlags::COLOR);
    assert!(result.ok.is_null());
    assert!(result.into_result().is_err());

    assert!(rxcv_imdecode(garbage.as_ptr(), 0, ImreadFlags::COLOR).into_result().is_err());
    assert!(rxcv_imdecode(std::ptr::null(), 10, ImreadFlags::COLOR).into_result().is_err());
    assert!(rxcv_imdecode(garbage.as_ptr(), garbage.len(), 64).into_result().is_err());
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = CString::new(dir.path().join("frame.png").to_str().unwrap()).unwrap();
    let (mat, data) = gradient(5, 7);

    assert!(ok(rxcv_imwrite(mat, path.as_ptr())));
    let read = ok(rxcv_imread(path.as_ptr(), ImreadFlags::UNCHANGED));
    assert_eq!(ok(rxcv_mat_rows(read)), 5);
    assert_eq!(ok(rxcv_mat_cols(read)), 7);
    assert_eq!(contents(read), data);

    ok(rxcv_mat_release(read));
    ok(rxcv_mat_release(mat));
}

#[test]
fn test_read_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = CString::new(dir.path().join("missing.png").to_str().unwrap()).unwrap();

    let result = rxcv_imread(path.as_ptr(), ImreadFlags::COLOR);
    assert_eq!(result.ok, Handle::NULL);
    assert!(result.into_result().is_err());

    assert!(rxcv_imread(std::ptr::null(), ImreadFlags::COLOR).into_result().is_err());
}
