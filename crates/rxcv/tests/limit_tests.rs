//! Operations whose caller-supplied sizes exceed `max_elements`
//!
//! Configuration is process-wide, so everything runs in one test.

use pretty_assertions::assert_eq;
use rxcv::consts::CV_8UC1;
use rxcv::ffi::imgproc::*;
use rxcv::ffi::mat::*;
use rxcv::ffi::rxcv_init;
use rxcv::{FfiResult, Handle, Point, Point2f, RxcvConfigC, Size};

const CENTER: Point = Point { x: -1, y: -1 };
const BORDER_DEFAULT: i32 = 4;
const LINEAR: i32 = 1;

fn ok<T>(result: FfiResult<T>) -> T {
    result.into_result().unwrap()
}

fn contents(mat: Handle) -> Vec<u8> {
    let len = ok(rxcv_mat_data_len(mat)) as usize;
    let mut out = vec![0u8; len];
    ok(rxcv_mat_copy_to(mat, out.as_mut_ptr(), len));
    out
}

fn assert_rejected(result: FfiResult<bool>, dst: Handle, before: &[u8]) {
    assert!(!result.ok);
    let msg = result.into_result().err().unwrap();
    assert!(
        msg.contains("exceeds maximum") || msg.contains("overflows"),
        "unexpected message: {}",
        msg
    );
    assert_eq!(ok(rxcv_mat_rows(dst)), 2);
    assert_eq!(ok(rxcv_mat_cols(dst)), 3);
    assert_eq!(contents(dst), before);
}

#[test]
fn test_operations_respect_element_limit() {
    let limited = RxcvConfigC {
        max_elements: 300,
        max_buffer_len: 0,
        log_filter: std::ptr::null(),
    };
    ok(rxcv_init(&limited));

    let data: Vec<u8> = (0..100).collect();
    let src = ok(rxcv_mat_from_shape_vec(10, 10, CV_8UC1, data.as_ptr(), data.len()));
    let before = [1u8, 2, 3, 4, 5, 6];
    let dst = ok(rxcv_mat_from_shape_vec(2, 3, CV_8UC1, before.as_ptr(), before.len()));

    // 15x15 fits, 1e7x1e7 does not
    let scaled = ok(rxcv_mat_new());
    assert!(ok(rxcv_resize(src, scaled, Size::default(), 1.5, 1.5, LINEAR)));
    assert_eq!(ok(rxcv_mat_total(scaled)), 225);
    ok(rxcv_mat_release(scaled));
    assert_rejected(rxcv_resize(src, dst, Size::default(), 1e6, 1e6, LINEAR), dst, &before);
    assert_rejected(rxcv_resize(src, dst, Size::new(20, 20), 0.0, 0.0, LINEAR), dst, &before);

    // sigma 10 on 8-bit data derives a 61x61 kernel
    assert_rejected(
        rxcv_gaussian_blur(src, dst, Size::default(), 10.0, 0.0, BORDER_DEFAULT),
        dst,
        &before,
    );
    assert_rejected(
        rxcv_gaussian_blur(src, dst, Size::default(), 1e9, 0.0, BORDER_DEFAULT),
        dst,
        &before,
    );

    assert_rejected(
        rxcv_blur(src, dst, Size::new(i32::MAX, 1), CENTER, BORDER_DEFAULT),
        dst,
        &before,
    );
    assert_rejected(rxcv_median_blur(src, dst, 19), dst, &before);
    assert_rejected(
        rxcv_bilateral_filter(src, dst, i32::MAX, 20.0, 20.0, BORDER_DEFAULT),
        dst,
        &before,
    );
    assert_rejected(
        rxcv_get_rect_sub_pix(src, dst, Size::new(20, 20), Point2f::new(5.0, 5.0), -1),
        dst,
        &before,
    );
    assert_rejected(
        rxcv_adaptive_threshold(src, dst, 255.0, 0, 0, 19, 0.0),
        dst,
        &before,
    );

    let element = rxcv_get_structuring_element(0, Size::new(20, 20), CENTER);
    assert!(element.ok.is_null());
    assert!(element.into_result().is_err());

    // kernels within the limit still run
    assert!(ok(rxcv_blur(src, dst, Size::new(3, 3), CENTER, BORDER_DEFAULT)));
    assert_eq!(ok(rxcv_mat_total(dst)), 100);

    ok(rxcv_init(std::ptr::null()));
    ok(rxcv_mat_release(src));
    ok(rxcv_mat_release(dst));
}
