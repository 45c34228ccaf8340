//! Library setup through `rxcv_init`
//!
//! Configuration is process-wide, so everything runs in one test.

use std::ffi::CString;

use rxcv::consts::CV_8UC1;
use rxcv::ffi::imgcodecs::rxcv_imdecode;
use rxcv::ffi::mat::*;
use rxcv::ffi::rxcv_init;
use rxcv::ffi::rxcv_version;
use rxcv::{config, FfiResult, RxcvConfigC};

fn ok<T>(result: FfiResult<T>) -> T {
    result.into_result().unwrap()
}

#[test]
fn test_init_installs_limits() {
    let filter = CString::new("rxcv=debug").unwrap();
    let limited = RxcvConfigC {
        max_elements: 100,
        max_buffer_len: 16,
        log_filter: filter.as_ptr(),
    };
    ok(rxcv_init(&limited));

    let active = config::current();
    assert_eq!(active.max_elements, 100);
    assert_eq!(active.max_buffer_len, 16);
    assert_eq!(active.log_filter, "rxcv=debug");

    // 10x10 fits, 10x11 does not
    let fits = ok(rxcv_mat_zeros(10, 10, CV_8UC1));
    let msg = rxcv_mat_zeros(10, 11, CV_8UC1).into_result().err().unwrap();
    assert!(msg.contains("exceeds maximum"), "unexpected message: {}", msg);

    let large = [0u8; 32];
    let msg = rxcv_imdecode(large.as_ptr(), large.len(), 1).into_result().err().unwrap();
    assert!(msg.contains("32 bytes"), "unexpected message: {}", msg);

    // zero fields fall back to defaults
    let defaults = RxcvConfigC {
        max_elements: 0,
        max_buffer_len: 0,
        log_filter: std::ptr::null(),
    };
    ok(rxcv_init(&defaults));
    assert_eq!(config::current(), config::BoundaryConfig::default());
    let big = ok(rxcv_mat_zeros(100, 100, CV_8UC1));

    // null config means defaults as well
    ok(rxcv_init(std::ptr::null()));

    let version = unsafe { std::ffi::CStr::from_ptr(rxcv_version()) };
    assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));

    ok(rxcv_mat_release(fits));
    ok(rxcv_mat_release(big));
}
