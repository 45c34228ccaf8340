//! Image-processing exports
//!
//! Each operation reads `src`, computes into a fresh matrix and swaps the
//! result into `dst`. `src` and `dst` may be the same handle. A failed
//! operation leaves `dst` as it was.

use rxcv_ffi_common::{try_execute, try_execute_or, FfiResult, Handle};

use crate::consts::{
    AdaptiveMethod, BorderType, ColorConversion, FlipCode, Interpolation, MorphShape, MorphType,
    RotateCode, ThresholdFlags, ThresholdType,
};
use crate::error::Result;
use crate::imgproc;
use crate::registry::MATS;
use crate::types::{Point, Point2f, Size};

use super::apply;

// ============================================================================
// Color And Threshold
// ============================================================================

/// Convert between color spaces.
///
/// # Arguments
/// - `code`: conversion code, e.g. 6 = BGR to GRAY, 40 = BGR to HSV
#[no_mangle]
pub extern "C" fn rxcv_cvt_color(src: Handle, dst: Handle, code: i32) -> FfiResult<bool> {
    try_execute("rxcv_cvt_color", || -> Result<bool> {
        let code = ColorConversion::try_from(code)?;
        apply(src, dst, |m| imgproc::cvt_color(m, code))
    })
}

/// Fixed-level threshold.
///
/// # Arguments
/// - `typ`: 0=binary, 1=binary-inv, 2=trunc, 3=tozero, 4=tozero-inv,
///   optionally `| 8` to pick the level with Otsu's method
///
/// # Returns
/// The threshold actually used (the Otsu level when requested).
#[no_mangle]
pub extern "C" fn rxcv_threshold(
    src: Handle,
    dst: Handle,
    thresh: f64,
    maxval: f64,
    typ: i32,
) -> FfiResult<f64> {
    try_execute_or("rxcv_threshold", 0.0, || -> Result<f64> {
        let flags = ThresholdFlags::from_flags(typ)?;
        let mut used = thresh;
        apply(src, dst, |m| {
            let (out, level) = imgproc::threshold(m, thresh, maxval, flags)?;
            used = level;
            Ok(out)
        })?;
        Ok(used)
    })
}

/// Threshold against the mean of each `block x block` neighbourhood minus `c`.
///
/// # Arguments
/// - `method`: 0=mean, 1=gaussian-weighted mean
/// - `typ`: 0=binary, 1=binary-inv
#[no_mangle]
pub extern "C" fn rxcv_adaptive_threshold(
    src: Handle,
    dst: Handle,
    maxval: f64,
    method: i32,
    typ: i32,
    block: i32,
    c: f64,
) -> FfiResult<bool> {
    try_execute("rxcv_adaptive_threshold", || -> Result<bool> {
        let method = AdaptiveMethod::try_from(method)?;
        let kind = ThresholdType::try_from(typ)?;
        apply(src, dst, |m| imgproc::adaptive_threshold(m, maxval, method, kind, block, c))
    })
}

// ============================================================================
// Filtering
// ============================================================================

/// Correlate `src` with an arbitrary kernel matrix.
///
/// # Arguments
/// - `ddepth`: output depth, -1 to keep the source depth
/// - `kernel`: single-channel matrix; may be the same handle as `src`
/// - `anchor`: kernel anchor, (-1, -1) for the center
#[no_mangle]
pub extern "C" fn rxcv_filter2d(
    src: Handle,
    dst: Handle,
    ddepth: i32,
    kernel: Handle,
    anchor: Point,
    delta: f64,
    border: i32,
) -> FfiResult<bool> {
    try_execute("rxcv_filter2d", || -> Result<bool> {
        let border = BorderType::from_flags(border)?;
        let kernel = MATS.get(kernel)?;
        apply(src, dst, |m| imgproc::filter2d(m, ddepth, &kernel, anchor, delta, border))
    })
}

/// Normalized box filter; `ksize` is width x height.
#[no_mangle]
pub extern "C" fn rxcv_blur(
    src: Handle,
    dst: Handle,
    ksize: Size,
    anchor: Point,
    border: i32,
) -> FfiResult<bool> {
    try_execute("rxcv_blur", || -> Result<bool> {
        let border = BorderType::from_flags(border)?;
        apply(src, dst, |m| imgproc::blur(m, ksize, anchor, border))
    })
}

#[no_mangle]
pub extern "C" fn rxcv_box_filter(
    src: Handle,
    dst: Handle,
    ddepth: i32,
    ksize: Size,
    anchor: Point,
    normalize: bool,
    border: i32,
) -> FfiResult<bool> {
    try_execute("rxcv_box_filter", || -> Result<bool> {
        let border = BorderType::from_flags(border)?;
        apply(src, dst, |m| {
            imgproc::box_filter(m, ddepth, ksize, anchor, normalize, border)
        })
    })
}

/// Gaussian blur. A zero `ksize` is derived from the sigmas; a zero
/// `sigma_y` copies `sigma_x`.
#[no_mangle]
pub extern "C" fn rxcv_gaussian_blur(
    src: Handle,
    dst: Handle,
    ksize: Size,
    sigma_x: f64,
    sigma_y: f64,
    border: i32,
) -> FfiResult<bool> {
    try_execute("rxcv_gaussian_blur", || -> Result<bool> {
        let border = BorderType::from_flags(border)?;
        apply(src, dst, |m| imgproc::gaussian_blur(m, ksize, sigma_x, sigma_y, border))
    })
}

#[no_mangle]
pub extern "C" fn rxcv_median_blur(src: Handle, dst: Handle, ksize: i32) -> FfiResult<bool> {
    try_execute("rxcv_median_blur", || apply(src, dst, |m| imgproc::median_blur(m, ksize)))
}

/// Edge-preserving smoothing over a disc of diameter `d`.
#[no_mangle]
pub extern "C" fn rxcv_bilateral_filter(
    src: Handle,
    dst: Handle,
    d: i32,
    sigma_color: f64,
    sigma_space: f64,
    border: i32,
) -> FfiResult<bool> {
    try_execute("rxcv_bilateral_filter", || -> Result<bool> {
        let border = BorderType::from_flags(border)?;
        apply(src, dst, |m| {
            imgproc::bilateral_filter(m, d, sigma_color, sigma_space, border)
        })
    })
}

// ============================================================================
// Morphology
// ============================================================================

#[no_mangle]
pub extern "C" fn rxcv_erode(
    src: Handle,
    dst: Handle,
    kernel: Handle,
    anchor: Point,
    iterations: i32,
    border: i32,
) -> FfiResult<bool> {
    try_execute("rxcv_erode", || -> Result<bool> {
        let border = BorderType::from_flags(border)?;
        let kernel = MATS.get(kernel)?;
        apply(src, dst, |m| imgproc::erode(m, &kernel, anchor, iterations, border))
    })
}

#[no_mangle]
pub extern "C" fn rxcv_dilate(
    src: Handle,
    dst: Handle,
    kernel: Handle,
    anchor: Point,
    iterations: i32,
    border: i32,
) -> FfiResult<bool> {
    try_execute("rxcv_dilate", || -> Result<bool> {
        let border = BorderType::from_flags(border)?;
        let kernel = MATS.get(kernel)?;
        apply(src, dst, |m| imgproc::dilate(m, &kernel, anchor, iterations, border))
    })
}

/// Compound morphology.
///
/// # Arguments
/// - `op`: 0=erode, 1=dilate, 2=open, 3=close, 4=gradient, 5=tophat,
///   6=blackhat
/// - `kernel`: structuring element; an empty matrix means 3x3 rectangle
#[no_mangle]
pub extern "C" fn rxcv_morphology_ex(
    src: Handle,
    dst: Handle,
    op: i32,
    kernel: Handle,
    anchor: Point,
    iterations: i32,
    border: i32,
) -> FfiResult<bool> {
    try_execute("rxcv_morphology_ex", || -> Result<bool> {
        let op = MorphType::try_from(op)?;
        let border = BorderType::from_flags(border)?;
        let kernel = MATS.get(kernel)?;
        apply(src, dst, |m| {
            imgproc::morphology_ex(m, op, &kernel, anchor, iterations, border)
        })
    })
}

/// Build a structuring element as a new 8-bit matrix of 0 and 1.
///
/// # Arguments
/// - `shape`: 0=rectangle, 1=cross, 2=ellipse
/// - `ksize`: width x height
#[no_mangle]
pub extern "C" fn rxcv_get_structuring_element(
    shape: i32,
    ksize: Size,
    anchor: Point,
) -> FfiResult<Handle> {
    try_execute("rxcv_get_structuring_element", || -> Result<Handle> {
        let shape = MorphShape::try_from(shape)?;
        let element = imgproc::get_structuring_element(shape, ksize, anchor)?;
        Ok(MATS.insert(element)?)
    })
}

// ============================================================================
// Geometric Transforms
// ============================================================================

/// Resize to `dsize`, or by `fx` / `fy` when `dsize` is zero.
///
/// # Arguments
/// - `interpolation`: 0=nearest, 1=linear, 2=cubic, 3=area, 4=lanczos4,
///   5=linear-exact, 6=nearest-exact
#[no_mangle]
pub extern "C" fn rxcv_resize(
    src: Handle,
    dst: Handle,
    dsize: Size,
    fx: f64,
    fy: f64,
    interpolation: i32,
) -> FfiResult<bool> {
    try_execute("rxcv_resize", || -> Result<bool> {
        let interpolation = Interpolation::try_from(interpolation)?;
        apply(src, dst, |m| imgproc::resize(m, dsize, fx, fy, interpolation))
    })
}

/// Mirror: 0 around the x axis, positive around the y axis, negative both.
#[no_mangle]
pub extern "C" fn rxcv_flip(src: Handle, dst: Handle, code: i32) -> FfiResult<bool> {
    try_execute("rxcv_flip", || apply(src, dst, |m| imgproc::flip(m, FlipCode::from(code))))
}

/// Rotate by a multiple of 90 degrees: 0=clockwise, 1=180, 2=counter-clockwise.
#[no_mangle]
pub extern "C" fn rxcv_rotate(src: Handle, dst: Handle, code: i32) -> FfiResult<bool> {
    try_execute("rxcv_rotate", || -> Result<bool> {
        let code = RotateCode::try_from(code)?;
        apply(src, dst, |m| imgproc::rotate(m, code))
    })
}

/// Sample a `patch` (width x height) centered at a sub-pixel location.
///
/// # Arguments
/// - `patch_type`: output depth, -1 to keep the source depth
#[no_mangle]
pub extern "C" fn rxcv_get_rect_sub_pix(
    src: Handle,
    dst: Handle,
    patch: Size,
    center: Point2f,
    patch_type: i32,
) -> FfiResult<bool> {
    try_execute("rxcv_get_rect_sub_pix", || {
        apply(src, dst, |m| imgproc::get_rect_sub_pix(m, patch, center, patch_type))
    })
}

/// Invert a 2x3 affine transform.
#[no_mangle]
pub extern "C" fn rxcv_invert_affine_transform(src: Handle, dst: Handle) -> FfiResult<bool> {
    try_execute("rxcv_invert_affine_transform", || {
        apply(src, dst, imgproc::invert_affine_transform)
    })
}
