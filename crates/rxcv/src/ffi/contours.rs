//! Contour collections, single contours and positional references

use rxcv_ffi_common::{try_execute, try_execute_or, FfiResult, Handle};

use crate::consts::{ContourApprox, RetrievalMode};
use crate::contours::{Contour, ContourRef, Contours};
use crate::error::{CvError, Result};
use crate::imgproc;
use crate::registry::{CONTOUR, CONTOURS, MATS};
use crate::types::{Point, Point2f, Rect};

use super::to_i32;

fn with_contour<T>(
    op: &str,
    fallback: T,
    contour: Handle,
    f: impl FnOnce(&Contour) -> Result<T>,
) -> FfiResult<T> {
    try_execute_or(op, fallback, || f(&*CONTOUR.get(contour)?))
}

fn with_ref<T>(
    op: &str,
    fallback: T,
    reference: ContourRef,
    f: impl FnOnce(&Contour) -> Result<T>,
) -> FfiResult<T> {
    try_execute_or(op, fallback, || {
        let contours = CONTOURS.get(reference.contours)?;
        f(reference.resolve(&contours)?)
    })
}

// ============================================================================
// Collections
// ============================================================================

/// Create an empty contour collection, the output of `rxcv_find_contours`.
#[no_mangle]
pub extern "C" fn rxcv_contours_new() -> FfiResult<Handle> {
    try_execute("rxcv_contours_new", || CONTOURS.insert(Contours::new()))
}

/// Release a collection. References obtained from it stop resolving.
#[no_mangle]
pub extern "C" fn rxcv_contours_release(contours: Handle) -> FfiResult<bool> {
    try_execute("rxcv_contours_release", || CONTOURS.remove(contours).map(|_| true))
}

#[no_mangle]
pub extern "C" fn rxcv_contours_size(contours: Handle) -> FfiResult<i32> {
    try_execute_or("rxcv_contours_size", -1, || to_i32(CONTOURS.get(contours)?.len()))
}

/// Reference the contour at `index`. The reference is not released on its
/// own and fails once the collection is released or refilled.
#[no_mangle]
pub extern "C" fn rxcv_contours_at(contours: Handle, index: i32) -> FfiResult<ContourRef> {
    try_execute("rxcv_contours_at", || {
        let collection = CONTOURS.get(contours)?;
        collection.get(index as i64)?;
        Ok::<_, CvError>(ContourRef {
            contours,
            index: index as u32,
            revision: collection.revision(),
        })
    })
}

/// Trace the borders in `src` into `contours`, replacing its contents.
///
/// # Arguments
/// - `src`: single-channel 8-bit matrix; non-zero pixels are foreground
/// - `contours`: collection to fill
/// - `mode`: 0=external, 1=list, 2=ccomp, 3=tree. No hierarchy is
///   exported, so ccomp and tree return the same contours as list.
/// - `method`: 1=every boundary pixel, 2=segment end points only
///
/// # Returns
/// Number of contours found.
#[no_mangle]
pub extern "C" fn rxcv_find_contours(
    src: Handle,
    contours: Handle,
    mode: i32,
    method: i32,
) -> FfiResult<i32> {
    try_execute_or("rxcv_find_contours", -1, || {
        let mode = RetrievalMode::try_from(mode)?;
        let method = ContourApprox::try_from(method)?;
        let image = MATS.get(src)?;
        let _ = CONTOURS.get(contours)?;
        let found = imgproc::find_contours(&image, mode, method)?;
        drop(image);
        let count = to_i32(found.len())?;
        CONTOURS.update(contours, |c| c.refill(found))?;
        Ok::<_, CvError>(count)
    })
}

// ============================================================================
// Single Contours
// ============================================================================

/// Create an empty owned contour.
#[no_mangle]
pub extern "C" fn rxcv_contour_new() -> FfiResult<Handle> {
    try_execute("rxcv_contour_new", || CONTOUR.insert(Contour::new()))
}

#[no_mangle]
pub extern "C" fn rxcv_contour_release(contour: Handle) -> FfiResult<bool> {
    try_execute("rxcv_contour_release", || CONTOUR.remove(contour).map(|_| true))
}

/// Append a point to an owned contour.
#[no_mangle]
pub extern "C" fn rxcv_contour_push(contour: Handle, point: Point) -> FfiResult<bool> {
    try_execute("rxcv_contour_push", || CONTOUR.update(contour, |c| c.push(point)).map(|_| true))
}

/// Copy a referenced contour into a new owned contour.
#[no_mangle]
pub extern "C" fn rxcv_contour_ref_to_owned(reference: ContourRef) -> FfiResult<Handle> {
    try_execute("rxcv_contour_ref_to_owned", || {
        let contours = CONTOURS.get(reference.contours)?;
        let copy = reference.resolve(&contours)?.clone();
        Ok::<_, CvError>(CONTOUR.insert(copy)?)
    })
}

#[no_mangle]
pub extern "C" fn rxcv_contour_size(contour: Handle) -> FfiResult<i32> {
    with_contour("rxcv_contour_size", -1, contour, |c| to_i32(c.len()))
}

#[no_mangle]
pub extern "C" fn rxcv_contour_at(contour: Handle, index: i32) -> FfiResult<Point> {
    with_contour("rxcv_contour_at", Point::default(), contour, |c| c.get(index as i64))
}

/// Enclosed area (between pixel centers).
#[no_mangle]
pub extern "C" fn rxcv_contour_area(contour: Handle) -> FfiResult<f64> {
    with_contour("rxcv_contour_area", 0.0, contour, |c| Ok(c.area()))
}

#[no_mangle]
pub extern "C" fn rxcv_contour_arc_length(contour: Handle, closed: bool) -> FfiResult<f64> {
    with_contour("rxcv_contour_arc_length", 0.0, contour, |c| Ok(c.arc_length(closed)))
}

#[no_mangle]
pub extern "C" fn rxcv_contour_bounding_rect(contour: Handle) -> FfiResult<Rect> {
    with_contour("rxcv_contour_bounding_rect", Rect::default(), contour, |c| Ok(c.bounding_rect()))
}

/// `1.0` inside, `-1.0` outside, `0.0` on an edge; with `measure_dist`,
/// the signed distance to the nearest edge instead.
#[no_mangle]
pub extern "C" fn rxcv_contour_point_polygon_test(
    contour: Handle,
    point: Point2f,
    measure_dist: bool,
) -> FfiResult<f64> {
    with_contour("rxcv_contour_point_polygon_test", 0.0, contour, |c| {
        c.point_polygon_test(point, measure_dist)
    })
}

// ============================================================================
// Referenced Contours
// ============================================================================

#[no_mangle]
pub extern "C" fn rxcv_contour_ref_size(reference: ContourRef) -> FfiResult<i32> {
    with_ref("rxcv_contour_ref_size", -1, reference, |c| to_i32(c.len()))
}

#[no_mangle]
pub extern "C" fn rxcv_contour_ref_at(reference: ContourRef, index: i32) -> FfiResult<Point> {
    with_ref("rxcv_contour_ref_at", Point::default(), reference, |c| c.get(index as i64))
}

#[no_mangle]
pub extern "C" fn rxcv_contour_ref_area(reference: ContourRef) -> FfiResult<f64> {
    with_ref("rxcv_contour_ref_area", 0.0, reference, |c| Ok(c.area()))
}

#[no_mangle]
pub extern "C" fn rxcv_contour_ref_arc_length(reference: ContourRef, closed: bool) -> FfiResult<f64> {
    with_ref("rxcv_contour_ref_arc_length", 0.0, reference, |c| Ok(c.arc_length(closed)))
}

#[no_mangle]
pub extern "C" fn rxcv_contour_ref_bounding_rect(reference: ContourRef) -> FfiResult<Rect> {
    with_ref("rxcv_contour_ref_bounding_rect", Rect::default(), reference, |c| Ok(c.bounding_rect()))
}

#[no_mangle]
pub extern "C" fn rxcv_contour_ref_point_polygon_test(
    reference: ContourRef,
    point: Point2f,
    measure_dist: bool,
) -> FfiResult<f64> {
    with_ref("rxcv_contour_ref_point_polygon_test", 0.0, reference, |c| {
        c.point_polygon_test(point, measure_dist)
    })
}
