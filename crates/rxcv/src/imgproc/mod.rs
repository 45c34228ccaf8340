//! Image processing operations on [`Mat`] values.
//!
//! Functions here take matrices by reference and return new matrices; the
//! C layer decides where results are stored.

pub mod color;
pub mod contours;
pub mod filter;
pub mod geometric;
pub mod kernel;
pub mod morphology;
pub mod threshold;

pub use color::cvt_color;
pub use contours::find_contours;
pub use filter::{bilateral_filter, blur, box_filter, filter2d, gaussian_blur, median_blur};
pub use geometric::{flip, get_rect_sub_pix, invert_affine_transform, resize, rotate};
pub use morphology::{dilate, erode, get_structuring_element, morphology_ex};
pub use threshold::{adaptive_threshold, threshold};

use crate::consts::Depth;
use crate::error::{CvError, Result};
use crate::mat::{element_count, Mat};

use kernel::Plane;

fn require_nonempty(mat: &Mat, what: &str) -> Result<()> {
    if mat.is_empty() {
        return Err(CvError::invalid(format!("{} matrix is empty", what)));
    }
    Ok(())
}

/// Reject a `cols x rows` window past the element limit before any
/// weights or taps are built for it.
fn check_window(cols: usize, rows: usize) -> Result<()> {
    element_count(rows, cols, 1).map(drop)
}

fn planes(mat: &Mat) -> Vec<Plane> {
    mat.split_f64()
        .into_iter()
        .map(|data| Plane::new(mat.rows(), mat.cols(), data))
        .collect()
}

fn merge(rows: usize, cols: usize, depth: Depth, planes: Vec<Plane>) -> Result<Mat> {
    let data: Vec<Vec<f64>> = planes.into_iter().map(|p| p.data).collect();
    Mat::merge_f64(rows, cols, depth, &data)
}

/// Apply `f` to every channel of `src` and store the result as `depth`.
fn map_planes(src: &Mat, depth: Depth, f: impl Fn(&Plane) -> Plane) -> Result<Mat> {
    let out = planes(src).iter().map(f).collect();
    merge(src.rows(), src.cols(), depth, out)
}

/// Output depth code: `-1` keeps the source depth.
fn output_depth(src: &Mat, ddepth: i32) -> Result<Depth> {
    if ddepth < 0 {
        Ok(src.depth())
    } else {
        Depth::try_from(ddepth)
    }
}
