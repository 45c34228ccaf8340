use imageproc::contrast::otsu_level;

use crate::consts::{AdaptiveMethod, BorderType, Depth, ThresholdFlags, ThresholdType};
use crate::error::{CvError, Result};
use crate::mat::{Mat, MatData};

use super::kernel::{self, Plane, Window};
use super::{check_window, require_nonempty};

fn is_integer(depth: Depth) -> bool {
    !matches!(depth, Depth::F32 | Depth::F64)
}

fn apply_rule(kind: ThresholdType, value: f64, thresh: f64, maxval: f64) -> f64 {
    let above = value > thresh;
    match kind {
        ThresholdType::Binary => if above { maxval } else { 0.0 },
        ThresholdType::BinaryInv => if above { 0.0 } else { maxval },
        ThresholdType::Trunc => if above { thresh } else { value },
        ThresholdType::ToZero => if above { value } else { 0.0 },
        ThresholdType::ToZeroInv => if above { 0.0 } else { value },
    }
}

/// Fixed-level threshold applied to every channel.
///
/// Returns the output matrix and the level used, which is the Otsu level
/// when `flags` requests it.
pub fn threshold(src: &Mat, thresh: f64, maxval: f64, flags: ThresholdFlags) -> Result<(Mat, f64)> {
    require_nonempty(src, "source")?;
    let depth = src.depth();

    let thresh = if flags.otsu {
        if depth != Depth::U8 || src.channels() != 1 {
            return Err(CvError::unsupported(
                "automatic threshold needs a single-channel 8-bit matrix",
            ));
        }
        otsu_level(&src.to_gray_image()?) as f64
    } else if is_integer(depth) {
        thresh.floor()
    } else {
        thresh
    };

    let values: Vec<f64> = src
        .to_f64()
        .into_iter()
        .map(|v| apply_rule(flags.kind, v, thresh, maxval))
        .collect();
    let dst = Mat::from_f64(src.rows(), src.cols(), src.channels(), depth, &values)?;
    Ok((dst, thresh))
}

/// Threshold against a local mean computed over `block_size x block_size`.
pub fn adaptive_threshold(
    src: &Mat,
    maxval: f64,
    method: AdaptiveMethod,
    kind: ThresholdType,
    block_size: i32,
    c: f64,
) -> Result<Mat> {
    require_nonempty(src, "source")?;
    if src.depth() != Depth::U8 || src.channels() != 1 {
        return Err(CvError::unsupported(
            "adaptive threshold needs a single-channel 8-bit matrix",
        ));
    }
    if block_size < 3 || block_size % 2 == 0 {
        return Err(CvError::invalid(format!(
            "block size {} must be odd and at least 3",
            block_size
        )));
    }
    // only the binary rules are meaningful against a local level
    let (inverted, delta) = match kind {
        ThresholdType::Binary => (false, c.ceil()),
        ThresholdType::BinaryInv => (true, c.floor()),
        other => {
            return Err(CvError::unsupported(format!(
                "{:?} for adaptive threshold",
                other
            )))
        }
    };
    let maxval = MatData::from_f64(Depth::U8, &[maxval]).to_f64()[0];

    let n = block_size as usize;
    check_window(n, n)?;
    let window = Window::centered(n, n);
    let plane = Plane::new(src.rows(), src.cols(), src.to_f64());
    let mean = match method {
        AdaptiveMethod::MeanC => {
            let k = vec![1.0 / n as f64; n];
            kernel::separable(&plane, &k, &k, window, BorderType::Replicate)
        }
        AdaptiveMethod::GaussianC => {
            let k = kernel::gaussian_kernel(n, 0.0)?;
            kernel::separable(&plane, &k, &k, window, BorderType::Replicate)
        }
    };
    // the local level is itself an 8-bit image
    let mean = MatData::from_f64(Depth::U8, &mean.data).to_f64();

    let values: Vec<f64> = plane
        .data
        .iter()
        .zip(mean)
        .map(|(&v, m)| {
            let above = v - m > -delta;
            if above != inverted {
                maxval
            } else {
                0.0
            }
        })
        .collect();
    Mat::from_f64(src.rows(), src.cols(), 1, Depth::U8, &values)
}
