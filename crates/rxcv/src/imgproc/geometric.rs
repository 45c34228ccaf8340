//! Geometric transforms
//!
//! Resampling maps destination pixel centers onto the source with
//! `src = (dst + 0.5) * scale - 0.5`. Taps falling outside the source are
//! clamped to the edge.

use std::f64::consts::PI;

use crate::consts::{Depth, FlipCode, Interpolation, RotateCode};
use crate::error::{CvError, Result};
use crate::mat::{element_count, Mat};
use crate::types::{Point2f, Size};

use super::kernel::Plane;
use super::{output_depth, require_nonempty};

/// Source indices and weights contributing to one output coordinate
type Taps = Vec<(usize, f64)>;

fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

fn cubic_weights(t: f64) -> [f64; 4] {
    const A: f64 = -0.75;
    let w0 = ((A * (t + 1.0) - 5.0 * A) * (t + 1.0) + 8.0 * A) * (t + 1.0) - 4.0 * A;
    let w1 = ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0;
    let w2 = ((A + 2.0) * (1.0 - t) - (A + 3.0)) * (1.0 - t) * (1.0 - t) + 1.0;
    [w0, w1, w2, 1.0 - w0 - w1 - w2]
}

fn lanczos4_weights(t: f64) -> [f64; 8] {
    let mut w = [0.0; 8];
    if t.abs() < f64::EPSILON {
        w[3] = 1.0;
        return w;
    }
    for (i, wi) in w.iter_mut().enumerate() {
        let x = (t + 3.0 - i as f64) * PI;
        *wi = (x / 4.0).sin() * x.sin() / (x * x / 4.0);
    }
    let sum: f64 = w.iter().sum();
    w.iter_mut().for_each(|wi| *wi /= sum);
    w
}

/// Per-axis taps mapping `dst_len` outputs onto `src_len` inputs.
fn axis_taps(src_len: usize, dst_len: usize, scale: f64, interpolation: Interpolation) -> Vec<Taps> {
    (0..dst_len)
        .map(|d| {
            let center = (d as f64 + 0.5) * scale - 0.5;
            match interpolation {
                Interpolation::Nearest => {
                    let s = (d as f64 * scale).floor() as isize;
                    vec![(clamp_index(s, src_len), 1.0)]
                }
                Interpolation::NearestExact => {
                    let s = ((d as f64 + 0.5) * scale).floor() as isize;
                    vec![(clamp_index(s, src_len), 1.0)]
                }
                Interpolation::Linear | Interpolation::LinearExact => {
                    let s = center.floor();
                    let t = center - s;
                    let s = s as isize;
                    if s < 0 {
                        vec![(0, 1.0)]
                    } else if s as usize >= src_len - 1 {
                        vec![(src_len - 1, 1.0)]
                    } else {
                        vec![(s as usize, 1.0 - t), (s as usize + 1, t)]
                    }
                }
                Interpolation::Cubic => {
                    let s = center.floor();
                    let w = cubic_weights(center - s);
                    (0..4)
                        .map(|k| (clamp_index(s as isize - 1 + k as isize, src_len), w[k]))
                        .collect()
                }
                Interpolation::Lanczos4 => {
                    let s = center.floor();
                    let w = lanczos4_weights(center - s);
                    (0..8)
                        .map(|k| (clamp_index(s as isize - 3 + k as isize, src_len), w[k]))
                        .collect()
                }
                Interpolation::Area => area_taps(d, src_len, scale),
            }
        })
        .collect()
}

// coverage of [d * scale, (d + 1) * scale) by each source pixel
fn area_taps(d: usize, src_len: usize, scale: f64) -> Taps {
    let start = d as f64 * scale;
    let end = ((d + 1) as f64 * scale).min(src_len as f64);
    let mut taps = Vec::new();
    let mut s = start.floor() as usize;
    while (s as f64) < end && s < src_len {
        let lo = start.max(s as f64);
        let hi = end.min(s as f64 + 1.0);
        if hi > lo {
            taps.push((s, (hi - lo) / scale));
        }
        s += 1;
    }
    taps
}

fn resample(src: &Plane, x_taps: &[Taps], y_taps: &[Taps]) -> Plane {
    let mut out = Vec::with_capacity(x_taps.len() * y_taps.len());
    for ys in y_taps {
        for xs in x_taps {
            let value: f64 = ys
                .iter()
                .flat_map(|&(sy, wy)| xs.iter().map(move |&(sx, wx)| wy * wx * src.get(sy, sx)))
                .sum();
            out.push(value);
        }
    }
    Plane::new(y_taps.len(), x_taps.len(), out)
}

/// Resize to `dsize`, or by `fx`/`fy` when `dsize` is empty.
pub fn resize(src: &Mat, dsize: Size, fx: f64, fy: f64, interpolation: Interpolation) -> Result<Mat> {
    require_nonempty(src, "source")?;
    let (cols, rows) = if dsize.is_empty() {
        if fx <= 0.0 || fy <= 0.0 {
            return Err(CvError::invalid(
                "resize needs a destination size or positive scale factors",
            ));
        }
        (
            (src.cols() as f64 * fx).round() as usize,
            (src.rows() as f64 * fy).round() as usize,
        )
    } else {
        dsize.positive_dims()?
    };
    if cols == 0 || rows == 0 {
        return Err(CvError::invalid("resize produced an empty destination"));
    }
    element_count(rows, cols, src.channels())?;

    let scale_x = src.cols() as f64 / cols as f64;
    let scale_y = src.rows() as f64 / rows as f64;
    // area averaging only applies when shrinking
    let (ix, iy) = match interpolation {
        Interpolation::Area if scale_x < 1.0 || scale_y < 1.0 => {
            (Interpolation::Linear, Interpolation::Linear)
        }
        other => (other, other),
    };
    let x_taps = axis_taps(src.cols(), cols, scale_x, ix);
    let y_taps = axis_taps(src.rows(), rows, scale_y, iy);

    let planes: Vec<Vec<f64>> = src
        .split_f64()
        .into_iter()
        .map(|data| resample(&Plane::new(src.rows(), src.cols(), data), &x_taps, &y_taps).data)
        .collect();
    Mat::merge_f64(rows, cols, src.depth(), &planes)
}

pub fn flip(src: &Mat, code: FlipCode) -> Result<Mat> {
    let (rows, cols) = (src.rows(), src.cols());
    src.remap_pixels(rows, cols, |r, c| match code {
        FlipCode::Vertical => (rows - 1 - r, c),
        FlipCode::Horizontal => (r, cols - 1 - c),
        FlipCode::Both => (rows - 1 - r, cols - 1 - c),
    })
}

pub fn rotate(src: &Mat, code: RotateCode) -> Result<Mat> {
    let (rows, cols) = (src.rows(), src.cols());
    match code {
        RotateCode::Clockwise90 => src.remap_pixels(cols, rows, |r, c| (rows - 1 - c, r)),
        RotateCode::Rotate180 => src.remap_pixels(rows, cols, |r, c| (rows - 1 - r, cols - 1 - c)),
        RotateCode::CounterClockwise90 => src.remap_pixels(cols, rows, |r, c| (c, cols - 1 - r)),
    }
}

/// Extract a `patch_size` window centered on `center` with bilinear
/// sampling. Pixels outside the source replicate the edge.
///
/// `patch_type` is `-1` for the source depth or a depth code.
pub fn get_rect_sub_pix(src: &Mat, patch_size: Size, center: Point2f, patch_type: i32) -> Result<Mat> {
    require_nonempty(src, "source")?;
    let (cols, rows) = patch_size.positive_dims()?;
    element_count(rows, cols, src.channels())?;
    let depth = output_depth(src, patch_type)?;
    let x0 = center.x as f64 - (cols as f64 - 1.0) * 0.5;
    let y0 = center.y as f64 - (rows as f64 - 1.0) * 0.5;

    let sample = |p: &Plane, y: f64, x: f64| {
        let (fy, fx) = (y.floor(), x.floor());
        let (ty, tx) = (y - fy, x - fx);
        let at = |yy: f64, xx: f64| {
            p.get(
                clamp_index(yy as isize, p.rows),
                clamp_index(xx as isize, p.cols),
            )
        };
        (1.0 - ty) * ((1.0 - tx) * at(fy, fx) + tx * at(fy, fx + 1.0))
            + ty * ((1.0 - tx) * at(fy + 1.0, fx) + tx * at(fy + 1.0, fx + 1.0))
    };

    let planes: Vec<Vec<f64>> = src
        .split_f64()
        .into_iter()
        .map(|data| {
            let p = Plane::new(src.rows(), src.cols(), data);
            (0..rows)
                .flat_map(|r| (0..cols).map(move |c| (r, c)))
                .map(|(r, c)| sample(&p, y0 + r as f64, x0 + c as f64))
                .collect()
        })
        .collect();
    Mat::merge_f64(rows, cols, depth, &planes)
}

/// Invert a 2x3 affine matrix. A singular matrix yields zeros.
pub fn invert_affine_transform(m: &Mat) -> Result<Mat> {
    if m.rows() != 2 || m.cols() != 3 || m.channels() != 1 {
        return Err(CvError::invalid(format!(
            "affine transform must be 2x3 single-channel, got {}x{}x{}",
            m.rows(),
            m.cols(),
            m.channels()
        )));
    }
    if !matches!(m.depth(), Depth::F32 | Depth::F64) {
        return Err(CvError::unsupported("affine transform must be floating point"));
    }
    let v = m.to_f64();
    let (a, b, c, d, e, f) = (v[0], v[1], v[2], v[3], v[4], v[5]);
    let det = a * e - b * d;
    let det = if det != 0.0 { 1.0 / det } else { 0.0 };
    let (a11, a22) = (e * det, a * det);
    let (a12, a21) = (-b * det, -d * det);
    let b1 = -a11 * c - a12 * f;
    let b2 = -a21 * c - a22 * f;
    Mat::from_f64(2, 3, 1, m.depth(), &[a11, a12, b1, a21, a22, b2])
}
