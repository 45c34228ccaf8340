//! Neighborhood computations on single-channel `f64` planes.
//!
//! Out-of-image reads go through [`border_index`], which reproduces the
//! native library's pixel extrapolation for each [`BorderType`].

use crate::consts::BorderType;
use crate::error::{CvError, Result};

/// One channel of an image, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Plane {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { rows, cols, data }
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    /// Value at a possibly out-of-image position. Constant borders read 0.
    pub fn at(&self, r: isize, c: isize, border: BorderType) -> f64 {
        match (
            border_index(r, self.rows, border),
            border_index(c, self.cols, border),
        ) {
            (Some(r), Some(c)) => self.get(r, c),
            _ => 0.0,
        }
    }
}

/// Map coordinate `p` onto `0..len`, or `None` for a constant border.
pub fn border_index(p: isize, len: usize, border: BorderType) -> Option<usize> {
    let n = len as isize;
    if (0..n).contains(&p) {
        return Some(p as usize);
    }
    if n == 0 {
        return None;
    }
    let mapped = match border {
        BorderType::Constant => return None,
        BorderType::Replicate => p.clamp(0, n - 1),
        BorderType::Wrap => p.rem_euclid(n),
        BorderType::Reflect | BorderType::Reflect101 if n == 1 => 0,
        BorderType::Reflect => reflect(p, n, 0),
        BorderType::Reflect101 => reflect(p, n, 1),
    };
    Some(mapped as usize)
}

// `delta` is 0 for fedcba|abcdef and 1 for gfedcb|abcdefg
fn reflect(mut p: isize, n: isize, delta: isize) -> isize {
    while !(0..n).contains(&p) {
        if p < 0 {
            p = -p - 1 + delta;
        } else {
            p = n - 1 - (p - n) - delta;
        }
    }
    p
}

/// Kernel geometry shared by the neighborhood operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub cols: usize,
    pub rows: usize,
    pub anchor_x: usize,
    pub anchor_y: usize,
}

impl Window {
    pub fn centered(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            anchor_x: cols / 2,
            anchor_y: rows / 2,
        }
    }

    fn offsets(&self, i: usize, j: usize) -> (isize, isize) {
        (
            i as isize - self.anchor_y as isize,
            j as isize - self.anchor_x as isize,
        )
    }
}

/// 2D correlation: `out(r, c) = sum k(i, j) * src(r + i - ay, c + j - ax) + delta`.
pub fn correlate(
    src: &Plane,
    kernel: &[f64],
    window: Window,
    delta: f64,
    border: BorderType,
) -> Plane {
    let taps: Vec<(isize, isize, f64)> = (0..window.rows)
        .flat_map(|i| (0..window.cols).map(move |j| (i, j)))
        .filter_map(|(i, j)| {
            let k = kernel[i * window.cols + j];
            (k != 0.0).then(|| {
                let (dy, dx) = window.offsets(i, j);
                (dy, dx, k)
            })
        })
        .collect();

    let mut out = Vec::with_capacity(src.rows * src.cols);
    for r in 0..src.rows as isize {
        for c in 0..src.cols as isize {
            let sum: f64 = taps
                .iter()
                .map(|&(dy, dx, k)| k * src.at(r + dy, c + dx, border))
                .sum();
            out.push(sum + delta);
        }
    }
    Plane::new(src.rows, src.cols, out)
}

/// Row kernel `kx` then column kernel `ky`.
pub fn separable(
    src: &Plane,
    kx: &[f64],
    ky: &[f64],
    window: Window,
    border: BorderType,
) -> Plane {
    let (rows, cols) = (src.rows, src.cols);
    let mut horizontal = Vec::with_capacity(rows * cols);
    for r in 0..rows as isize {
        for c in 0..cols as isize {
            let sum: f64 = kx
                .iter()
                .enumerate()
                .map(|(j, k)| k * src.at(r, c + j as isize - window.anchor_x as isize, border))
                .sum();
            horizontal.push(sum);
        }
    }
    let horizontal = Plane::new(rows, cols, horizontal);

    let mut out = Vec::with_capacity(rows * cols);
    for r in 0..rows as isize {
        for c in 0..cols as isize {
            let sum: f64 = ky
                .iter()
                .enumerate()
                .map(|(i, k)| k * horizontal.at(r + i as isize - window.anchor_y as isize, c, border))
                .sum();
            out.push(sum);
        }
    }
    Plane::new(rows, cols, out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

/// Minimum or maximum over the non-zero entries of `mask`.
///
/// A constant border contributes nothing, so pixels near the edge only see
/// the in-image part of the window.
pub fn morph(
    src: &Plane,
    mask: &[bool],
    window: Window,
    extremum: Extremum,
    border: BorderType,
) -> Plane {
    let offsets: Vec<(isize, isize)> = (0..window.rows)
        .flat_map(|i| (0..window.cols).map(move |j| (i, j)))
        .filter(|&(i, j)| mask[i * window.cols + j])
        .map(|(i, j)| window.offsets(i, j))
        .collect();

    let mut out = Vec::with_capacity(src.rows * src.cols);
    for r in 0..src.rows as isize {
        for c in 0..src.cols as isize {
            let values = offsets.iter().filter_map(|&(dy, dx)| {
                let y = border_index(r + dy, src.rows, border)?;
                let x = border_index(c + dx, src.cols, border)?;
                Some(src.get(y, x))
            });
            let value = match extremum {
                Extremum::Min => values.fold(f64::INFINITY, f64::min),
                Extremum::Max => values.fold(f64::NEG_INFINITY, f64::max),
            };
            // empty window: keep the source pixel
            out.push(if value.is_finite() { value } else { src.get(r as usize, c as usize) });
        }
    }
    Plane::new(src.rows, src.cols, out)
}

/// Normalized 1D Gaussian of odd length `n`.
///
/// A non-positive `sigma` is derived from `n`; small kernels then use the
/// fixed binomial tables.
pub fn gaussian_kernel(n: usize, sigma: f64) -> Result<Vec<f64>> {
    if n == 0 || n % 2 == 0 {
        return Err(CvError::invalid(format!(
            "gaussian kernel size {} must be odd and positive",
            n
        )));
    }
    if sigma <= 0.0 {
        let fixed: &[f64] = match n {
            1 => &[1.0],
            3 => &[0.25, 0.5, 0.25],
            5 => &[0.0625, 0.25, 0.375, 0.25, 0.0625],
            7 => &[
                0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
            ],
            _ => &[],
        };
        if !fixed.is_empty() {
            return Ok(fixed.to_vec());
        }
    }
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        ((n as f64 - 1.0) * 0.5 - 1.0) * 0.3 + 0.8
    };
    let center = (n as f64 - 1.0) / 2.0;
    let scale = -0.5 / (sigma * sigma);
    let raw: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - center;
            (scale * x * x).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    Ok(raw.into_iter().map(|v| v / sum).collect())
}
