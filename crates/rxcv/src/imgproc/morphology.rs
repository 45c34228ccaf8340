//! Min/max morphology
//!
//! Kernels are single-channel matrices; every non-zero element is part of
//! the structuring element. A constant border never wins the min/max.

use crate::consts::{BorderType, Depth, MorphShape, MorphType};
use crate::error::{CvError, Result};
use crate::mat::Mat;
use crate::types::{Point, Size};

use super::kernel::{self, Extremum, Window};
use super::{check_window, map_planes, require_nonempty};

/// Build a 0/1 structuring element of `ksize` (width = columns).
pub fn get_structuring_element(shape: MorphShape, ksize: Size, anchor: Point) -> Result<Mat> {
    let (cols, rows) = ksize.positive_dims()?;
    check_window(cols, rows)?;
    let (ax, ay) = anchor.resolve_anchor(cols, rows)?;
    let mut values = vec![0.0; rows * cols];

    match shape {
        MorphShape::Rect => values.fill(1.0),
        MorphShape::Cross => {
            for (i, v) in values.iter_mut().enumerate() {
                if i / cols == ay || i % cols == ax {
                    *v = 1.0;
                }
            }
        }
        MorphShape::Ellipse => {
            let r = (rows / 2) as isize;
            let c = (cols / 2) as isize;
            let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };
            for i in 0..rows {
                let dy = i as isize - r;
                if dy.abs() > r {
                    continue;
                }
                let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as isize;
                let j1 = (c - dx).max(0) as usize;
                let j2 = ((c + dx + 1) as usize).min(cols);
                values[i * cols + j1..i * cols + j2].fill(1.0);
            }
        }
    }

    Mat::from_f64(rows, cols, 1, Depth::U8, &values)
}

struct Element {
    mask: Vec<bool>,
    window: Window,
}

impl Element {
    /// An empty kernel means a 3x3 rectangle.
    fn from_kernel(kernel: &Mat, anchor: Point) -> Result<Self> {
        if kernel.is_empty() {
            let window = Window::centered(3, 3);
            let (ax, ay) = anchor.resolve_anchor(3, 3)?;
            return Ok(Self {
                mask: vec![true; 9],
                window: Window {
                    anchor_x: ax,
                    anchor_y: ay,
                    ..window
                },
            });
        }
        if kernel.channels() != 1 {
            return Err(CvError::invalid("structuring element must have a single channel"));
        }
        let (ax, ay) = anchor.resolve_anchor(kernel.cols(), kernel.rows())?;
        Ok(Self {
            mask: kernel.to_f64().into_iter().map(|v| v != 0.0).collect(),
            window: Window {
                cols: kernel.cols(),
                rows: kernel.rows(),
                anchor_x: ax,
                anchor_y: ay,
            },
        })
    }
}

fn iterate(
    src: &Mat,
    element: &Element,
    iterations: i32,
    extremum: Extremum,
    border: BorderType,
) -> Result<Mat> {
    require_nonempty(src, "source")?;
    if iterations < 0 {
        return Err(CvError::invalid(format!("negative iteration count {}", iterations)));
    }
    let mut current = src.clone();
    for _ in 0..iterations {
        current = map_planes(&current, src.depth(), |p| {
            kernel::morph(p, &element.mask, element.window, extremum, border)
        })?;
    }
    Ok(current)
}

pub fn erode(src: &Mat, kernel: &Mat, anchor: Point, iterations: i32, border: BorderType) -> Result<Mat> {
    let element = Element::from_kernel(kernel, anchor)?;
    iterate(src, &element, iterations, Extremum::Min, border)
}

pub fn dilate(src: &Mat, kernel: &Mat, anchor: Point, iterations: i32, border: BorderType) -> Result<Mat> {
    let element = Element::from_kernel(kernel, anchor)?;
    iterate(src, &element, iterations, Extremum::Max, border)
}

fn subtract(a: &Mat, b: &Mat) -> Result<Mat> {
    let values: Vec<f64> = a.to_f64().iter().zip(b.to_f64()).map(|(x, y)| x - y).collect();
    Mat::from_f64(a.rows(), a.cols(), a.channels(), a.depth(), &values)
}

/// Compound operations built from erosion and dilation.
pub fn morphology_ex(
    src: &Mat,
    op: MorphType,
    kernel: &Mat,
    anchor: Point,
    iterations: i32,
    border: BorderType,
) -> Result<Mat> {
    let element = Element::from_kernel(kernel, anchor)?;
    let erode = |m: &Mat| iterate(m, &element, iterations, Extremum::Min, border);
    let dilate = |m: &Mat| iterate(m, &element, iterations, Extremum::Max, border);

    match op {
        MorphType::Erode => erode(src),
        MorphType::Dilate => dilate(src),
        MorphType::Open => dilate(&erode(src)?),
        MorphType::Close => erode(&dilate(src)?),
        MorphType::Gradient => subtract(&dilate(src)?, &erode(src)?),
        MorphType::TopHat => subtract(src, &dilate(&erode(src)?)?),
        MorphType::BlackHat => subtract(&erode(&dilate(src)?)?, src),
    }
}
