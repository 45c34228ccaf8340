//! Flat geometry values passed by value across the boundary
//!
//! Every type here is `#[repr(C)]`, `Copy`, and converted into the
//! representation the processing code wants at the start of a call.

use imageproc::point::Point as IpPoint;

use crate::error::{CvError, Result};

/// Integer 2D point
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Floating-point 2D point
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2f {
    pub x: f32,
    pub y: f32,
}

/// Integer size. `width` counts columns, `height` counts rows.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

/// Axis-aligned integer rectangle
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Resolve a kernel anchor: `(-1, -1)` is the kernel center, anything
    /// else must lie inside a `cols` x `rows` kernel.
    pub fn resolve_anchor(self, cols: usize, rows: usize) -> Result<(usize, usize)> {
        if self.x == -1 && self.y == -1 {
            return Ok((cols / 2, rows / 2));
        }
        let ax = usize::try_from(self.x).ok().filter(|&x| x < cols);
        let ay = usize::try_from(self.y).ok().filter(|&y| y < rows);
        match (ax, ay) {
            (Some(ax), Some(ay)) => Ok((ax, ay)),
            _ => Err(CvError::invalid(format!(
                "anchor ({}, {}) outside {}x{} kernel",
                self.x, self.y, cols, rows
            ))),
        }
    }
}

impl Point2f {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// `(cols, rows)` of this size. Negative components are rejected.
    pub fn dims(self) -> Result<(usize, usize)> {
        match (usize::try_from(self.width), usize::try_from(self.height)) {
            (Ok(cols), Ok(rows)) => Ok((cols, rows)),
            _ => Err(CvError::invalid(format!(
                "size {}x{} has a negative component",
                self.width, self.height
            ))),
        }
    }

    /// Like [`Size::dims`] but both components must be positive.
    pub fn positive_dims(self) -> Result<(usize, usize)> {
        match self.dims()? {
            (0, _) | (_, 0) => Err(CvError::invalid(format!(
                "size {}x{} must be positive",
                self.width, self.height
            ))),
            dims => Ok(dims),
        }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<Point> for IpPoint<i32> {
    fn from(p: Point) -> Self {
        IpPoint::new(p.x, p.y)
    }
}

impl From<IpPoint<i32>> for Point {
    fn from(p: IpPoint<i32>) -> Self {
        Point::new(p.x, p.y)
    }
}

impl From<Point2f> for IpPoint<f32> {
    fn from(p: Point2f) -> Self {
        IpPoint::new(p.x, p.y)
    }
}

impl From<IpPoint<f32>> for Point2f {
    fn from(p: IpPoint<f32>) -> Self {
        Point2f::new(p.x, p.y)
    }
}
