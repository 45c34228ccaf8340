//! Contour storage and measurements

use imageproc::geometry::arc_length;
use imageproc::point::Point as IpPoint;
use rxcv_ffi_common::Handle;

use crate::error::{CvError, Result};
use crate::types::{Point, Point2f, Rect};

/// Ordered boundary points
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contour {
    points: Vec<Point>,
}

impl Contour {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn get(&self, index: i64) -> Result<Point> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.points.get(i).copied())
            .ok_or(CvError::OutOfRange {
                index,
                len: self.points.len(),
            })
    }

    /// Signed shoelace area; positive for counter-clockwise point order in
    /// image coordinates (y pointing down).
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
            })
            .sum();
        twice as f64 / 2.0
    }

    /// Area enclosed by the polygon through the points (pixel centers).
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn arc_length(&self, closed: bool) -> f64 {
        let points: Vec<IpPoint<i32>> = self.points.iter().map(|&p| p.into()).collect();
        arc_length(&points, closed)
    }

    /// Smallest upright rectangle containing every point.
    pub fn bounding_rect(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::default();
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }

    /// Position of `pt` relative to the closed polygon.
    ///
    /// Without `measure_dist` the result is `1.0` inside, `-1.0` outside and
    /// `0.0` on an edge. With it, the signed distance to the nearest edge
    /// (positive inside).
    pub fn point_polygon_test(&self, pt: Point2f, measure_dist: bool) -> Result<f64> {
        let n = self.points.len();
        if n == 0 {
            return Err(CvError::invalid("point test on an empty contour"));
        }
        let (px, py) = (pt.x as f64, pt.y as f64);
        let mut inside = false;
        let mut min_dist = f64::INFINITY;

        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let (ax, ay, bx, by) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);

            min_dist = min_dist.min(segment_distance(px, py, ax, ay, bx, by));

            if (ay > py) != (by > py) {
                let cross_x = ax + (py - ay) * (bx - ax) / (by - ay);
                if px < cross_x {
                    inside = !inside;
                }
            }
        }

        let sign = if min_dist == 0.0 {
            0.0
        } else if inside {
            1.0
        } else {
            -1.0
        };
        Ok(if measure_dist { sign * min_dist } else { sign })
    }
}

fn segment_distance(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

impl From<Vec<Point>> for Contour {
    fn from(points: Vec<Point>) -> Self {
        Self { points }
    }
}

/// Contours found in one image, owned by position.
///
/// `revision` changes whenever the collection is refilled so that
/// outstanding [`ContourRef`]s stop resolving.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contours {
    items: Vec<Contour>,
    revision: u32,
}

impl Contours {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contour> {
        self.items.iter()
    }

    pub fn get(&self, index: i64) -> Result<&Contour> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.items.get(i))
            .ok_or(CvError::OutOfRange {
                index,
                len: self.items.len(),
            })
    }

    /// Replace the contents and invalidate earlier references.
    pub fn refill(&mut self, items: Vec<Contour>) {
        self.items = items;
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Positional reference to one contour inside a collection.
///
/// Not independently releasable; it is checked against the collection's
/// handle and revision on every use.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContourRef {
    pub contours: Handle,
    pub index: u32,
    pub revision: u32,
}

impl ContourRef {
    /// Resolve against a snapshot of the collection `self.contours` refers to.
    pub fn resolve<'a>(&self, contours: &'a Contours) -> Result<&'a Contour> {
        if contours.revision() != self.revision {
            return Err(CvError::invalid(format!(
                "contour reference {} is stale: collection was refilled",
                self.index
            )));
        }
        contours.get(self.index as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: i32) -> Contour {
        Contour::from(vec![
            Point::new(0, 0),
            Point::new(0, side),
            Point::new(side, side),
            Point::new(side, 0),
        ])
    }

    #[test]
    fn test_area_and_length() {
        let c = square(4);
        assert_eq!(c.area(), 16.0);
        assert_eq!(c.arc_length(true), 16.0);
        assert_eq!(c.arc_length(false), 12.0);
    }

    #[test]
    fn test_degenerate_area() {
        let c = Contour::from(vec![Point::new(0, 0), Point::new(3, 0)]);
        assert_eq!(c.area(), 0.0);
    }

    #[test]
    fn test_bounding_rect() {
        let c = Contour::from(vec![Point::new(2, 3), Point::new(5, 1), Point::new(4, 6)]);
        assert_eq!(c.bounding_rect(), Rect::new(2, 1, 4, 6));
        assert_eq!(Contour::new().bounding_rect(), Rect::default());
    }

    #[test]
    fn test_point_polygon_test() {
        let c = square(4);
        assert_eq!(c.point_polygon_test(Point2f::new(2.0, 2.0), false).unwrap(), 1.0);
        assert_eq!(c.point_polygon_test(Point2f::new(6.0, 2.0), false).unwrap(), -1.0);
        assert_eq!(c.point_polygon_test(Point2f::new(0.0, 2.0), false).unwrap(), 0.0);
        assert_eq!(c.point_polygon_test(Point2f::new(1.0, 2.0), true).unwrap(), 1.0);
        assert_eq!(c.point_polygon_test(Point2f::new(7.0, 2.0), true).unwrap(), -3.0);
        assert!(Contour::new().point_polygon_test(Point2f::default(), false).is_err());
    }

    #[test]
    fn test_indexed_access() {
        let c = square(1);
        assert_eq!(c.get(2).unwrap(), Point::new(1, 1));
        assert!(matches!(c.get(4), Err(CvError::OutOfRange { index: 4, len: 4 })));
        assert!(c.get(-1).is_err());
    }

    #[test]
    fn test_refill_invalidates_refs() {
        let mut contours = Contours::new();
        contours.refill(vec![square(2)]);
        let r = ContourRef {
            contours: Handle::NULL,
            index: 0,
            revision: contours.revision(),
        };
        assert_eq!(r.resolve(&contours).unwrap().len(), 4);

        contours.refill(vec![square(3)]);
        assert!(r.resolve(&contours).is_err());
    }
}
