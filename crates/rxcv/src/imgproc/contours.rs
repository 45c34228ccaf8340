use imageproc::contours::{self as ip, BorderType as IpBorder};

use crate::consts::{ContourApprox, Depth, RetrievalMode};
use crate::contours::Contour;
use crate::error::{CvError, Result};
use crate::mat::Mat;
use crate::types::Point;

/// Keep only the points where the chain changes direction.
fn compress_runs(points: Vec<Point>) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points;
    }
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            (cur.x - prev.x, cur.y - prev.y) != (next.x - cur.x, next.y - cur.y)
        })
        .map(|i| points[i])
        .collect()
}

/// Trace region borders of a single-channel 8-bit image; any non-zero
/// pixel is foreground.
pub fn find_contours(src: &Mat, mode: RetrievalMode, method: ContourApprox) -> Result<Vec<Contour>> {
    if src.depth() != Depth::U8 || src.channels() != 1 {
        return Err(CvError::unsupported(
            "contour tracing needs a single-channel 8-bit matrix",
        ));
    }
    if src.is_empty() {
        return Ok(Vec::new());
    }

    let traced = ip::find_contours::<i32>(&src.to_gray_image()?);
    let contours = traced
        .into_iter()
        .filter(|c| match mode {
            RetrievalMode::External => matches!(c.border_type, IpBorder::Outer) && c.parent.is_none(),
            RetrievalMode::List | RetrievalMode::CComp | RetrievalMode::Tree => true,
        })
        .map(|c| {
            let points: Vec<Point> = c.points.into_iter().map(Point::from).collect();
            let points = match method {
                ContourApprox::None => points,
                ContourApprox::Simple => compress_runs(points),
            };
            Contour::from(points)
        })
        .collect();
    Ok(contours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// `rows x cols` image with a filled white rectangle
    fn rect_image(rows: usize, cols: usize, x: usize, y: usize, w: usize, h: usize) -> Mat {
        let mut values = vec![0.0; rows * cols];
        for r in y..y + h {
            for c in x..x + w {
                values[r * cols + c] = 255.0;
            }
        }
        Mat::from_f64(rows, cols, 1, Depth::U8, &values).unwrap()
    }

    #[test]
    fn test_single_rectangle_full_chain() {
        let src = rect_image(6, 7, 1, 1, 5, 4);
        let contours = find_contours(&src, RetrievalMode::External, ContourApprox::None).unwrap();
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert_eq!(c.len(), 14);
        assert_eq!(c.area(), 12.0);
        assert_eq!(c.arc_length(true), 14.0);
        assert_eq!(c.arc_length(false), 13.0);
    }

    #[test]
    fn test_simple_keeps_corners() {
        let src = rect_image(6, 7, 1, 1, 5, 4);
        let contours = find_contours(&src, RetrievalMode::List, ContourApprox::Simple).unwrap();
        assert_eq!(contours.len(), 1);
        let mut corners = contours[0].points().to_vec();
        corners.sort_by_key(|p| (p.y, p.x));
        assert_eq!(
            corners,
            vec![Point::new(1, 1), Point::new(5, 1), Point::new(1, 4), Point::new(5, 4)]
        );
        assert_eq!(contours[0].area(), 12.0);
    }

    #[test]
    fn test_external_drops_holes() {
        let mut values = rect_image(7, 7, 1, 1, 5, 5).to_f64();
        values[3 * 7 + 3] = 0.0;
        let src = Mat::from_f64(7, 7, 1, Depth::U8, &values).unwrap();
        let all = find_contours(&src, RetrievalMode::List, ContourApprox::None).unwrap();
        let outer = find_contours(&src, RetrievalMode::External, ContourApprox::None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(outer.len(), 1);
    }

    #[test]
    fn test_requires_gray_u8() {
        let src = Mat::from_f64(1, 1, 3, Depth::U8, &[0.0; 3]).unwrap();
        assert!(find_contours(&src, RetrievalMode::List, ContourApprox::None).is_err());
        let empty = Mat::empty();
        assert!(find_contours(&empty, RetrievalMode::List, ContourApprox::None).unwrap().is_empty());
    }
}
