//! Linear and non-linear smoothing filters

use image::GrayImage;
use imageproc::filter::median_filter;

use crate::consts::{BorderType, Depth};
use crate::error::{CvError, Result};
use crate::mat::Mat;
use crate::types::{Point, Size};

use super::kernel::{self, Plane, Window};
use super::{check_window, map_planes, output_depth, require_nonempty};

/// Correlate every channel with `kernel` (not flipped) and add `delta`.
pub fn filter2d(
    src: &Mat,
    ddepth: i32,
    kernel: &Mat,
    anchor: Point,
    delta: f64,
    border: BorderType,
) -> Result<Mat> {
    require_nonempty(src, "source")?;
    require_nonempty(kernel, "kernel")?;
    if kernel.channels() != 1 {
        return Err(CvError::invalid("kernel must have a single channel"));
    }
    let depth = output_depth(src, ddepth)?;
    let (ax, ay) = anchor.resolve_anchor(kernel.cols(), kernel.rows())?;
    let window = Window {
        cols: kernel.cols(),
        rows: kernel.rows(),
        anchor_x: ax,
        anchor_y: ay,
    };
    let weights = kernel.to_f64();
    map_planes(src, depth, |p| kernel::correlate(p, &weights, window, delta, border))
}

/// Sum (or mean, when `normalize`) over a `ksize` window.
pub fn box_filter(
    src: &Mat,
    ddepth: i32,
    ksize: Size,
    anchor: Point,
    normalize: bool,
    border: BorderType,
) -> Result<Mat> {
    require_nonempty(src, "source")?;
    let depth = output_depth(src, ddepth)?;
    let (cols, rows) = ksize.positive_dims()?;
    check_window(cols, rows)?;
    let (ax, ay) = anchor.resolve_anchor(cols, rows)?;
    let window = Window {
        cols,
        rows,
        anchor_x: ax,
        anchor_y: ay,
    };
    let (kx, ky) = if normalize {
        (vec![1.0 / cols as f64; cols], vec![1.0 / rows as f64; rows])
    } else {
        (vec![1.0; cols], vec![1.0; rows])
    };
    map_planes(src, depth, |p| kernel::separable(p, &kx, &ky, window, border))
}

/// Normalized box filter keeping the source depth.
pub fn blur(src: &Mat, ksize: Size, anchor: Point, border: BorderType) -> Result<Mat> {
    box_filter(src, -1, ksize, anchor, true, border)
}

fn gaussian_size(sigma: f64, depth: Depth) -> usize {
    let spread = if depth == Depth::U8 { 3.0 } else { 4.0 };
    ((sigma * spread * 2.0 + 1.0).round() as usize) | 1
}

/// Gaussian smoothing. A zero `ksize` component is derived from the sigma
/// on that axis; a zero `sigma_y` copies `sigma_x`.
pub fn gaussian_blur(
    src: &Mat,
    ksize: Size,
    sigma_x: f64,
    sigma_y: f64,
    border: BorderType,
) -> Result<Mat> {
    require_nonempty(src, "source")?;
    let sigma_y = if sigma_y <= 0.0 { sigma_x } else { sigma_y };
    let (mut cols, mut rows) = ksize.dims()?;
    if cols == 0 && sigma_x > 0.0 {
        cols = gaussian_size(sigma_x, src.depth());
    }
    if rows == 0 && sigma_y > 0.0 {
        rows = gaussian_size(sigma_y, src.depth());
    }
    if cols == 0 || rows == 0 {
        return Err(CvError::invalid(
            "gaussian kernel size and sigma cannot both be zero",
        ));
    }
    check_window(cols, rows)?;
    let kx = kernel::gaussian_kernel(cols, sigma_x)?;
    let ky = kernel::gaussian_kernel(rows, sigma_y)?;
    let window = Window::centered(cols, rows);
    map_planes(src, src.depth(), |p| kernel::separable(p, &kx, &ky, window, border))
}

fn median_of(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    values[values.len() / 2]
}

/// Median over a `ksize x ksize` window with replicated borders.
pub fn median_blur(src: &Mat, ksize: i32) -> Result<Mat> {
    require_nonempty(src, "source")?;
    if ksize < 3 || ksize % 2 == 0 {
        return Err(CvError::invalid(format!(
            "median kernel size {} must be odd and at least 3",
            ksize
        )));
    }
    let side = ksize as usize;
    check_window(side, side)?;
    let radius = (ksize / 2) as u32;

    if src.depth() == Depth::U8 {
        let planes: Vec<GrayImage> = src
            .split_u8()?
            .iter()
            .map(|plane| median_filter(plane, radius, radius))
            .collect();
        return Mat::merge_u8(&planes);
    }

    let r = radius as isize;
    map_planes(src, src.depth(), |p| {
        let mut window = Vec::with_capacity(side * side);
        let mut out = Vec::with_capacity(p.data.len());
        for y in 0..p.rows as isize {
            for x in 0..p.cols as isize {
                window.clear();
                for dy in -r..=r {
                    for dx in -r..=r {
                        window.push(p.at(y + dy, x + dx, BorderType::Replicate));
                    }
                }
                out.push(median_of(&mut window));
            }
        }
        Plane::new(p.rows, p.cols, out)
    })
}

/// Edge-preserving smoothing over a disc of diameter `d`.
///
/// A non-positive `d` is derived from `sigma_space`. Color distance between
/// pixels is the sum of absolute channel differences.
pub fn bilateral_filter(
    src: &Mat,
    d: i32,
    sigma_color: f64,
    sigma_space: f64,
    border: BorderType,
) -> Result<Mat> {
    require_nonempty(src, "source")?;
    let cn = src.channels();
    if cn != 1 && cn != 3 {
        return Err(CvError::unsupported(format!(
            "bilateral filter on {} channels",
            cn
        )));
    }
    let sigma_color = if sigma_color <= 0.0 { 1.0 } else { sigma_color };
    let sigma_space = if sigma_space <= 0.0 { 1.0 } else { sigma_space };
    // d <= 0 takes the radius (not the diameter) from round(1.5 * sigma_space)
    let radius = if d <= 0 {
        (sigma_space * 1.5).round() as usize
    } else {
        (d / 2) as usize
    }
    .max(1);
    let side = radius
        .checked_mul(2)
        .and_then(|n| n.checked_add(1))
        .ok_or_else(|| CvError::Limit(format!("bilateral radius {} overflows", radius)))?;
    check_window(side, side)?;
    let radius = radius as isize;
    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    let taps: Vec<(isize, isize, f64)> = (-radius..=radius)
        .flat_map(|dy| (-radius..=radius).map(move |dx| (dy, dx)))
        .filter_map(|(dy, dx)| {
            let r2 = (dy * dy + dx * dx) as f64;
            (r2.sqrt() <= radius as f64).then(|| (dy, dx, (r2 * space_coeff).exp()))
        })
        .collect();

    let planes: Vec<Plane> = src
        .split_f64()
        .into_iter()
        .map(|data| Plane::new(src.rows(), src.cols(), data))
        .collect();
    let (rows, cols) = (src.rows(), src.cols());
    let mut out = vec![Vec::with_capacity(rows * cols); cn];

    for y in 0..rows {
        for x in 0..cols {
            let center: Vec<f64> = planes.iter().map(|p| p.get(y, x)).collect();
            let mut sums = vec![0.0; cn];
            let mut total = 0.0;
            for &(dy, dx, space_w) in &taps {
                let (yy, xx) = (y as isize + dy, x as isize + dx);
                let neighbor: Vec<f64> = planes.iter().map(|p| p.at(yy, xx, border)).collect();
                let dist: f64 = neighbor
                    .iter()
                    .zip(&center)
                    .map(|(a, b)| (a - b).abs())
                    .sum();
                let w = space_w * (dist * dist * color_coeff).exp();
                for (s, v) in sums.iter_mut().zip(&neighbor) {
                    *s += w * v;
                }
                total += w;
            }
            for (plane_out, s) in out.iter_mut().zip(sums) {
                plane_out.push(s / total);
            }
        }
    }

    Mat::merge_f64(rows, cols, src.depth(), &out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn gray(rows: usize, cols: usize, values: &[f64]) -> Mat {
        Mat::from_f64(rows, cols, 1, Depth::U8, values).unwrap()
    }

    #[test]
    fn test_blur_constant_image_unchanged() {
        let src = gray(3, 4, &[50.0; 12]);
        let dst = blur(&src, Size::new(3, 3), Point::new(-1, -1), BorderType::DEFAULT).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn test_box_filter_unnormalized_sums() {
        let src = gray(1, 3, &[1.0, 2.0, 3.0]);
        let dst = box_filter(&src, Depth::F32 as i32, Size::new(3, 1), Point::new(-1, -1), false, BorderType::Constant)
            .unwrap();
        assert_eq!(dst.depth(), Depth::F32);
        assert_eq!(dst.to_f64(), vec![3.0, 6.0, 5.0]);
    }

    #[test]
    fn test_box_size_is_cols_by_rows() {
        // a 3-wide, 1-tall window averages along the row only
        let src = gray(3, 3, &[0.0, 90.0, 0.0, 0.0, 90.0, 0.0, 0.0, 90.0, 0.0]);
        let dst = blur(&src, Size::new(3, 1), Point::new(-1, -1), BorderType::Constant).unwrap();
        assert_eq!(dst.as_bytes(), &[30, 30, 30, 30, 30, 30, 30, 30, 30]);
        let dst = blur(&src, Size::new(1, 3), Point::new(-1, -1), BorderType::Replicate).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn test_filter2d_with_delta() {
        let src = gray(1, 3, &[10.0, 20.0, 30.0]);
        let kernel = Mat::from_f64(1, 1, 1, Depth::F32, &[2.0]).unwrap();
        let dst = filter2d(&src, -1, &kernel, Point::new(-1, -1), 1.0, BorderType::DEFAULT).unwrap();
        assert_eq!(dst.as_bytes(), &[21, 41, 61]);

        let multi = Mat::from_f64(1, 1, 2, Depth::F32, &[1.0, 1.0]).unwrap();
        assert!(filter2d(&src, -1, &multi, Point::new(-1, -1), 0.0, BorderType::DEFAULT).is_err());
    }

    #[test]
    fn test_gaussian_blur_sizes() {
        let src = gray(5, 5, &[100.0; 25]);
        let dst = gaussian_blur(&src, Size::new(3, 5), 0.0, 0.0, BorderType::DEFAULT).unwrap();
        assert_eq!(dst, src);
        let dst = gaussian_blur(&src, Size::new(0, 0), 1.2, 0.0, BorderType::DEFAULT).unwrap();
        assert_eq!(dst, src);
        assert!(gaussian_blur(&src, Size::new(0, 0), 0.0, 0.0, BorderType::DEFAULT).is_err());
        assert!(gaussian_blur(&src, Size::new(4, 3), 0.0, 0.0, BorderType::DEFAULT).is_err());
    }

    #[test]
    fn test_median_removes_salt() {
        let mut values = vec![10.0; 9];
        values[4] = 255.0;
        let src = gray(3, 3, &values);
        let dst = median_blur(&src, 3).unwrap();
        assert_eq!(dst.as_bytes()[4], 10);

        let wide = Mat::from_f64(3, 3, 1, Depth::F32, &values).unwrap();
        assert_eq!(median_blur(&wide, 3).unwrap().to_f64()[4], 10.0);
        assert!(median_blur(&src, 2).is_err());
    }

    #[test]
    fn test_bilateral_keeps_flat_image() {
        let src = Mat::from_f64(2, 2, 3, Depth::U8, &[40.0; 12]).unwrap();
        let dst = bilateral_filter(&src, 5, 20.0, 20.0, BorderType::DEFAULT).unwrap();
        assert_eq!(dst, src);
        let two = Mat::from_f64(1, 1, 2, Depth::U8, &[1.0, 2.0]).unwrap();
        assert!(bilateral_filter(&two, 5, 20.0, 20.0, BorderType::DEFAULT).is_err());
    }

    #[test]
    fn test_bilateral_radius_from_sigma_space() {
        // d = 0 with sigma_space 2 uses radius round(3.0) = 3, i.e. d = 7
        let values: Vec<f64> = (0..49).map(|i| ((i * 37) % 256) as f64).collect();
        let src = gray(7, 7, &values);
        let derived = bilateral_filter(&src, 0, 50.0, 2.0, BorderType::DEFAULT).unwrap();
        let explicit = bilateral_filter(&src, 7, 50.0, 2.0, BorderType::DEFAULT).unwrap();
        let smaller = bilateral_filter(&src, 5, 50.0, 2.0, BorderType::DEFAULT).unwrap();
        assert_eq!(derived, explicit);
        assert_ne!(derived, smaller);
    }

    #[test]
    fn test_oversized_windows_rejected() {
        let src = gray(2, 2, &[1.0; 4]);
        let center = Point::new(-1, -1);
        let limit = |r: Result<Mat>| matches!(r, Err(CvError::Limit(_)));

        assert!(limit(box_filter(&src, -1, Size::new(i32::MAX, 1), center, true, BorderType::DEFAULT)));
        assert!(limit(gaussian_blur(&src, Size::new(0, 0), 1e9, 0.0, BorderType::DEFAULT)));
        assert!(limit(gaussian_blur(&src, Size::new(0, 0), f64::INFINITY, 0.0, BorderType::DEFAULT)));
        assert!(limit(median_blur(&src, i32::MAX)));
        let wide = Mat::from_f64(2, 2, 1, Depth::F32, &[1.0; 4]).unwrap();
        assert!(limit(median_blur(&wide, 65_537)));
        assert!(limit(bilateral_filter(&src, i32::MAX, 20.0, 20.0, BorderType::DEFAULT)));
        assert!(limit(bilateral_filter(&src, 0, 20.0, 1e300, BorderType::DEFAULT)));
    }
}
