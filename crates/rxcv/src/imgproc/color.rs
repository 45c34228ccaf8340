//! Color space conversions
//!
//! 8-bit HSV stores hue halved (0..180) so it fits a byte; 32-bit float HSV
//! uses degrees with saturation and value in 0..1.

use crate::consts::{ColorConversion, Depth};
use crate::error::{CvError, Result};
use crate::mat::Mat;

use super::require_nonempty;

const GRAY_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Accepted source channel counts and the output channel count.
fn channel_layout(code: ColorConversion) -> (&'static [usize], usize) {
    use ColorConversion::*;
    match code {
        Bgr2Bgra | Bgr2Rgba => (&[3, 4], 4),
        Bgra2Bgr | Rgba2Bgr => (&[4], 3),
        Bgr2Rgb => (&[3, 4], 3),
        Bgra2Rgba => (&[4], 4),
        Bgr2Gray | Rgb2Gray => (&[3, 4], 1),
        Bgra2Gray | Rgba2Gray => (&[4], 1),
        Gray2Bgr => (&[1], 3),
        Gray2Bgra => (&[1], 4),
        Bgr2Hsv | Rgb2Hsv | Hsv2Bgr | Hsv2Rgb => (&[3], 3),
    }
}

fn full_scale(depth: Depth) -> f64 {
    match depth {
        Depth::U8 => 255.0,
        Depth::U16 => 65535.0,
        _ => 1.0,
    }
}

fn gray(r: f64, g: f64, b: f64) -> f64 {
    GRAY_WEIGHTS[0] * r + GRAY_WEIGHTS[1] * g + GRAY_WEIGHTS[2] * b
}

/// `(h, s, v)` with `h` in degrees and `s`, `v` in the input scale.
fn rgb_to_hsv(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);
    let s = if v > 0.0 { diff / v } else { 0.0 };
    if diff == 0.0 {
        return (0.0, s, v);
    }
    let mut h = if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }
    (h, s, v)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (v, v, v);
    }
    let h = h.rem_euclid(360.0) / 60.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// Convert `src` between color spaces, keeping its depth.
pub fn cvt_color(src: &Mat, code: ColorConversion) -> Result<Mat> {
    require_nonempty(src, "source")?;
    let depth = src.depth();
    if !matches!(depth, Depth::U8 | Depth::U16 | Depth::F32) {
        return Err(CvError::unsupported(format!("color conversion of {:?} matrices", depth)));
    }
    let is_hsv = matches!(
        code,
        ColorConversion::Bgr2Hsv
            | ColorConversion::Rgb2Hsv
            | ColorConversion::Hsv2Bgr
            | ColorConversion::Hsv2Rgb
    );
    if is_hsv && depth == Depth::U16 {
        return Err(CvError::unsupported("HSV conversion of 16-bit matrices"));
    }

    let (accepted, dcn) = channel_layout(code);
    let scn = src.channels();
    if !accepted.contains(&scn) {
        return Err(CvError::invalid(format!(
            "{:?} expects {:?} source channels, got {}",
            code, accepted, scn
        )));
    }

    let scale = full_scale(depth);
    let byte_hsv = depth == Depth::U8;
    let values = src.to_f64();
    let mut out = Vec::with_capacity(src.rows() * src.cols() * dcn);

    for px in values.chunks_exact(scn) {
        use ColorConversion::*;
        match code {
            Bgr2Bgra => out.extend_from_slice(&[px[0], px[1], px[2], alpha(px, scale)]),
            Bgr2Rgba => out.extend_from_slice(&[px[2], px[1], px[0], alpha(px, scale)]),
            Bgra2Bgr => out.extend_from_slice(&px[..3]),
            Rgba2Bgr | Bgr2Rgb => out.extend_from_slice(&[px[2], px[1], px[0]]),
            Bgra2Rgba => out.extend_from_slice(&[px[2], px[1], px[0], px[3]]),
            Bgr2Gray | Bgra2Gray => out.push(gray(px[2], px[1], px[0])),
            Rgb2Gray | Rgba2Gray => out.push(gray(px[0], px[1], px[2])),
            Gray2Bgr => out.extend_from_slice(&[px[0]; 3]),
            Gray2Bgra => out.extend_from_slice(&[px[0], px[0], px[0], scale]),
            Bgr2Hsv | Rgb2Hsv => {
                let (r, g, b) = if code == Bgr2Hsv {
                    (px[2], px[1], px[0])
                } else {
                    (px[0], px[1], px[2])
                };
                let (h, s, v) = rgb_to_hsv(r, g, b);
                if byte_hsv {
                    out.extend_from_slice(&[h / 2.0, s * 255.0, v]);
                } else {
                    out.extend_from_slice(&[h, s, v]);
                }
            }
            Hsv2Bgr | Hsv2Rgb => {
                let (h, s, v) = if byte_hsv {
                    (px[0] * 2.0, px[1] / 255.0, px[2] / 255.0)
                } else {
                    (px[0], px[1], px[2])
                };
                let (r, g, b) = hsv_to_rgb(h, s, v);
                let k = if byte_hsv { 255.0 } else { 1.0 };
                if code == Hsv2Bgr {
                    out.extend_from_slice(&[b * k, g * k, r * k]);
                } else {
                    out.extend_from_slice(&[r * k, g * k, b * k]);
                }
            }
        }
    }

    Mat::from_f64(src.rows(), src.cols(), dcn, depth, &out)
}

fn alpha(px: &[f64], scale: f64) -> f64 {
    px.get(3).copied().unwrap_or(scale)
}
