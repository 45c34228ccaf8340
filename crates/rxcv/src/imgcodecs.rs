//! Image file and memory codecs
//!
//! Decoding and encoding go through the `image` crate. Colour images are
//! stored BGR(A) in a [`Mat`], so channels are swapped at this boundary.

use std::io::Cursor;
use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat};

use crate::config;
use crate::consts::{ColorConversion, Depth, ImreadFlags};
use crate::error::{CvError, Result};
use crate::imgproc::cvt_color;
use crate::mat::{Mat, MatData};

fn swap_rb<T>(values: &mut [T], channels: usize) {
    if channels >= 3 {
        values.chunks_exact_mut(channels).for_each(|px| px.swap(0, 2));
    }
}

fn bytes_per_channel(color: ColorType) -> u16 {
    color.bytes_per_pixel() as u16 / color.channel_count() as u16
}

/// Convert a decoded image into a matrix honoring `flags`.
fn into_mat(img: DynamicImage, flags: ImreadFlags) -> Result<Mat> {
    let color = img.color();
    let (cols, rows) = (img.width() as usize, img.height() as usize);

    let channels = if flags.unchanged {
        if color.has_alpha() && (color.has_color() || color.channel_count() == 2) {
            4
        } else if color.has_color() {
            3
        } else {
            1
        }
    } else if flags.color || (flags.any_color && color.has_color()) {
        3
    } else {
        1
    };
    let depth = match bytes_per_channel(color) {
        2 if flags.any_depth => Depth::U16,
        4 if flags.unchanged => Depth::F32,
        _ => Depth::U8,
    };

    // a coloured source reduced to one channel goes through the grey weights
    if channels == 1 && color.has_color() {
        let bgr = into_mat(img, ImreadFlags { color: true, any_color: false, unchanged: false, ..flags })?;
        return cvt_color(&bgr, ColorConversion::Bgr2Gray);
    }

    let data = match (depth, channels) {
        (Depth::U8, 1) => MatData::U8(img.into_luma8().into_raw()),
        (Depth::U8, 3) => MatData::U8(img.into_rgb8().into_raw()),
        (Depth::U8, _) => MatData::U8(img.into_rgba8().into_raw()),
        (Depth::U16, 1) => MatData::U16(img.into_luma16().into_raw()),
        (Depth::U16, 3) => MatData::U16(img.into_rgb16().into_raw()),
        (Depth::U16, _) => MatData::U16(img.into_rgba16().into_raw()),
        (_, 1) => MatData::F32(img.to_luma32f().into_raw()),
        (_, 3) => MatData::F32(img.into_rgb32f().into_raw()),
        _ => MatData::F32(img.into_rgba32f().into_raw()),
    };
    let data = match data {
        MatData::U8(mut v) => {
            swap_rb(&mut v, channels);
            MatData::U8(v)
        }
        MatData::U16(mut v) => {
            swap_rb(&mut v, channels);
            MatData::U16(v)
        }
        MatData::F32(mut v) => {
            swap_rb(&mut v, channels);
            MatData::F32(v)
        }
        other => other,
    };
    Mat::from_data(rows, cols, channels, data)
}

/// Convert a matrix into an encodable image, swapping BGR(A) to RGB(A).
fn into_image(mat: &Mat) -> Result<DynamicImage> {
    if mat.is_empty() {
        return Err(CvError::invalid("cannot encode an empty matrix"));
    }
    let (w, h) = (mat.cols() as u32, mat.rows() as u32);
    let channels = mat.channels();
    let too_large = || CvError::invalid("matrix too large for an image buffer");

    let img = match (mat.data(), channels) {
        (MatData::U8(v), 1) => image::GrayImage::from_raw(w, h, v.clone()).map(DynamicImage::ImageLuma8),
        (MatData::U8(v), 3) => {
            let mut v = v.clone();
            swap_rb(&mut v, 3);
            image::RgbImage::from_raw(w, h, v).map(DynamicImage::ImageRgb8)
        }
        (MatData::U8(v), 4) => {
            let mut v = v.clone();
            swap_rb(&mut v, 4);
            image::RgbaImage::from_raw(w, h, v).map(DynamicImage::ImageRgba8)
        }
        (MatData::U16(v), 1) => {
            image::ImageBuffer::from_raw(w, h, v.clone()).map(DynamicImage::ImageLuma16)
        }
        (MatData::U16(v), 3) => {
            let mut v = v.clone();
            swap_rb(&mut v, 3);
            image::ImageBuffer::from_raw(w, h, v).map(DynamicImage::ImageRgb16)
        }
        (MatData::U16(v), 4) => {
            let mut v = v.clone();
            swap_rb(&mut v, 4);
            image::ImageBuffer::from_raw(w, h, v).map(DynamicImage::ImageRgba16)
        }
        (MatData::F32(v), 3) => {
            let mut v = v.clone();
            swap_rb(&mut v, 3);
            image::Rgb32FImage::from_raw(w, h, v).map(DynamicImage::ImageRgb32F)
        }
        (MatData::F32(v), 4) => {
            let mut v = v.clone();
            swap_rb(&mut v, 4);
            image::Rgba32FImage::from_raw(w, h, v).map(DynamicImage::ImageRgba32F)
        }
        _ => {
            return Err(CvError::unsupported(format!(
                "encoding {:?} matrices with {} channels",
                mat.depth(),
                channels
            )))
        }
    };
    img.ok_or_else(too_large)
}

/// JPEG carries neither alpha nor 16-bit samples.
fn fit_for_format(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    if format != ImageFormat::Jpeg {
        return img;
    }
    if img.color().has_color() {
        DynamicImage::ImageRgb8(img.into_rgb8())
    } else {
        DynamicImage::ImageLuma8(img.into_luma8())
    }
}

fn format_from_ext(ext: &str) -> Result<ImageFormat> {
    let trimmed = ext.trim_start_matches('.');
    ImageFormat::from_extension(trimmed)
        .ok_or_else(|| CvError::unsupported(format!("image extension {:?}", ext)))
}

/// Decode an image file.
pub fn imread(path: impl AsRef<Path>, flags: ImreadFlags) -> Result<Mat> {
    let path = path.as_ref();
    let img = image::ImageReader::open(path)?.with_guessed_format()?.decode()?;
    tracing::debug!(path = %path.display(), width = img.width(), height = img.height(), "image read");
    into_mat(img, flags)
}

/// Encode `mat` to `path`, picking the format from the extension.
pub fn imwrite(mat: &Mat, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)?;
    fit_for_format(into_image(mat)?, format).save_with_format(path, format)?;
    tracing::debug!(path = %path.display(), ?format, "image written");
    Ok(())
}

/// Encode `mat` in memory. `ext` is an extension such as `".png"`.
pub fn imencode(mat: &Mat, ext: &str) -> Result<Vec<u8>> {
    let format = format_from_ext(ext)?;
    let mut buf = Vec::new();
    fit_for_format(into_image(mat)?, format).write_to(&mut Cursor::new(&mut buf), format)?;
    Ok(buf)
}

/// Decode an in-memory image.
pub fn imdecode(data: &[u8], flags: ImreadFlags) -> Result<Mat> {
    if data.is_empty() {
        return Err(CvError::invalid("empty image buffer"));
    }
    config::check_buffer_len(data.len())?;
    into_mat(image::load_from_memory(data)?, flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn color_flags() -> ImreadFlags {
        ImreadFlags::from_flags(ImreadFlags::COLOR).unwrap()
    }

    fn bgr_gradient(rows: usize, cols: usize) -> Mat {
        let values: Vec<f64> = (0..rows * cols)
            .flat_map(|i| [(i % 256) as f64, 0.0, 255.0])
            .collect();
        Mat::from_f64(rows, cols, 3, Depth::U8, &values).unwrap()
    }

    #[test]
    fn test_png_round_trip_is_lossless_and_keeps_bgr() {
        let src = bgr_gradient(4, 5);
        let encoded = imencode(&src, ".png").unwrap();
        assert!(!encoded.is_empty());
        let decoded = imdecode(&encoded, color_flags()).unwrap();
        assert_eq!(decoded, src);
    }

    #[test]
    fn test_jpeg_round_trip_keeps_shape() {
        let src = bgr_gradient(16, 24);
        let encoded = imencode(&src, "jpg").unwrap();
        let decoded = imdecode(&encoded, color_flags()).unwrap();
        assert_eq!((decoded.rows(), decoded.cols(), decoded.channels()), (16, 24, 3));
    }

    #[test]
    fn test_grayscale_and_unchanged_modes() {
        let rgba = Mat::from_f64(1, 2, 4, Depth::U8, &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0])
            .unwrap();
        let encoded = imencode(&rgba, ".png").unwrap();

        let unchanged = imdecode(&encoded, ImreadFlags::from_flags(ImreadFlags::UNCHANGED).unwrap()).unwrap();
        assert_eq!(unchanged, rgba);

        let gray = imdecode(&encoded, ImreadFlags::from_flags(ImreadFlags::GRAYSCALE).unwrap()).unwrap();
        assert_eq!(gray.channels(), 1);

        let color = imdecode(&encoded, color_flags()).unwrap();
        assert_eq!(color.channels(), 3);
        assert_eq!(&color.as_bytes()[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_sixteen_bit_needs_any_depth() {
        let src = Mat::from_f64(1, 2, 1, Depth::U16, &[1000.0, 60000.0]).unwrap();
        let encoded = imencode(&src, ".png").unwrap();
        let kept = imdecode(&encoded, ImreadFlags::from_flags(ImreadFlags::UNCHANGED).unwrap()).unwrap();
        assert_eq!(kept, src);
        let reduced = imdecode(&encoded, ImreadFlags::from_flags(ImreadFlags::GRAYSCALE).unwrap()).unwrap();
        assert_eq!(reduced.depth(), Depth::U8);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(imdecode(&[], color_flags()).is_err());
        assert!(imdecode(&[1, 2, 3, 4], color_flags()).is_err());
        assert!(imencode(&Mat::empty(), ".png").is_err());
        assert!(imencode(&bgr_gradient(1, 1), ".nope").is_err());
        let two = Mat::from_f64(1, 1, 2, Depth::U8, &[0.0, 0.0]).unwrap();
        assert!(imencode(&two, ".png").is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let src = bgr_gradient(3, 3);
        imwrite(&src, &path).unwrap();
        assert_eq!(imread(&path, color_flags()).unwrap(), src);
        assert!(imread(dir.path().join("missing.png"), color_flags()).is_err());
    }
}
