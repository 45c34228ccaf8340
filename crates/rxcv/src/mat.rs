//! Dense image matrix owned by the boundary.
//!
//! A [`Mat`] stores `rows * cols * channels` elements of a single [`Depth`]
//! in row-major, channel-interleaved order. Multi-channel 8-bit images use
//! BGR(A) channel order.

use std::mem;

use image::GrayImage;

use crate::config;
use crate::consts::{Depth, MatType};
use crate::error::{CvError, Result};

/// Typed element storage
#[derive(Debug, Clone, PartialEq)]
pub enum MatData {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! each_depth {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            MatData::U8($v) => $body,
            MatData::I8($v) => $body,
            MatData::U16($v) => $body,
            MatData::I16($v) => $body,
            MatData::I32($v) => $body,
            MatData::F32($v) => $body,
            MatData::F64($v) => $body,
        }
    };
}

fn bytes_of<T: Copy>(values: &[T]) -> &[u8] {
    // SAFETY: only instantiated with the primitive numeric element types,
    // which have no padding and no invalid byte patterns.
    unsafe { std::slice::from_raw_parts(values.as_ptr().cast::<u8>(), mem::size_of_val(values)) }
}

fn read_ne<const N: usize, T>(bytes: &[u8], convert: fn([u8; N]) -> T) -> Vec<T> {
    bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut raw = [0u8; N];
            raw.copy_from_slice(chunk);
            convert(raw)
        })
        .collect()
}

/// Round half to even and clamp into the integer range, mapping NaN to 0.
fn saturate(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.round_ties_even().clamp(min, max)
    }
}

impl MatData {
    fn zeros(depth: Depth, len: usize) -> Self {
        match depth {
            Depth::U8 => MatData::U8(vec![0; len]),
            Depth::I8 => MatData::I8(vec![0; len]),
            Depth::U16 => MatData::U16(vec![0; len]),
            Depth::I16 => MatData::I16(vec![0; len]),
            Depth::I32 => MatData::I32(vec![0; len]),
            Depth::F32 => MatData::F32(vec![0.0; len]),
            Depth::F64 => MatData::F64(vec![0.0; len]),
        }
    }

    fn from_ne_bytes(depth: Depth, bytes: &[u8]) -> Self {
        match depth {
            Depth::U8 => MatData::U8(bytes.to_vec()),
            Depth::I8 => MatData::I8(read_ne(bytes, i8::from_ne_bytes)),
            Depth::U16 => MatData::U16(read_ne(bytes, u16::from_ne_bytes)),
            Depth::I16 => MatData::I16(read_ne(bytes, i16::from_ne_bytes)),
            Depth::I32 => MatData::I32(read_ne(bytes, i32::from_ne_bytes)),
            Depth::F32 => MatData::F32(read_ne(bytes, f32::from_ne_bytes)),
            Depth::F64 => MatData::F64(read_ne(bytes, f64::from_ne_bytes)),
        }
    }

    /// Convert `values` into `depth`, saturating integer depths.
    pub fn from_f64(depth: Depth, values: &[f64]) -> Self {
        let iter = values.iter().copied();
        match depth {
            Depth::U8 => MatData::U8(iter.map(|v| saturate(v, 0.0, 255.0) as u8).collect()),
            Depth::I8 => MatData::I8(iter.map(|v| saturate(v, -128.0, 127.0) as i8).collect()),
            Depth::U16 => MatData::U16(iter.map(|v| saturate(v, 0.0, 65535.0) as u16).collect()),
            Depth::I16 => {
                MatData::I16(iter.map(|v| saturate(v, -32768.0, 32767.0) as i16).collect())
            }
            Depth::I32 => MatData::I32(
                iter.map(|v| saturate(v, i32::MIN as f64, i32::MAX as f64) as i32)
                    .collect(),
            ),
            Depth::F32 => MatData::F32(iter.map(|v| v as f32).collect()),
            Depth::F64 => MatData::F64(values.to_vec()),
        }
    }

    pub fn depth(&self) -> Depth {
        match self {
            MatData::U8(_) => Depth::U8,
            MatData::I8(_) => Depth::I8,
            MatData::U16(_) => Depth::U16,
            MatData::I16(_) => Depth::I16,
            MatData::I32(_) => Depth::I32,
            MatData::F32(_) => Depth::F32,
            MatData::F64(_) => Depth::F64,
        }
    }

    pub fn len(&self) -> usize {
        each_depth!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        each_depth!(self, v => bytes_of(v))
    }

    pub fn to_f64(&self) -> Vec<f64> {
        each_depth!(self, v => v.iter().map(|&x| x as f64).collect())
    }

    fn set_f64(&mut self, index: usize, value: f64) {
        let converted = MatData::from_f64(self.depth(), &[value]);
        match (self, converted) {
            (MatData::U8(v), MatData::U8(c)) => v[index] = c[0],
            (MatData::I8(v), MatData::I8(c)) => v[index] = c[0],
            (MatData::U16(v), MatData::U16(c)) => v[index] = c[0],
            (MatData::I16(v), MatData::I16(c)) => v[index] = c[0],
            (MatData::I32(v), MatData::I32(c)) => v[index] = c[0],
            (MatData::F32(v), MatData::F32(c)) => v[index] = c[0],
            (MatData::F64(v), MatData::F64(c)) => v[index] = c[0],
            _ => unreachable!("converted into the same depth"),
        }
    }

    /// Gather elements at `indices` into a new buffer of the same depth.
    fn gather(&self, indices: impl Iterator<Item = usize>) -> Self {
        match self {
            MatData::U8(v) => MatData::U8(indices.map(|i| v[i]).collect()),
            MatData::I8(v) => MatData::I8(indices.map(|i| v[i]).collect()),
            MatData::U16(v) => MatData::U16(indices.map(|i| v[i]).collect()),
            MatData::I16(v) => MatData::I16(indices.map(|i| v[i]).collect()),
            MatData::I32(v) => MatData::I32(indices.map(|i| v[i]).collect()),
            MatData::F32(v) => MatData::F32(indices.map(|i| v[i]).collect()),
            MatData::F64(v) => MatData::F64(indices.map(|i| v[i]).collect()),
        }
    }
}

/// Image matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Mat {
    rows: usize,
    cols: usize,
    channels: usize,
    data: MatData,
}

impl Default for Mat {
    fn default() -> Self {
        Self::empty()
    }
}

/// `rows * cols * channels`, rejected past the configured element limit.
pub(crate) fn element_count(rows: usize, cols: usize, channels: usize) -> Result<usize> {
    let total = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(|| CvError::Limit(format!("{}x{}x{} overflows", rows, cols, channels)))?;
    config::check_elements(total)?;
    Ok(total)
}

impl Mat {
    /// Matrix with no elements (0x0, one 8-bit channel).
    pub fn empty() -> Self {
        Self {
            rows: 0,
            cols: 0,
            channels: 1,
            data: MatData::U8(Vec::new()),
        }
    }

    /// Zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize, typ: MatType) -> Result<Self> {
        let total = element_count(rows, cols, typ.channels)?;
        Ok(Self {
            rows,
            cols,
            channels: typ.channels,
            data: MatData::zeros(typ.depth, total),
        })
    }

    /// Matrix whose first channel is 1 and remaining channels 0.
    pub fn ones(rows: usize, cols: usize, typ: MatType) -> Result<Self> {
        let mut mat = Self::zeros(rows, cols, typ)?;
        for index in (0..mat.data.len()).step_by(typ.channels) {
            mat.data.set_f64(index, 1.0);
        }
        Ok(mat)
    }

    /// Copy a native-endian element buffer of exactly the matrix byte size.
    pub fn from_bytes(rows: usize, cols: usize, typ: MatType, bytes: &[u8]) -> Result<Self> {
        let total = element_count(rows, cols, typ.channels)?;
        let expected = total * typ.depth.elem_size();
        if bytes.len() != expected {
            return Err(CvError::invalid(format!(
                "buffer of {} bytes does not match {}x{}x{} matrix ({} bytes)",
                bytes.len(),
                rows,
                cols,
                typ.channels,
                expected
            )));
        }
        Ok(Self {
            rows,
            cols,
            channels: typ.channels,
            data: MatData::from_ne_bytes(typ.depth, bytes),
        })
    }

    /// Wrap typed storage whose length must be `rows * cols * channels`.
    pub fn from_data(rows: usize, cols: usize, channels: usize, data: MatData) -> Result<Self> {
        let typ = MatType::new(data.depth(), channels)?;
        let total = element_count(rows, cols, typ.channels)?;
        if data.len() != total {
            return Err(CvError::invalid(format!(
                "{} elements do not fill a {}x{}x{} matrix",
                data.len(),
                rows,
                cols,
                channels
            )));
        }
        Ok(Self {
            rows,
            cols,
            channels,
            data,
        })
    }

    /// Build from interleaved `f64` values, converting into `depth`.
    pub fn from_f64(
        rows: usize,
        cols: usize,
        channels: usize,
        depth: Depth,
        values: &[f64],
    ) -> Result<Self> {
        Self::from_data(rows, cols, channels, MatData::from_f64(depth, values))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn depth(&self) -> Depth {
        self.data.depth()
    }

    pub fn mat_type(&self) -> MatType {
        MatType {
            depth: self.depth(),
            channels: self.channels,
        }
    }

    /// Bytes per pixel (all channels).
    pub fn elem_size(&self) -> usize {
        self.channels * self.depth().elem_size()
    }

    /// `rows * cols * channels`
    pub fn total(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &MatData {
        &self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    pub fn to_f64(&self) -> Vec<f64> {
        self.data.to_f64()
    }

    /// Split into one `f64` plane per channel.
    pub fn split_f64(&self) -> Vec<Vec<f64>> {
        let values = self.data.to_f64();
        (0..self.channels)
            .map(|c| values.iter().skip(c).step_by(self.channels).copied().collect())
            .collect()
    }

    /// Interleave `planes` of `rows * cols` values into a matrix of `depth`.
    pub fn merge_f64(rows: usize, cols: usize, depth: Depth, planes: &[Vec<f64>]) -> Result<Self> {
        let channels = planes.len();
        let total = element_count(rows, cols, channels)?;
        let pixels = rows * cols;
        if planes.iter().any(|p| p.len() != pixels) {
            return Err(CvError::invalid("planes differ in size"));
        }
        let mut values = Vec::with_capacity(total);
        for i in 0..pixels {
            values.extend(planes.iter().map(|p| p[i]));
        }
        Self::from_f64(rows, cols, channels, depth, &values)
    }

    /// Single-channel 8-bit matrix as an `image` buffer.
    pub fn to_gray_image(&self) -> Result<GrayImage> {
        match &self.data {
            MatData::U8(v) if self.channels == 1 => {
                GrayImage::from_raw(self.cols as u32, self.rows as u32, v.clone())
                    .ok_or_else(|| CvError::invalid("matrix too large for an image buffer"))
            }
            _ => Err(CvError::unsupported(format!(
                "expected a single-channel 8-bit matrix, got {:?}x{}",
                self.depth(),
                self.channels
            ))),
        }
    }

    /// Split an 8-bit matrix into one grayscale plane per channel.
    pub fn split_u8(&self) -> Result<Vec<GrayImage>> {
        let MatData::U8(values) = &self.data else {
            return Err(CvError::unsupported(format!(
                "expected an 8-bit matrix, got {:?}",
                self.depth()
            )));
        };
        (0..self.channels)
            .map(|c| {
                let plane = values.iter().skip(c).step_by(self.channels).copied().collect();
                GrayImage::from_raw(self.cols as u32, self.rows as u32, plane)
                    .ok_or_else(|| CvError::invalid("matrix too large for an image buffer"))
            })
            .collect()
    }

    /// Interleave grayscale planes of equal size into an 8-bit matrix.
    pub fn merge_u8(planes: &[GrayImage]) -> Result<Self> {
        let first = planes
            .first()
            .ok_or_else(|| CvError::invalid("no planes to merge"))?;
        let (cols, rows) = first.dimensions();
        if planes.iter().any(|p| p.dimensions() != (cols, rows)) {
            return Err(CvError::invalid("planes differ in size"));
        }
        let pixels = (cols * rows) as usize;
        let mut values = Vec::with_capacity(pixels * planes.len());
        for i in 0..pixels {
            values.extend(planes.iter().map(|p| p.as_raw()[i]));
        }
        Self::from_data(rows as usize, cols as usize, planes.len(), MatData::U8(values))
    }

    /// New matrix of `rows x cols` whose pixel `(r, c)` is this matrix's
    /// pixel `source(r, c)`. Channels and depth are preserved.
    pub fn remap_pixels(
        &self,
        rows: usize,
        cols: usize,
        source: impl Fn(usize, usize) -> (usize, usize),
    ) -> Result<Self> {
        let channels = self.channels;
        let mut indices = Vec::with_capacity(element_count(rows, cols, channels)?);
        for r in 0..rows {
            for c in 0..cols {
                let (sr, sc) = source(r, c);
                let base = (sr * self.cols + sc) * channels;
                indices.extend(base..base + channels);
            }
        }
        let data = self.data.gather(indices.into_iter());
        Ok(Self {
            rows,
            cols,
            channels,
            data,
        })
    }

    /// Copy the raw elements into `out`, which must be large enough.
    pub fn copy_to_slice(&self, out: &mut [u8]) -> Result<usize> {
        let bytes = self.as_bytes();
        if out.len() < bytes.len() {
            return Err(CvError::invalid(format!(
                "destination of {} bytes is smaller than matrix data ({} bytes)",
                out.len(),
                bytes.len()
            )));
        }
        out[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }
}
