//! Integer codes accepted at the boundary
//!
//! The numeric values match the native vision library's constants so that
//! existing callers can pass them through unchanged.

use crate::error::{CvError, Result};

macro_rules! ffi_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl TryFrom<i32> for $name {
            type Error = CvError;

            fn try_from(value: i32) -> Result<Self> {
                match value {
                    $(v if v == $value => Ok($name::$variant),)+
                    other => Err(CvError::invalid(format!(concat!("unknown ", $what, " {}"), other))),
                }
            }
        }
    };
}

ffi_enum! {
    /// Element depth of a matrix
    Depth, "depth" {
        U8 = 0,
        I8 = 1,
        U16 = 2,
        I16 = 3,
        I32 = 4,
        F32 = 5,
        F64 = 6,
    }
}

impl Depth {
    /// Size of one element in bytes
    pub const fn elem_size(self) -> usize {
        match self {
            Depth::U8 | Depth::I8 => 1,
            Depth::U16 | Depth::I16 => 2,
            Depth::I32 | Depth::F32 => 4,
            Depth::F64 => 8,
        }
    }
}

const CHANNEL_SHIFT: i32 = 3;
const DEPTH_MASK: i32 = (1 << CHANNEL_SHIFT) - 1;
/// Largest channel count a matrix may have
pub const MAX_CHANNELS: usize = 4;

/// Encode a depth and channel count into a matrix type code.
pub const fn make_type(depth: Depth, channels: i32) -> i32 {
    (depth as i32 & DEPTH_MASK) + ((channels - 1) << CHANNEL_SHIFT)
}

pub const CV_8UC1: i32 = make_type(Depth::U8, 1);
pub const CV_8UC3: i32 = make_type(Depth::U8, 3);
pub const CV_8UC4: i32 = make_type(Depth::U8, 4);
pub const CV_32FC1: i32 = make_type(Depth::F32, 1);
pub const CV_64FC1: i32 = make_type(Depth::F64, 1);

/// Decoded matrix type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatType {
    pub depth: Depth,
    pub channels: usize,
}

impl MatType {
    pub fn new(depth: Depth, channels: usize) -> Result<Self> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(CvError::unsupported(format!(
                "{} channels (supported: 1-{})",
                channels, MAX_CHANNELS
            )));
        }
        Ok(Self { depth, channels })
    }

    pub fn from_raw(code: i32) -> Result<Self> {
        if code < 0 {
            return Err(CvError::invalid(format!("unknown matrix type {}", code)));
        }
        let depth = Depth::try_from(code & DEPTH_MASK)
            .map_err(|_| CvError::unsupported(format!("depth code {}", code & DEPTH_MASK)))?;
        let channels = ((code >> CHANNEL_SHIFT) + 1) as usize;
        Self::new(depth, channels)
    }

    pub const fn to_raw(self) -> i32 {
        make_type(self.depth, self.channels as i32)
    }
}

/// Pixel extrapolation used by neighborhood operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum BorderType {
    /// `iiiiii|abcdefgh|iiiiiii` with `i` = 0
    Constant = 0,
    /// `aaaaaa|abcdefgh|hhhhhhh`
    Replicate = 1,
    /// `fedcba|abcdefgh|hgfedcb`
    Reflect = 2,
    /// `cdefgh|abcdefgh|abcdefg`
    Wrap = 3,
    /// `gfedcb|abcdefgh|gfedcba`
    Reflect101 = 4,
}

impl BorderType {
    pub const DEFAULT: BorderType = BorderType::Reflect101;
    const ISOLATED: i32 = 16;

    /// Parse a border code; the isolated flag is accepted and ignored.
    pub fn from_flags(code: i32) -> Result<Self> {
        match code & !Self::ISOLATED {
            0 => Ok(BorderType::Constant),
            1 => Ok(BorderType::Replicate),
            2 => Ok(BorderType::Reflect),
            3 => Ok(BorderType::Wrap),
            4 => Ok(BorderType::Reflect101),
            5 => Err(CvError::unsupported("transparent border")),
            other => Err(CvError::invalid(format!("unknown border type {}", other))),
        }
    }
}

ffi_enum! {
    /// Supported color conversions
    ColorConversion, "color conversion code" {
        Bgr2Bgra = 0,
        Bgra2Bgr = 1,
        Bgr2Rgba = 2,
        Rgba2Bgr = 3,
        Bgr2Rgb = 4,
        Bgra2Rgba = 5,
        Bgr2Gray = 6,
        Rgb2Gray = 7,
        Gray2Bgr = 8,
        Gray2Bgra = 9,
        Bgra2Gray = 10,
        Rgba2Gray = 11,
        Bgr2Hsv = 40,
        Rgb2Hsv = 41,
        Hsv2Bgr = 54,
        Hsv2Rgb = 55,
    }
}

ffi_enum! {
    /// Per-pixel threshold rule
    ThresholdType, "threshold type" {
        Binary = 0,
        BinaryInv = 1,
        Trunc = 2,
        ToZero = 3,
        ToZeroInv = 4,
    }
}

/// Threshold type plus the automatic level flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdFlags {
    pub kind: ThresholdType,
    pub otsu: bool,
}

impl ThresholdFlags {
    const OTSU: i32 = 8;
    const TRIANGLE: i32 = 16;

    pub fn from_flags(code: i32) -> Result<Self> {
        if code & Self::TRIANGLE != 0 {
            return Err(CvError::unsupported("triangle threshold"));
        }
        Ok(Self {
            kind: ThresholdType::try_from(code & !Self::OTSU)?,
            otsu: code & Self::OTSU != 0,
        })
    }
}

ffi_enum! {
    /// Local mean used by adaptive thresholding
    AdaptiveMethod, "adaptive method" {
        MeanC = 0,
        GaussianC = 1,
    }
}

/// Decoding behaviour for `imread` / `imdecode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImreadFlags {
    /// Keep channel count, alpha and depth as stored
    pub unchanged: bool,
    /// Force three-channel BGR
    pub color: bool,
    /// Keep 16-bit depth instead of converting to 8-bit
    pub any_depth: bool,
    /// Keep stored channel count
    pub any_color: bool,
}

impl ImreadFlags {
    pub const UNCHANGED: i32 = -1;
    pub const GRAYSCALE: i32 = 0;
    pub const COLOR: i32 = 1;
    pub const ANYDEPTH: i32 = 2;
    pub const ANYCOLOR: i32 = 4;

    pub fn from_flags(code: i32) -> Result<Self> {
        if code == Self::UNCHANGED {
            return Ok(Self {
                unchanged: true,
                color: false,
                any_depth: true,
                any_color: true,
            });
        }
        if !(0..8).contains(&code) {
            return Err(CvError::unsupported(format!("imread mode {}", code)));
        }
        Ok(Self {
            unchanged: false,
            color: code & Self::COLOR != 0,
            any_depth: code & Self::ANYDEPTH != 0,
            any_color: code & Self::ANYCOLOR != 0,
        })
    }
}

ffi_enum! {
    /// Which contours `find_contours` reports
    RetrievalMode, "retrieval mode" {
        External = 0,
        List = 1,
        CComp = 2,
        Tree = 3,
    }
}

ffi_enum! {
    /// How contour points are stored
    ContourApprox, "contour approximation method" {
        /// Every boundary pixel
        None = 1,
        /// Only the end points of horizontal, vertical and diagonal runs
        Simple = 2,
    }
}

ffi_enum! {
    /// Resampling filter for `resize`
    Interpolation, "interpolation" {
        Nearest = 0,
        Linear = 1,
        Cubic = 2,
        Area = 3,
        Lanczos4 = 4,
        LinearExact = 5,
        NearestExact = 6,
    }
}

ffi_enum! {
    /// Compound morphology operation
    MorphType, "morphology operation" {
        Erode = 0,
        Dilate = 1,
        Open = 2,
        Close = 3,
        Gradient = 4,
        TopHat = 5,
        BlackHat = 6,
    }
}

ffi_enum! {
    /// Structuring element shape
    MorphShape, "structuring element shape" {
        Rect = 0,
        Cross = 1,
        Ellipse = 2,
    }
}

ffi_enum! {
    /// Right-angle rotation
    RotateCode, "rotate code" {
        Clockwise90 = 0,
        Rotate180 = 1,
        CounterClockwise90 = 2,
    }
}

/// Flip axis; the sign convention follows the native library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipCode {
    /// `0`: around the x-axis (rows reversed)
    Vertical,
    /// `> 0`: around the y-axis (columns reversed)
    Horizontal,
    /// `< 0`: both axes
    Both,
}

impl From<i32> for FlipCode {
    fn from(code: i32) -> Self {
        match code {
            0 => FlipCode::Vertical,
            c if c > 0 => FlipCode::Horizontal,
            _ => FlipCode::Both,
        }
    }
}
