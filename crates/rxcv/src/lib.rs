//! rxcv: C-ABI Image Processing
//!
//! Matrices, codecs, filtering, geometric transforms and contour analysis
//! exposed to foreign callers through a fixed set of `extern "C"` functions.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────────┐
//! │ C caller     │────▶│ ffi (handles,  │────▶│ imgproc /        │
//! │ (Handle, Pt) │     │ try_execute)   │     │ imgcodecs (Mat)  │
//! └──────────────┘     └────────────────┘     └──────────────────┘
//!        ▲                     │
//!        └── FfiResult<T> ◀────┘
//! ```
//!
//! ## Usage from C
//!
//! ```c
//! FfiResult_Handle img = rxcv_imread("in.png", 1);
//! if (img.error) { fprintf(stderr, "%s\n", img.error); rxcv_string_free(img.error); }
//!
//! FfiResult_Handle gray = rxcv_mat_new();
//! rxcv_cvt_color(img.ok, gray.ok, 6);
//! rxcv_threshold(gray.ok, gray.ok, 0.0, 255.0, 0 | 8);
//!
//! rxcv_mat_release(gray.ok);
//! rxcv_mat_release(img.ok);
//! ```
//!
//! ## Memory Ownership
//!
//! - Objects live in per-kind registries; callers only hold [`Handle`] values
//! - Every constructor is paired with a `*_release` function
//! - Error messages are owned by the caller and freed with `rxcv_string_free`
//! - [`ContourRef`] values are positional and own nothing

pub mod bytes;
pub mod config;
pub mod consts;
pub mod contours;
pub mod error;
pub mod ffi;
pub mod imgcodecs;
pub mod imgproc;
pub mod logging;
pub mod mat;
pub mod registry;
pub mod types;

// Re-export main types
pub use bytes::ByteBuffer;
pub use config::BoundaryConfig;
pub use contours::{Contour, ContourRef, Contours};
pub use error::{CvError, Result};
pub use mat::Mat;
pub use types::{Point, Point2f, Rect, Size};

// Re-export FFI types for C consumers
pub use ffi::RxcvConfigC;
pub use rxcv_ffi_common::{FfiResult, Handle};
