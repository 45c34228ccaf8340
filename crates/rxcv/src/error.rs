//! Error types for the image boundary
//!
//! Callers across the C ABI only ever see the `Display` text of these
//! errors; the variants exist for Rust callers and for tests.

use rxcv_ffi_common::RegistryError;
use thiserror::Error;

/// Result type for matrix, codec and processing operations
pub type Result<T> = std::result::Result<T, CvError>;

/// Errors that can occur inside a boundary call
#[derive(Debug, Error)]
pub enum CvError {
    /// Argument rejected before reaching the library
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Depth, channel layout or flag combination the library does not handle
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Indexed access past the end of a collection
    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: i64, len: usize },

    /// Image encode/decode failure
    #[error("codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// IO error (for path based read/write)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Handle could not be resolved
    #[error(transparent)]
    Handle(#[from] RegistryError),

    /// Configured size limit exceeded
    #[error("limit exceeded: {0}")]
    Limit(String),
}

impl CvError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        CvError::InvalidArgument(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        CvError::Unsupported(msg.into())
    }
}
