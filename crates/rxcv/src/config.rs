//! Process-wide boundary configuration
//!
//! Limits are checked before any allocation driven by caller-supplied sizes:
//! matrix shapes, operation outputs, kernel windows and byte buffers.

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::error::{CvError, Result};

/// Default cap on `rows * cols * channels` of a single matrix
pub const DEFAULT_MAX_ELEMENTS: usize = 1 << 28;
/// Default cap on a caller-supplied byte buffer (512MB)
pub const DEFAULT_MAX_BUFFER_LEN: usize = 512 * 1024 * 1024;
/// Default log filter when `RXCV_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryConfig {
    /// Largest element count a matrix may hold
    pub max_elements: usize,
    /// Largest byte buffer accepted from the caller
    pub max_buffer_len: usize,
    /// tracing-subscriber filter directive used when `RXCV_LOG` is unset
    pub log_filter: String,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            max_elements: DEFAULT_MAX_ELEMENTS,
            max_buffer_len: DEFAULT_MAX_BUFFER_LEN,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl BoundaryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_elements == 0 {
            return Err(CvError::invalid("max_elements must be positive"));
        }
        if self.max_buffer_len == 0 {
            return Err(CvError::invalid("max_buffer_len must be positive"));
        }
        Ok(())
    }

    pub fn check_elements(&self, count: usize) -> Result<()> {
        if count > self.max_elements {
            return Err(CvError::Limit(format!(
                "{} elements exceeds maximum of {}",
                count, self.max_elements
            )));
        }
        Ok(())
    }

    pub fn check_buffer_len(&self, len: usize) -> Result<()> {
        if len > self.max_buffer_len {
            return Err(CvError::Limit(format!(
                "buffer of {} bytes exceeds maximum of {}",
                len, self.max_buffer_len
            )));
        }
        Ok(())
    }
}

lazy_static! {
    static ref CONFIG: RwLock<BoundaryConfig> = RwLock::new(BoundaryConfig::default());
}

/// Copy of the active configuration.
pub fn current() -> BoundaryConfig {
    CONFIG.read().clone()
}

/// Replace the active configuration after validating it.
pub fn install(config: BoundaryConfig) -> Result<()> {
    config.validate()?;
    *CONFIG.write() = config;
    Ok(())
}

pub(crate) fn check_elements(count: usize) -> Result<()> {
    CONFIG.read().check_elements(count)
}

pub(crate) fn check_buffer_len(len: usize) -> Result<()> {
    CONFIG.read().check_buffer_len(len)
}
