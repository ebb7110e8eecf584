//! Error types for imageops operations.
//!
//! Hard failures are reserved for shape and size contract violations.
//! Per-pixel arithmetic edge cases (near-zero denominators, extreme gamma,
//! degenerate crops) are defused inside the operators and never surface here.
//!
//! # Usage
//!
//! ```rust
//! use imageops_core::{OpsError, OpsResult};
//!
//! fn guard(width: usize, height: usize, limit: usize) -> OpsResult<()> {
//!     if width > limit || height > limit {
//!         return Err(OpsError::SizeLimitExceeded { width, height, limit });
//!     }
//!     Ok(())
//! }
//!
//! assert!(guard(9000, 10, 8192).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`OpsError`].
pub type OpsResult<T> = std::result::Result<T, OpsError>;

/// Errors that can occur while running an operator.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Tensor rank or shape outside the documented squeeze rules,
    /// or batches that cannot be paired.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A geometry operation would produce an image above the configured limit.
    ///
    /// Raised before any allocation happens.
    #[error("result size {width}x{height} exceeds maximum dimension {limit}")]
    SizeLimitExceeded {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
        /// Configured maximum for either side
        limit: usize,
    },

    /// Neither an image nor a video batch was supplied.
    #[error("no source: an image or video input is required")]
    NoSource,

    /// Configuration could not be parsed or failed validation.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error while reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OpsError {
    /// Creates an [`OpsError::InvalidInput`] from anything printable.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
