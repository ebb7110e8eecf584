//! # imageops-core
//!
//! Core types shared by every imageops operator.
//!
//! - [`ImageBatch`] - B×H×W×C float frames in [0, 1], RGB or RGBA
//! - [`MaskBatch`] - B×H×W single-channel masks in [0, 1]
//! - [`MaskTensor`] - raw, shape-varying mask input as handed over by a host
//! - [`OpsConfig`] - process-wide tunables (epsilon, luma weights, gamma range, size guards)
//! - [`OpsError`] / [`OpsResult`] - error kinds shared by all operators
//!
//! ## Crate Structure
//!
//! ```text
//! imageops-core (this crate)
//!    ^
//!    |
//!    +-- imageops (adapter, engines, operators)
//!    +-- imageops-tests (integration tests)
//!    +-- imageops-bench (benchmarks)
//! ```
//!
//! ## Memory Layout
//!
//! Frames are stored back to back in one contiguous buffer, each frame
//! row-major, top-to-bottom, channels interleaved:
//!
//! ```text
//! frame 0: [R G B A R G B A ...] row 0
//!          [R G B A R G B A ...] row 1
//! frame 1: ...
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod batch;
pub mod config;
pub mod error;
pub mod pixel;
pub mod tensor;

pub use batch::{ImageBatch, MaskBatch};
pub use config::OpsConfig;
pub use error::{OpsError, OpsResult};
pub use pixel::{clamp01, luma};
pub use tensor::MaskTensor;

/// Prelude module for convenient imports.
///
/// ```
/// use imageops_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::batch::{ImageBatch, MaskBatch};
    pub use crate::config::OpsConfig;
    pub use crate::error::{OpsError, OpsResult};
    pub use crate::pixel::{clamp01, luma};
    pub use crate::tensor::MaskTensor;
}
