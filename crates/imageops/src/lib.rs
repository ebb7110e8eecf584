//! # imageops
//!
//! Deterministic per-frame image operators over batches of float RGB(A)
//! frames, meant to be driven by a node-graph host.
//!
//! Every operator is a pure function of its inputs: parameters, an
//! [`ImageBatch`] (or a video batch standing in for it), an optional host
//! mask and the shared [`OpsConfig`]. Image-to-image operators implement
//! [`ImageOp`], whose [`ImageOp::apply`] handles source selection, bypass and
//! the masked composite.
//!
//! # Modules
//!
//! - [`adapter`] - source selection, mask squeeze/broadcast/resample
//! - [`color`] - color correct, levels, hue/sat, invert, clamp, color adjust
//! - [`filter`] - blur, sharpen, edge detect, glow
//! - [`geometry`] - crop/pad and crop/reformat
//! - [`transform`] - scale, rotate, translate
//! - [`composite`] - two-input merge
//! - [`morphology`] - mask dilate/erode
//! - [`key`] - luma key
//! - [`roto`] - paint and bezier vector masks
//! - [`kernel`], [`resize`], [`raster`] - building blocks
//!
//! # Example
//!
//! ```rust
//! use imageops::{ImageBatch, ImageOp, MaskTensor, OpsConfig};
//! use imageops::filter::Blur;
//!
//! let cfg = OpsConfig::default();
//! let img = ImageBatch::filled(2, 16, 16, &[0.2, 0.4, 0.6, 1.0]).unwrap();
//! let mask = MaskTensor::from_2d(4, 4, vec![1.0; 16]);
//!
//! let out = Blur { radius: 2, sigma: 1.0 }
//!     .apply(Some(&img), None, Some(&mask), &cfg)
//!     .unwrap();
//! assert_eq!(out.shape(), img.shape());
//! ```
//!
//! # Features
//!
//! - `parallel` (default) - row and frame loops run on rayon

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod adapter;
pub mod color;
pub mod composite;
pub mod filter;
pub mod geometry;
pub mod kernel;
pub mod key;
pub mod masked;
pub mod morphology;
pub mod operator;
mod parallel;
pub mod raster;
pub mod resize;
pub mod roto;
pub mod transform;

pub use imageops_core::{ImageBatch, MaskBatch, MaskTensor, OpsConfig, OpsError, OpsResult};

pub use color::{Clamp, ColorAdjust, ColorCorrect, HueSat, Invert, Levels};
pub use composite::{Merge, MergeMode};
pub use filter::{Blur, EdgeDetect, Glow, Sharpen};
pub use geometry::{CropReformat, PadMode, ReformatMode};
pub use key::LumaKey;
pub use morphology::{DilateErode, MorphOp};
pub use operator::{ImageOp, Operator};
pub use resize::Filter;
pub use roto::{RotoMask, VectorMaskSpec};
pub use transform::Transform;
