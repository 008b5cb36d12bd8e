//! # lumen-enhance
//!
//! Low-light image enhancement engines.
//!
//! Two engines share one [`Enhancer`] interface:
//!
//! - [`Agcwd`] - adaptive gamma correction with weighting distribution; a
//!   per-level gamma curve derived from the intensity histogram
//! - [`Bimef`] - bio-inspired multi-exposure fusion; an edge-aware
//!   illumination estimate blends the image with a brighter synthetic
//!   exposure of itself
//!
//! Both are normally run through a [`ResolutionAdapter`], which bounds the
//! working resolution and restores the original size afterwards.
//!
//! # Pipeline
//!
//! ```text
//! PixelBuffer -> ResolutionAdapter::downscale -> Agcwd | Bimef
//!             -> ResolutionAdapter::upscale   -> PixelBuffer
//! ```
//!
//! # Example
//!
//! ```rust
//! use lumen_core::PixelBuffer;
//! use lumen_enhance::{Bimef, Enhancer, ResolutionAdapter};
//!
//! let data: Vec<u8> = (0..64 * 48 * 3).map(|i| (i % 40) as u8).collect();
//! let photo = PixelBuffer::from_u8(64, 48, 3, data).unwrap();
//!
//! let engine = Bimef::default();
//! let adapter = ResolutionAdapter::for_engine(&engine).unwrap();
//! let bright = adapter.run(&photo, &engine).unwrap();
//! assert_eq!(bright.dimensions(), photo.dimensions());
//! ```
//!
//! Pipelines can also be described in YAML; see [`EnhanceConfig`].
//!
//! # Features
//!
//! - `parallel` (default) - process [`batch`] images on the rayon pool

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod adapter;
pub mod agcwd;
pub mod batch;
pub mod bimef;
pub mod config;
pub mod engine;
pub mod histogram;

pub use adapter::ResolutionAdapter;
pub use agcwd::{agcwd, Agcwd, AgcwdParams, GammaMap, ToneMode};
pub use batch::enhance_batch;
pub use bimef::{bimef, bimef_with_ratio, Bimef, BimefParams, FusionMode, IlluminationParams};
pub use config::{AdapterConfig, ConfigError, ConfigResult, EnhanceConfig};
pub use engine::{Engine, EngineKind, Enhancer};
pub use histogram::HistogramStats;
