//! # lumen-core
//!
//! Core types for low-light image enhancement.
//!
//! This crate provides the foundational types shared by the lumen crates:
//!
//! - [`PixelBuffer`] - owned 2-D image of 8-bit or float samples
//! - [`Intensity`] - how a color pixel collapses to one brightness value
//! - [`Error`] / [`Result`] - the error taxonomy every stage reports through
//!
//! ## Crate Structure
//!
//! ```text
//! lumen-core (this crate)
//!    ^
//!    |
//!    +-- lumen-ops (resampling, filters, linear solver)
//!    +-- lumen-enhance (AGCWD, BIMEF, resolution adapter)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod error;
pub mod pixel;

pub use buffer::{PixelBuffer, SampleType, Samples, SUPPORTED_CHANNELS};
pub use error::{Error, Result};
pub use pixel::{intensity_plane, luma_rec601, quantize_level, Intensity, REC601_LUMA};

/// Prelude module for convenient imports.
///
/// ```
/// use lumen_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::buffer::{PixelBuffer, SampleType, Samples};
    pub use crate::error::{Error, Result};
    pub use crate::pixel::Intensity;
}
