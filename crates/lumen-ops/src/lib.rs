//! # lumen-ops
//!
//! Numeric building blocks for the low-light enhancement engines.
//!
//! Everything here works on plain `f32` planes or interleaved sample slices
//! with explicit dimensions, so the engines can run stages at any working
//! resolution without going through [`lumen_core::PixelBuffer`].
//!
//! # Modules
//!
//! - [`resize`] - Area, bilinear and bicubic resampling
//! - [`filter`] - Forward differences and box sums
//! - [`solver`] - Weighted-Laplacian solve (preconditioned conjugate gradient)
//!
//! # Example
//!
//! ```rust
//! use lumen_ops::resize::{resize_f32, Filter};
//!
//! let plane = vec![0.25f32; 8 * 8];
//! let half = resize_f32(&plane, 8, 8, 1, 4, 4, Filter::Bicubic).unwrap();
//! assert_eq!(half.len(), 16);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod filter;
pub mod resize;
pub mod solver;

pub use error::{OpsError, OpsResult};
pub use resize::Filter;
pub use solver::{Solution, SolverOptions};
