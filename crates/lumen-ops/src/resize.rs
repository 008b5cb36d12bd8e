//! Image resize and resampling operations.
//!
//! Separable two-pass resampling of interleaved `f32` samples.
//!
//! # Filters
//!
//! - [`Filter::Area`] - Exact pixel-area averaging (best for downscaling,
//!   falls back to bilinear when enlarging)
//! - [`Filter::Bilinear`] - Linear interpolation (smooth, fast)
//! - [`Filter::Bicubic`] - Keys cubic convolution (sharp, for enlarging)
//!
//! # Example
//!
//! ```rust
//! use lumen_ops::resize::{resize_f32, Filter};
//!
//! let src: Vec<f32> = vec![0.0; 64 * 64 * 3]; // 64x64 RGB
//! let dst = resize_f32(&src, 64, 64, 3, 16, 16, Filter::Area).unwrap();
//! assert_eq!(dst.len(), 16 * 16 * 3);
//! ```

use crate::error::check_len;
use crate::{OpsError, OpsResult};
use tracing::trace;

/// Keys cubic convolution parameter (matches common 8-bit imaging libraries).
const CUBIC_A: f32 = -0.75;

/// Resampling filter for resize operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// Pixel-area averaging.
    Area,
    /// Bilinear interpolation (smooth, fast).
    Bilinear,
    /// Bicubic interpolation (sharper than bilinear).
    #[default]
    Bicubic,
}

impl Filter {
    /// Returns the support radius for this filter.
    #[inline]
    pub fn support(&self) -> f32 {
        match self {
            Filter::Area => 0.5,
            Filter::Bilinear => 1.0,
            Filter::Bicubic => 2.0,
        }
    }

    /// Evaluates the filter kernel at position x.
    #[inline]
    pub fn weight(&self, x: f32) -> f32 {
        match self {
            Filter::Area => box_weight(x),
            Filter::Bilinear => bilinear_weight(x),
            Filter::Bicubic => bicubic_weight(x),
        }
    }
}

#[inline]
fn box_weight(x: f32) -> f32 {
    if x.abs() < 0.5 { 1.0 } else { 0.0 }
}

/// Bilinear (triangle) weight function.
#[inline]
fn bilinear_weight(x: f32) -> f32 {
    let ax = x.abs();
    if ax < 1.0 { 1.0 - ax } else { 0.0 }
}

/// Keys cubic convolution kernel.
#[inline]
fn bicubic_weight(x: f32) -> f32 {
    let a = CUBIC_A;
    let ax = x.abs();
    if ax < 1.0 {
        ((a + 2.0) * ax - (a + 3.0)) * ax * ax + 1.0
    } else if ax < 2.0 {
        ((a * ax - 5.0 * a) * ax + 8.0 * a) * ax - 4.0 * a
    } else {
        0.0
    }
}

/// Source taps contributing to one destination sample.
type Taps = Vec<(usize, f32)>;

/// Resizes f32 image data.
///
/// # Arguments
///
/// * `src` - Source samples, interleaved
/// * `src_w` - Source width
/// * `src_h` - Source height
/// * `channels` - Number of interleaved channels
/// * `dst_w` - Destination width
/// * `dst_h` - Destination height
/// * `filter` - Resampling filter
///
/// # Returns
///
/// Resized samples as `Vec<f32>`. Resizing to the source size returns an
/// exact copy.
///
/// # Example
///
/// ```rust
/// use lumen_ops::resize::{resize_f32, Filter};
///
/// let src = vec![0.5f32; 16 * 16 * 4];
/// let dst = resize_f32(&src, 16, 16, 4, 32, 32, Filter::Bicubic).unwrap();
/// assert_eq!(dst.len(), 32 * 32 * 4);
/// ```
pub fn resize_f32(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    dst_h: usize,
    filter: Filter,
) -> OpsResult<Vec<f32>> {
    trace!(src_w, src_h, channels, dst_w, dst_h, ?filter, "resize");

    if src_w == 0 || src_h == 0 || channels == 0 {
        return Err(OpsError::InvalidDimensions(
            "source width, height and channels must be > 0".into(),
        ));
    }
    check_len(src.len(), src_w, src_h, channels)?;
    if dst_w == 0 || dst_h == 0 {
        return Err(OpsError::InvalidDimensions(
            "destination size must be > 0".into(),
        ));
    }
    if src_w == dst_w && src_h == dst_h {
        return Ok(src.to_vec());
    }

    // Two-pass separable resize: horizontal then vertical
    let temp = resize_horizontal(src, src_w, src_h, channels, dst_w, filter);
    let result = resize_vertical(&temp, dst_w, src_h, channels, dst_h, filter);

    Ok(result)
}

/// Computes the taps for every destination sample along one axis.
fn contributions(src_len: usize, dst_len: usize, filter: Filter) -> Vec<Taps> {
    let scale = src_len as f32 / dst_len as f32;
    if filter == Filter::Area {
        if scale > 1.0 {
            return area_contributions(src_len, dst_len, scale);
        }
        // Enlarging by area is bilinear interpolation
        return contributions(src_len, dst_len, Filter::Bilinear);
    }

    let support = filter.support() * scale.max(1.0);
    (0..dst_len)
        .map(|x| {
            // Map destination x to source x
            let center = (x as f32 + 0.5) * scale - 0.5;
            let left = ((center - support).floor() as isize).max(0) as usize;
            let right = ((center + support).ceil() as usize).min(src_len - 1);

            let mut taps: Taps = (left..=right)
                .map(|sx| {
                    let dist = (sx as f32 - center) / scale.max(1.0);
                    (sx, filter.weight(dist))
                })
                .filter(|&(_, w)| w != 0.0)
                .collect();

            let weight_sum: f32 = taps.iter().map(|&(_, w)| w).sum();
            if taps.is_empty() || weight_sum.abs() < 1e-6 {
                let nearest = (center.round().max(0.0) as usize).min(src_len - 1);
                return vec![(nearest, 1.0)];
            }
            for tap in &mut taps {
                tap.1 /= weight_sum;
            }
            taps
        })
        .collect()
}

/// Exact coverage weights: destination sample `x` averages the source
/// interval `[x * scale, (x + 1) * scale)`.
fn area_contributions(src_len: usize, dst_len: usize, scale: f32) -> Vec<Taps> {
    (0..dst_len)
        .map(|x| {
            let x0 = x as f32 * scale;
            let x1 = ((x + 1) as f32 * scale).min(src_len as f32);
            let first = x0.floor() as usize;
            let last = (x1.ceil() as usize).min(src_len);

            let mut taps: Taps = (first..last)
                .map(|sx| {
                    let lo = (sx as f32).max(x0);
                    let hi = ((sx + 1) as f32).min(x1);
                    (sx, (hi - lo).max(0.0))
                })
                .filter(|&(_, w)| w > 0.0)
                .collect();

            let covered: f32 = taps.iter().map(|&(_, w)| w).sum();
            for tap in &mut taps {
                tap.1 /= covered;
            }
            taps
        })
        .collect()
}

/// Horizontal resize pass.
fn resize_horizontal(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    filter: Filter,
) -> Vec<f32> {
    let mut dst = vec![0.0f32; dst_w * src_h * channels];
    let taps = contributions(src_w, dst_w, filter);

    for y in 0..src_h {
        for (x, row_taps) in taps.iter().enumerate() {
            let dst_idx = (y * dst_w + x) * channels;
            for &(sx, w) in row_taps {
                let src_idx = (y * src_w + sx) * channels;
                for c in 0..channels {
                    dst[dst_idx + c] += src[src_idx + c] * w;
                }
            }
        }
    }

    dst
}

/// Vertical resize pass.
fn resize_vertical(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_h: usize,
    filter: Filter,
) -> Vec<f32> {
    let mut dst = vec![0.0f32; src_w * dst_h * channels];
    let taps = contributions(src_h, dst_h, filter);
    let row_len = src_w * channels;

    for (y, col_taps) in taps.iter().enumerate() {
        let dst_row = &mut dst[y * row_len..(y + 1) * row_len];
        for &(sy, w) in col_taps {
            let src_row = &src[sy * row_len..(sy + 1) * row_len];
            for (d, s) in dst_row.iter_mut().zip(src_row) {
                *d += s * w;
            }
        }
    }

    dst
}

/// Calculates aspect-preserving dimensions whose longer side is `max_side`.
///
/// The shorter side is rounded and never drops below 1. Dimensions already
/// within the bound are returned unchanged.
///
/// # Example
///
/// ```rust
/// use lumen_ops::resize::fit_longest_side;
///
/// assert_eq!(fit_longest_side(1920, 1080, 640), (640, 360));
/// assert_eq!(fit_longest_side(320, 240, 640), (320, 240));
/// ```
pub fn fit_longest_side(src_w: usize, src_h: usize, max_side: usize) -> (usize, usize) {
    let longest = src_w.max(src_h);
    if longest <= max_side || max_side == 0 {
        return (src_w, src_h);
    }
    let scale = max_side as f64 / longest as f64;
    let fit = |side: usize| {
        if side == longest {
            max_side
        } else {
            ((side as f64 * scale).round() as usize).clamp(1, max_side)
        }
    };
    (fit(src_w), fit(src_h))
}
