//! Scene illumination estimate.
//!
//! The initial estimate is the brightest color channel of each pixel. It is
//! then smoothed with structure-preserving texture smoothing: fine texture is
//! flattened while strong edges survive, which keeps halos out of the fused
//! result.
//!
//! Smoothing solves
//!
//! ```text
//! (I + lambda * L_W) S = t
//! ```
//!
//! where `L_W` is the grid Laplacian with texture weights
//! `W = 1 / (|box(d)| * |d| + sharpness)` for forward differences `d` in each
//! direction. Regions whose local differences agree in sign (real edges)
//! receive small weights and are not smoothed across.

use lumen_core::pixel::color_channels;
use lumen_core::{Error, PixelBuffer, Result};
use lumen_ops::filter::{box_sum_h, box_sum_v, forward_diff_h, forward_diff_v};
use lumen_ops::resize::{resize_f32, Filter};
use lumen_ops::solver::{solve_weighted_laplacian, SolverOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Smallest illumination value; keeps later divisions and powers finite.
pub const ILLUMINATION_FLOOR: f32 = 1e-3;

/// Below this side length the half-resolution pass is skipped.
const MIN_HALF_RES_SIDE: u32 = 4;

/// Texture smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IlluminationParams {
    /// Smoothness strength.
    pub lambda: f32,
    /// Box window length for the texture weights.
    pub sigma: usize,
    /// Keeps the texture weights finite on flat regions.
    pub sharpness: f32,
    /// Smooth at half resolution and resample back.
    pub half_resolution: bool,
    /// Relative residual at which the solve stops.
    pub tolerance: f32,
    /// Solver iteration cap.
    pub max_iterations: usize,
}

impl Default for IlluminationParams {
    fn default() -> Self {
        Self {
            lambda: 0.5,
            sigma: 5,
            sharpness: 1e-3,
            half_resolution: true,
            tolerance: 1e-4,
            max_iterations: 500,
        }
    }
}

impl IlluminationParams {
    /// Checks every field is in range.
    pub fn validate(&self) -> Result<()> {
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return Err(Error::invalid_input(format!(
                "illumination lambda must be finite and >= 0, got {}",
                self.lambda
            )));
        }
        if self.sigma == 0 {
            return Err(Error::invalid_input("illumination sigma must be >= 1"));
        }
        if !(self.sharpness.is_finite() && self.sharpness > 0.0) {
            return Err(Error::invalid_input(format!(
                "illumination sharpness must be finite and > 0, got {}",
                self.sharpness
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::invalid_input(format!(
                "solver tolerance must be finite and > 0, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::invalid_input("solver max_iterations must be >= 1"));
        }
        Ok(())
    }
}

/// Per-pixel illumination in `[ILLUMINATION_FLOOR, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IlluminationMap {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl IlluminationMap {
    /// Wraps a plane, clamping it to `[ILLUMINATION_FLOOR, 1]`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if `data.len() != width * height` or a
    /// dimension is zero.
    pub fn from_plane(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_input(format!(
                "zero-dimension illumination map {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::invalid_input(format!(
                "illumination map expects {expected} values, got {}",
                data.len()
            )));
        }
        let data = data.into_iter().map(clamp_illumination).collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Returns the width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Row-major values.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Value at `(x, y)`.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Fails with [`Error::InvalidInput`] unless `buffer` has the same
    /// dimensions.
    pub fn ensure_matches(&self, buffer: &PixelBuffer) -> Result<()> {
        if self.dimensions() != buffer.dimensions() {
            return Err(Error::invalid_input(format!(
                "illumination map is {}x{}, buffer is {}x{}",
                self.width,
                self.height,
                buffer.width(),
                buffer.height()
            )));
        }
        Ok(())
    }
}

#[inline]
fn clamp_illumination(v: f32) -> f32 {
    if v.is_nan() {
        ILLUMINATION_FLOOR
    } else {
        v.clamp(ILLUMINATION_FLOOR, 1.0)
    }
}

/// Estimates an [`IlluminationMap`] from an image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IlluminationEstimator {
    params: IlluminationParams,
}

impl IlluminationEstimator {
    /// Creates an estimator.
    pub fn new(params: IlluminationParams) -> Self {
        Self { params }
    }

    /// Estimates illumination at the resolution of `buffer`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for a zero-dimension buffer or bad parameters
    /// - [`Error::NumericDegenerate`] if the whole map sits at
    ///   [`ILLUMINATION_FLOOR`] (a black frame)
    pub fn estimate(&self, buffer: &PixelBuffer) -> Result<IlluminationMap> {
        let (width, height) = buffer.dimensions();
        trace!(width, height, "IlluminationEstimator::estimate");
        self.params.validate()?;
        buffer.ensure_not_empty()?;

        let initial = max_channel_plane(buffer);
        let (w, h) = (width as usize, height as usize);

        let half = self.params.half_resolution
            && width >= MIN_HALF_RES_SIDE
            && height >= MIN_HALF_RES_SIDE;
        let smoothed = if half {
            let (sw, sh) = (w.div_ceil(2), h.div_ceil(2));
            let small = resize_f32(&initial, w, h, 1, sw, sh, Filter::Bicubic)?;
            let small = self.smooth(&small, sw, sh)?;
            resize_f32(&small, sw, sh, 1, w, h, Filter::Bicubic)?
        } else {
            self.smooth(&initial, w, h)?
        };

        let map = IlluminationMap::from_plane(width, height, smoothed)?;
        if map.data.iter().all(|&v| v <= ILLUMINATION_FLOOR) {
            return Err(Error::numeric_degenerate(
                "illumination is at its floor everywhere",
            ));
        }
        Ok(map)
    }

    /// Texture-aware smoothing of one plane.
    fn smooth(&self, plane: &[f32], width: usize, height: usize) -> Result<Vec<f32>> {
        let p = &self.params;
        let wx = texture_weights(plane, width, height, p.sigma, p.sharpness, Axis::Horizontal)?;
        let wy = texture_weights(plane, width, height, p.sigma, p.sharpness, Axis::Vertical)?;

        let options = SolverOptions {
            tolerance: p.tolerance,
            max_iterations: p.max_iterations,
        };
        let solution =
            solve_weighted_laplacian(plane, width, height, &wx, &wy, p.lambda, &options)?;
        debug!(
            width,
            height,
            iterations = solution.iterations,
            converged = solution.converged,
            "Illumination smoothed"
        );
        Ok(solution.data)
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// `1 / (|box(d)| * |d| + sharpness)` along one axis.
fn texture_weights(
    plane: &[f32],
    width: usize,
    height: usize,
    sigma: usize,
    sharpness: f32,
    axis: Axis,
) -> Result<Vec<f32>> {
    let (diff, summed) = match axis {
        Axis::Horizontal => {
            let d = forward_diff_h(plane, width, height)?;
            let s = box_sum_h(&d, width, height, sigma)?;
            (d, s)
        }
        Axis::Vertical => {
            let d = forward_diff_v(plane, width, height)?;
            let s = box_sum_v(&d, width, height, sigma)?;
            (d, s)
        }
    };
    Ok(diff
        .iter()
        .zip(&summed)
        .map(|(d, s)| 1.0 / (s.abs() * d.abs() + sharpness))
        .collect())
}

/// Brightest color channel per pixel, normalized.
fn max_channel_plane(buffer: &PixelBuffer) -> Vec<f32> {
    let channels = buffer.channels();
    let color = color_channels(channels);
    buffer
        .to_f32_samples()
        .chunks_exact(channels)
        .map(|px| px[..color].iter().copied().fold(0.0f32, f32::max))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_image(w: u32, h: u32) -> PixelBuffer {
        let data = (0..h)
            .flat_map(|_| (0..w).map(move |x| if x < w / 2 { 0.1 } else { 0.9 }))
            .collect();
        PixelBuffer::from_f32(w, h, 1, data).unwrap()
    }

    #[test]
    fn test_same_size_and_positive() {
        let data: Vec<u8> = (0..21 * 13 * 3).map(|i| (i * 31 % 97) as u8).collect();
        let buf = PixelBuffer::from_u8(21, 13, 3, data).unwrap();
        let map = IlluminationEstimator::default().estimate(&buf).unwrap();
        assert_eq!(map.dimensions(), (21, 13));
        assert!(map.as_slice().iter().all(|&v| v >= ILLUMINATION_FLOOR && v <= 1.0));
    }

    #[test]
    fn test_constant_image() {
        let buf = PixelBuffer::filled_f32(8, 8, &[0.2, 0.4, 0.3]).unwrap();
        let map = IlluminationEstimator::default().estimate(&buf).unwrap();
        for &v in map.as_slice() {
            assert!((v - 0.4).abs() < 1e-3);
        }
    }

    #[test]
    fn test_edges_preserved() {
        let buf = step_image(32, 16);
        let map = IlluminationEstimator::default().estimate(&buf).unwrap();
        let left = map.get(12, 8);
        let right = map.get(19, 8);
        assert!(left < 0.3, "left = {left}");
        assert!(right > 0.7, "right = {right}");
    }

    #[test]
    fn test_full_resolution_path() {
        let params = IlluminationParams {
            half_resolution: false,
            ..Default::default()
        };
        let map = IlluminationEstimator::new(params).estimate(&step_image(6, 3)).unwrap();
        assert_eq!(map.dimensions(), (6, 3));
    }

    #[test]
    fn test_tiny_image_skips_half_resolution() {
        let buf = PixelBuffer::from_u8(3, 1, 1, vec![10, 200, 90]).unwrap();
        let map = IlluminationEstimator::default().estimate(&buf).unwrap();
        assert_eq!(map.dimensions(), (3, 1));
    }

    #[test]
    fn test_black_frame_is_degenerate() {
        let buf = PixelBuffer::from_u8(8, 8, 3, vec![0; 192]).unwrap();
        let err = IlluminationEstimator::default().estimate(&buf).unwrap_err();
        assert!(err.is_numeric_degenerate());
    }

    #[test]
    fn test_invalid_params() {
        let params = IlluminationParams {
            sigma: 0,
            ..Default::default()
        };
        let buf = step_image(4, 4);
        assert!(IlluminationEstimator::new(params).estimate(&buf).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_huge_sigma_finishes() {
        let params = IlluminationParams {
            sigma: 4_000_000_000,
            ..Default::default()
        };
        let map = IlluminationEstimator::new(params).estimate(&step_image(16, 8)).unwrap();
        assert_eq!(map.dimensions(), (16, 8));
        assert!(map.as_slice().iter().all(|&v| v >= ILLUMINATION_FLOOR));
    }

    #[test]
    fn test_map_dimension_check() {
        let map = IlluminationMap::from_plane(2, 2, vec![0.5; 4]).unwrap();
        let buf = PixelBuffer::filled_u8(2, 3, &[1]).unwrap();
        assert!(map.ensure_matches(&buf).unwrap_err().is_invalid_input());
        assert!(IlluminationMap::from_plane(2, 2, vec![0.5; 3]).is_err());
    }
}
