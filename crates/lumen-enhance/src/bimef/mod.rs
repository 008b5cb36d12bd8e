//! Bio-inspired multi-exposure fusion (BIMEF).
//!
//! A dim image is fused with a brighter synthetic exposure of itself:
//!
//! ```text
//! input -> IlluminationEstimator -> ExposureSynthesizer -> FusionEngine -> output
//!              (t)                    (J = g(input, k))     (t^mu blend)
//! ```
//!
//! Well-lit regions keep their original pixels; dark regions are taken from
//! the synthetic exposure, whose ratio `k` is chosen to maximize the
//! information content of the under-exposed part of the image.
//!
//! # Example
//!
//! ```rust
//! use lumen_core::PixelBuffer;
//! use lumen_enhance::bimef;
//!
//! let data: Vec<u8> = (0..16 * 16 * 3).map(|i| (i % 48) as u8).collect();
//! let dark = PixelBuffer::from_u8(16, 16, 3, data).unwrap();
//! let out = bimef(&dark, 0.5, -0.3293, 1.1258).unwrap();
//! assert_eq!(out.dimensions(), (16, 16));
//! ```

pub mod exposure;
pub mod fusion;
pub mod illumination;

pub use exposure::{
    CameraResponse, ExposureSynthesizer, ResponseParams, SyntheticExposure, solve_exposure_ratio,
};
pub use fusion::{FusionEngine, FusionMode, FusionParams, FusionWeights};
pub use illumination::{
    ILLUMINATION_FLOOR, IlluminationEstimator, IlluminationMap, IlluminationParams,
};

use crate::engine::Enhancer;
use exposure::{DEFAULT_RESPONSE_A, DEFAULT_RESPONSE_B};
use fusion::DEFAULT_MU;
use lumen_core::{Error, PixelBuffer, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Default working-resolution bound for BIMEF.
pub const BIMEF_MAX_DIMENSION: u32 = 512;

/// BIMEF parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BimefParams {
    /// Fusion weight exponent.
    pub mu: f32,
    /// Camera response coefficient `a`.
    pub a: f32,
    /// Camera response coefficient `b`.
    pub b: f32,
    /// Fixed exposure ratio; solved per image when absent.
    pub k: Option<f32>,
    /// Illumination smoothing.
    pub illumination: IlluminationParams,
    /// Blend strategy.
    pub fusion: FusionMode,
}

impl Default for BimefParams {
    fn default() -> Self {
        Self {
            mu: DEFAULT_MU,
            a: DEFAULT_RESPONSE_A,
            b: DEFAULT_RESPONSE_B,
            k: None,
            illumination: IlluminationParams::default(),
            fusion: FusionMode::default(),
        }
    }
}

impl BimefParams {
    /// Checks every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        if !(self.a.is_finite() && self.b.is_finite()) {
            return Err(Error::invalid_input(format!(
                "response coefficients must be finite, got a={} b={}",
                self.a, self.b
            )));
        }
        if let Some(k) = self.k {
            if !(k.is_finite() && k >= 1.0) {
                return Err(Error::invalid_input(format!(
                    "exposure ratio must be finite and >= 1, got {k}"
                )));
            }
        }
        self.illumination.validate()?;
        self.fusion_params().validate()
    }

    fn response_params(&self) -> ResponseParams {
        ResponseParams {
            a: self.a,
            b: self.b,
            k: self.k,
        }
    }

    fn fusion_params(&self) -> FusionParams {
        FusionParams {
            mu: self.mu,
            mode: self.fusion,
        }
    }
}

/// BIMEF engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bimef {
    params: BimefParams,
}

impl Bimef {
    /// Creates an engine with the given parameters.
    pub fn new(params: BimefParams) -> Self {
        Self { params }
    }

    /// Engine parameters.
    pub fn params(&self) -> &BimefParams {
        &self.params
    }

    /// Runs BIMEF on `buffer`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for a zero-dimension buffer or bad parameters
    /// - [`Error::NumericDegenerate`] for a black frame
    pub fn enhance(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        trace!(
            width = buffer.width(),
            height = buffer.height(),
            channels = buffer.channels(),
            "Bimef::enhance"
        );
        self.params.validate()?;
        buffer.ensure_not_empty()?;

        let illumination = IlluminationEstimator::new(self.params.illumination).estimate(buffer)?;
        let synthetic = ExposureSynthesizer::new(self.params.response_params())
            .synthesize(buffer, &illumination)?;
        debug!(k = synthetic.response().k(), "Synthetic exposure ready");

        FusionEngine::new(self.params.fusion_params()).fuse(
            buffer,
            synthetic.buffer(),
            &illumination,
        )
    }
}

impl Enhancer for Bimef {
    fn name(&self) -> &'static str {
        "bimef"
    }

    fn enhance(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        Bimef::enhance(self, buffer)
    }

    fn max_working_dimension(&self) -> u32 {
        BIMEF_MAX_DIMENSION
    }
}

/// Runs BIMEF with an automatically chosen exposure ratio.
pub fn bimef(buffer: &PixelBuffer, mu: f32, a: f32, b: f32) -> Result<PixelBuffer> {
    Bimef::new(BimefParams {
        mu,
        a,
        b,
        ..BimefParams::default()
    })
    .enhance(buffer)
}

/// Runs BIMEF with a fixed exposure ratio `k`.
///
/// # Errors
///
/// [`Error::InvalidInput`] unless `k` is finite and `>= 1`.
pub fn bimef_with_ratio(
    buffer: &PixelBuffer,
    k: f32,
    mu: f32,
    a: f32,
    b: f32,
) -> Result<PixelBuffer> {
    Bimef::new(BimefParams {
        mu,
        a,
        b,
        k: Some(k),
        ..BimefParams::default()
    })
    .enhance(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn dim_scene(w: u32, h: u32) -> PixelBuffer {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let base = if x < w / 3 { 180 } else { 12 + ((x * 5 + y * 3) % 30) };
                data.extend_from_slice(&[base as u8, (base * 9 / 10) as u8, (base * 8 / 10) as u8]);
            }
        }
        PixelBuffer::from_u8(w, h, 3, data).unwrap()
    }

    fn mean(buf: &PixelBuffer) -> f32 {
        let s = buf.to_f32_samples();
        s.iter().sum::<f32>() / s.len() as f32
    }

    #[test]
    fn test_preserves_shape() {
        let buf = dim_scene(24, 17);
        let out = bimef(&buf, 0.5, DEFAULT_RESPONSE_A, DEFAULT_RESPONSE_B).unwrap();
        assert_eq!(out.dimensions(), (24, 17));
        assert_eq!(out.channels(), 3);
        assert_eq!(out.sample_type(), buf.sample_type());
    }

    #[test]
    fn test_brightens_dark_regions() {
        let buf = dim_scene(30, 20);
        let out = bimef(&buf, 0.5, DEFAULT_RESPONSE_A, DEFAULT_RESPONSE_B).unwrap();
        assert!(mean(&out) > mean(&buf));
    }

    #[test]
    fn test_unit_ratio_is_identity() {
        let buf = dim_scene(20, 12);
        let out = bimef_with_ratio(&buf, 1.0, 0.5, DEFAULT_RESPONSE_A, DEFAULT_RESPONSE_B).unwrap();
        assert_eq!(out, buf);

        let data = (0..16).map(|i| i as f32 / 40.0 + 0.01).collect();
        let float = PixelBuffer::from_f32(4, 4, 1, data).unwrap();
        let out = bimef_with_ratio(&float, 1.0, 0.5, DEFAULT_RESPONSE_A, DEFAULT_RESPONSE_B);
        let out = out.unwrap();
        for (o, i) in out.as_f32().unwrap().iter().zip(float.as_f32().unwrap()) {
            assert_abs_diff_eq!(o, i, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_ratio_converges_to_input() {
        let buf = dim_scene(16, 16);
        let distance = |k: f32| {
            let out =
                bimef_with_ratio(&buf, k, 0.5, DEFAULT_RESPONSE_A, DEFAULT_RESPONSE_B).unwrap();
            (mean(&out) - mean(&buf)).abs()
        };
        assert!(distance(1.05) < distance(2.0));
        assert!(distance(2.0) < distance(5.0));
    }

    #[test]
    fn test_deterministic() {
        let buf = dim_scene(21, 15);
        let a = bimef(&buf, 0.5, DEFAULT_RESPONSE_A, DEFAULT_RESPONSE_B).unwrap();
        let b = bimef(&buf, 0.5, DEFAULT_RESPONSE_A, DEFAULT_RESPONSE_B).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_multiscale_mode() {
        let buf = dim_scene(24, 16);
        let engine = Bimef::new(BimefParams {
            fusion: FusionMode::MultiScale { levels: 3 },
            ..Default::default()
        });
        let out = engine.enhance(&buf).unwrap();
        assert_eq!(out.dimensions(), buf.dimensions());
        assert!(mean(&out) > mean(&buf));
    }

    #[test]
    fn test_errors() {
        let black = PixelBuffer::from_u8(8, 8, 3, vec![0; 192]).unwrap();
        assert!(bimef(&black, 0.5, DEFAULT_RESPONSE_A, DEFAULT_RESPONSE_B)
            .unwrap_err()
            .is_numeric_degenerate());

        let empty = PixelBuffer::from_u8(0, 0, 3, Vec::new()).unwrap();
        assert!(bimef(&empty, 0.5, DEFAULT_RESPONSE_A, DEFAULT_RESPONSE_B)
            .unwrap_err()
            .is_invalid_input());

        let buf = dim_scene(4, 4);
        assert!(bimef_with_ratio(&buf, 0.5, 0.5, DEFAULT_RESPONSE_A, DEFAULT_RESPONSE_B)
            .unwrap_err()
            .is_invalid_input());
    }
}
