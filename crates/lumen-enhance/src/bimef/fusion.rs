//! Illumination-weighted fusion of the original and synthetic exposures.
//!
//! Well-lit pixels keep the original; dark pixels take the synthetic
//! exposure. The weight is `w = t^mu` for illumination `t`.
//!
//! [`FusionMode::MultiScale`] blends Laplacian pyramids of the two exposures
//! with a Gaussian pyramid of the weights instead of blending pixels
//! directly, which hides seams where the weight changes quickly.

use super::illumination::IlluminationMap;
use lumen_core::pixel::color_channels;
use lumen_core::{Error, PixelBuffer, Result};
use lumen_ops::resize::{resize_f32, Filter};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Default weight exponent.
pub const DEFAULT_MU: f32 = 0.5;

/// How the exposures are blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FusionMode {
    /// Per-pixel weighted average.
    #[default]
    Weighted,
    /// Laplacian pyramid blend with at most `levels` levels.
    MultiScale {
        /// Pyramid depth; 1 is the same as `Weighted`.
        levels: usize,
    },
}

impl FusionMode {
    /// Checks the pyramid depth.
    pub fn validate(&self) -> Result<()> {
        if let FusionMode::MultiScale { levels: 0 } = self {
            return Err(Error::invalid_input("multi-scale fusion needs at least one level"));
        }
        Ok(())
    }
}

/// Fusion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
    /// Weight exponent.
    pub mu: f32,
    /// Blend strategy.
    pub mode: FusionMode,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            mu: DEFAULT_MU,
            mode: FusionMode::default(),
        }
    }
}

impl FusionParams {
    /// Checks `mu` is finite and non-negative and the mode is valid.
    pub fn validate(&self) -> Result<()> {
        if !(self.mu.is_finite() && self.mu >= 0.0) {
            return Err(Error::invalid_input(format!(
                "mu must be finite and >= 0, got {}",
                self.mu
            )));
        }
        self.mode.validate()
    }
}

/// Per-pixel weight of the original exposure, in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionWeights {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl FusionWeights {
    /// `w = t^mu`.
    pub fn from_illumination(illumination: &IlluminationMap, mu: f32) -> Self {
        let data = illumination
            .as_slice()
            .iter()
            .map(|&t| t.powf(mu).clamp(0.0, 1.0))
            .collect();
        Self {
            width: illumination.width(),
            height: illumination.height(),
            data,
        }
    }

    /// Returns `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Row-major weights.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Blends two exposures under illumination weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FusionEngine {
    params: FusionParams,
}

impl FusionEngine {
    /// Creates a fusion engine.
    pub fn new(params: FusionParams) -> Self {
        Self { params }
    }

    /// Fuses `original` and `synthetic`.
    ///
    /// The result has the dimensions, channels and sample type of `original`
    /// and takes alpha from it.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if the three inputs differ in size or the two
    /// buffers differ in channel count.
    pub fn fuse(
        &self,
        original: &PixelBuffer,
        synthetic: &PixelBuffer,
        illumination: &IlluminationMap,
    ) -> Result<PixelBuffer> {
        trace!(
            width = original.width(),
            height = original.height(),
            mu = self.params.mu,
            mode = ?self.params.mode,
            "FusionEngine::fuse"
        );
        self.params.validate()?;
        original.ensure_not_empty()?;
        original.ensure_same_shape(synthetic)?;
        illumination.ensure_matches(original)?;

        let weights = FusionWeights::from_illumination(illumination, self.params.mu);
        let channels = original.channels();
        let color = color_channels(channels);
        let orig = original.to_f32_samples();
        let synth = synthetic.to_f32_samples();

        let fused = match self.params.mode {
            FusionMode::Weighted => blend(&orig, &synth, weights.as_slice(), channels, color),
            FusionMode::MultiScale { levels } => {
                let (w, h) = (original.width() as usize, original.height() as usize);
                let mut out =
                    pyramid_blend(&orig, &synth, weights.as_slice(), w, h, channels, levels)?;
                // Pyramids carry every channel; alpha comes from the original
                if color < channels {
                    for (o, s) in out.chunks_exact_mut(channels).zip(orig.chunks_exact(channels)) {
                        o[color..].copy_from_slice(&s[color..]);
                    }
                }
                out
            }
        };
        original.with_f32_samples(fused)
    }
}

/// Per-pixel `w * a + (1 - w) * b` on the color channels, alpha from `a`.
fn blend(a: &[f32], b: &[f32], weights: &[f32], channels: usize, color: usize) -> Vec<f32> {
    let mut out = a.to_vec();
    for ((o, s), &w) in out
        .chunks_exact_mut(channels)
        .zip(b.chunks_exact(channels))
        .zip(weights)
    {
        for c in 0..color {
            o[c] = w * o[c] + (1.0 - w) * s[c];
        }
    }
    out
}

/// One pyramid level.
struct Level {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

/// Successively halved copies, stopping at `levels` or once a side is < 2.
fn gaussian_pyramid(
    data: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    levels: usize,
) -> Result<Vec<Level>> {
    let mut pyramid = vec![Level {
        data: data.to_vec(),
        width,
        height,
    }];
    while pyramid.len() < levels {
        let Some(last) = pyramid.last() else { break };
        if last.width < 2 || last.height < 2 {
            break;
        }
        let (w, h) = (last.width.div_ceil(2), last.height.div_ceil(2));
        let down = resize_f32(
            &last.data,
            last.width,
            last.height,
            channels,
            w,
            h,
            Filter::Bilinear,
        )?;
        pyramid.push(Level {
            data: down,
            width: w,
            height: h,
        });
    }
    Ok(pyramid)
}

/// Band-pass levels `g[i] - up(g[i + 1])`; the last level stays low-pass.
fn laplacian_pyramid(gaussian: &[Level], channels: usize) -> Result<Vec<Vec<f32>>> {
    let mut bands: Vec<Vec<f32>> = Vec::with_capacity(gaussian.len());
    for pair in gaussian.windows(2) {
        let (fine, coarse) = (&pair[0], &pair[1]);
        let up = upsample(coarse, fine.width, fine.height, channels)?;
        bands.push(fine.data.iter().zip(&up).map(|(f, u)| f - u).collect());
    }
    if let Some(last) = gaussian.last() {
        bands.push(last.data.clone());
    }
    Ok(bands)
}

fn upsample(level: &Level, width: usize, height: usize, channels: usize) -> Result<Vec<f32>> {
    Ok(resize_f32(
        &level.data,
        level.width,
        level.height,
        channels,
        width,
        height,
        Filter::Bilinear,
    )?)
}

fn pyramid_blend(
    a: &[f32],
    b: &[f32],
    weights: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    levels: usize,
) -> Result<Vec<f32>> {
    let ga = gaussian_pyramid(a, width, height, channels, levels)?;
    let gb = gaussian_pyramid(b, width, height, channels, levels)?;
    let gw = gaussian_pyramid(weights, width, height, 1, levels)?;
    let la = laplacian_pyramid(&ga, channels)?;
    let lb = laplacian_pyramid(&gb, channels)?;

    let blended: Vec<Level> = la
        .iter()
        .zip(&lb)
        .zip(&gw)
        .map(|((band_a, band_b), w)| Level {
            data: blend(band_a, band_b, &w.data, channels, channels),
            width: w.width,
            height: w.height,
        })
        .collect();

    // Collapse from the coarsest level up
    let Some((coarsest, finer)) = blended.split_last() else {
        return Ok(a.to_vec());
    };
    let mut acc = Level {
        data: coarsest.data.clone(),
        width: coarsest.width,
        height: coarsest.height,
    };
    for band in finer.iter().rev() {
        let up = upsample(&acc, band.width, band.height, channels)?;
        acc = Level {
            data: band.data.iter().zip(&up).map(|(d, u)| d + u).collect(),
            width: band.width,
            height: band.height,
        };
    }
    Ok(acc.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn gradient(w: u32, h: u32, channels: usize) -> PixelBuffer {
        let n = (w * h) as usize * channels;
        let data = (0..n).map(|i| (i % 17) as f32 / 16.0).collect();
        PixelBuffer::from_f32(w, h, channels, data).unwrap()
    }

    fn light(w: u32, h: u32, t: f32) -> IlluminationMap {
        IlluminationMap::from_plane(w, h, vec![t; (w * h) as usize]).unwrap()
    }

    #[test]
    fn test_weights_monotonic() {
        let map = IlluminationMap::from_plane(4, 1, vec![0.01, 0.2, 0.5, 1.0]).unwrap();
        let w = FusionWeights::from_illumination(&map, 0.5);
        assert!(w.as_slice().windows(2).all(|p| p[0] < p[1]));
        assert_abs_diff_eq!(w.as_slice()[3], 1.0);
        assert_abs_diff_eq!(w.as_slice()[2], 0.5f32.sqrt());
    }

    #[test]
    fn test_weighted_blend() {
        let a = PixelBuffer::filled_f32(2, 2, &[0.2]).unwrap();
        let b = PixelBuffer::filled_f32(2, 2, &[0.6]).unwrap();
        // w = 0.25^0.5 = 0.5
        let out = FusionEngine::default().fuse(&a, &b, &light(2, 2, 0.25)).unwrap();
        for &v in out.as_f32().unwrap() {
            assert_abs_diff_eq!(v, 0.4, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_full_light_keeps_original() {
        let a = gradient(5, 3, 3);
        let b = PixelBuffer::filled_f32(5, 3, &[1.0, 1.0, 1.0]).unwrap();
        let out = FusionEngine::default().fuse(&a, &b, &light(5, 3, 1.0)).unwrap();
        assert_eq!(out, a);
    }

    #[test]
    fn test_multiscale_equal_exposures_is_identity() {
        let a = gradient(13, 9, 3);
        let engine = FusionEngine::new(FusionParams {
            mu: 0.5,
            mode: FusionMode::MultiScale { levels: 4 },
        });
        let plane = (0..117).map(|i| (i % 10) as f32 / 10.0).collect();
        let map = IlluminationMap::from_plane(13, 9, plane).unwrap();
        let out = engine.fuse(&a, &a, &map).unwrap();
        for (o, i) in out.as_f32().unwrap().iter().zip(a.as_f32().unwrap()) {
            assert_abs_diff_eq!(o, i, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_multiscale_between_inputs() {
        let a = PixelBuffer::filled_f32(16, 16, &[0.1]).unwrap();
        let b = PixelBuffer::filled_f32(16, 16, &[0.7]).unwrap();
        let engine = FusionEngine::new(FusionParams {
            mu: 0.5,
            mode: FusionMode::MultiScale { levels: 3 },
        });
        let out = engine.fuse(&a, &b, &light(16, 16, 0.3)).unwrap();
        for &v in out.as_f32().unwrap() {
            assert!(v > 0.1 && v < 0.7);
        }
    }

    #[test]
    fn test_alpha_from_original() {
        let a = PixelBuffer::filled_u8(4, 4, &[10, 20, 30, 99]).unwrap();
        let b = PixelBuffer::filled_f32(4, 4, &[0.9, 0.9, 0.9, 0.0]).unwrap();
        for mode in [FusionMode::Weighted, FusionMode::MultiScale { levels: 3 }] {
            let engine = FusionEngine::new(FusionParams { mu: 0.5, mode });
            let out = engine.fuse(&a, &b, &light(4, 4, 0.1)).unwrap();
            assert_eq!(out.sample_type(), lumen_core::SampleType::U8);
            assert!(out.as_u8().unwrap().chunks(4).all(|px| px[3] == 99));
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let a = gradient(4, 4, 3);
        let b = gradient(4, 4, 1);
        let err = FusionEngine::default().fuse(&a, &b, &light(4, 4, 0.5)).unwrap_err();
        assert!(err.is_invalid_input());

        let err = FusionEngine::default().fuse(&a, &a, &light(4, 3, 0.5)).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_zero_levels_rejected() {
        let a = gradient(4, 4, 1);
        let engine = FusionEngine::new(FusionParams {
            mu: 0.5,
            mode: FusionMode::MultiScale { levels: 0 },
        });
        assert!(engine.fuse(&a, &a, &light(4, 4, 0.5)).unwrap_err().is_invalid_input());
    }
}
