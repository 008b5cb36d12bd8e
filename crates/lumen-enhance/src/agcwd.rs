//! Adaptive gamma correction with weighting distribution (AGCWD).
//!
//! Brightens dim images with a per-level gamma curve derived from the
//! image's own intensity histogram:
//!
//! ```text
//! pdf_w[l] = pdf_max * ((pdf[l] - pdf_min) / (pdf_max - pdf_min))^alpha
//! cdf_w    = cumulative sum of pdf_w / sum(pdf_w)
//! gamma[l] = 1 - cdf_w[l]
//! out      = 255 * (in / 255)^gamma[in]
//! ```
//!
//! Frequent levels receive small exponents and are lifted the most. Level 0
//! always maps to 0. An image with a single occupied level has no contrast to
//! redistribute and comes back unchanged.
//!
//! # Tone modes
//!
//! | Mode | Histogram of | Curve applied to |
//! |------|--------------|------------------|
//! | [`ToneMode::Luma`] | Rec.601 luma | luma; RGB scaled by `Y'/Y` |
//! | [`ToneMode::Value`] | HSV value | value; RGB scaled by `V'/V` |
//! | [`ToneMode::PerChannel`] | Rec.601 luma | every color channel |
//!
//! Single-channel buffers behave identically under every mode.
//!
//! # Example
//!
//! ```rust
//! use lumen_core::PixelBuffer;
//! use lumen_enhance::agcwd;
//!
//! let dark = PixelBuffer::from_u8(2, 2, 1, vec![0, 0, 255, 255]).unwrap();
//! let out = agcwd(&dark, 0.5).unwrap();
//! assert_eq!(out.as_u8().unwrap(), &[0, 0, 255, 255]);
//! ```

use crate::engine::Enhancer;
use crate::histogram::{HistogramStats, LEVELS};
use lumen_core::pixel::{color_channels, quantize_level};
use lumen_core::{Error, Intensity, PixelBuffer, Result, Samples};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Default working-resolution bound for AGCWD.
pub const AGCWD_MAX_DIMENSION: u32 = 1024;

/// Default weighting exponent.
pub const DEFAULT_ALPHA: f32 = 0.5;

/// How the gamma curve is applied to color pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMode {
    /// Curve on luma, color channels scaled by the luma ratio.
    #[default]
    Luma,
    /// Curve on HSV value, color channels scaled by the value ratio.
    Value,
    /// Curve on each color channel independently.
    PerChannel,
}

impl ToneMode {
    /// Intensity the histogram is built from.
    pub fn intensity(self) -> Intensity {
        match self {
            ToneMode::Value => Intensity::Value,
            ToneMode::Luma | ToneMode::PerChannel => Intensity::Luma,
        }
    }
}

/// AGCWD parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgcwdParams {
    /// Weighting exponent; smaller values flatten the weighted distribution.
    pub alpha: f32,
    /// Color handling.
    pub mode: ToneMode,
}

impl Default for AgcwdParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            mode: ToneMode::default(),
        }
    }
}

impl AgcwdParams {
    /// Checks `alpha` is finite and positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(Error::invalid_input(format!(
                "alpha must be finite and > 0, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Per-level gamma exponents.
#[derive(Debug, Clone, PartialEq)]
pub struct GammaMap {
    gamma: [f64; LEVELS],
}

impl GammaMap {
    /// Exponent 1 at every level.
    pub fn identity() -> Self {
        Self {
            gamma: [1.0; LEVELS],
        }
    }

    /// Builds the weighted-distribution gamma curve.
    ///
    /// Falls back to [`GammaMap::identity`] when at most one level is
    /// occupied.
    pub fn from_stats(stats: &HistogramStats, alpha: f32) -> Self {
        if stats.occupied_levels() <= 1 {
            return Self::identity();
        }

        let alpha = alpha as f64;
        let (pdf_min, pdf_max) = stats.pdf_min_max();
        let range = pdf_max - pdf_min;

        let mut weighted = [0.0f64; LEVELS];
        for (w, &p) in weighted.iter_mut().zip(stats.pdf()) {
            let term = if range > 0.0 {
                ((p - pdf_min) / range).max(0.0)
            } else {
                1.0
            };
            *w = pdf_max * term.powf(alpha);
        }

        let sum: f64 = weighted.iter().sum();
        let mut gamma = [1.0f64; LEVELS];
        if sum > 0.0 {
            let mut cdf = 0.0f64;
            for (g, w) in gamma.iter_mut().zip(&weighted) {
                cdf += w / sum;
                *g = (1.0 - cdf).max(0.0);
            }
            gamma[LEVELS - 1] = 0.0;
        }
        Self { gamma }
    }

    /// Exponent for one level.
    #[inline]
    pub fn gamma(&self, level: u8) -> f64 {
        self.gamma[level as usize]
    }

    /// All 256 exponents.
    #[inline]
    pub fn as_slice(&self) -> &[f64; LEVELS] {
        &self.gamma
    }

    /// 8-bit lookup table: `lut[l] = round(255 * (l / 255)^gamma[l])`, `lut[0] = 0`.
    pub fn lut(&self) -> [u8; LEVELS] {
        let mut lut = [0u8; LEVELS];
        for (level, out) in lut.iter_mut().enumerate().skip(1) {
            let v = (level as f64 / 255.0).powf(self.gamma[level]);
            *out = (v * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        lut
    }

    /// Applies the curve to one normalized sample: `v^gamma[level(v)]`.
    ///
    /// Samples that quantize to level 0 map to 0, matching [`lut`](Self::lut).
    #[inline]
    pub fn apply(&self, v: f32) -> f32 {
        let level = quantize_level(v);
        if level == 0 {
            return 0.0;
        }
        let v = v.min(1.0);
        (v as f64).powf(self.gamma[level as usize]) as f32
    }
}

/// AGCWD engine.
///
/// Holds only its parameters; every call derives its own histogram and
/// gamma curve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Agcwd {
    params: AgcwdParams,
}

impl Agcwd {
    /// Creates an engine with the given parameters.
    pub fn new(params: AgcwdParams) -> Self {
        Self { params }
    }

    /// Engine parameters.
    pub fn params(&self) -> &AgcwdParams {
        &self.params
    }

    /// Runs AGCWD on `buffer`.
    ///
    /// Output has the same dimensions, channels and sample type. Alpha is
    /// copied unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for a zero-dimension buffer or invalid alpha.
    pub fn enhance(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        trace!(
            width = buffer.width(),
            height = buffer.height(),
            channels = buffer.channels(),
            alpha = self.params.alpha,
            mode = ?self.params.mode,
            "Agcwd::enhance"
        );
        self.params.validate()?;
        buffer.ensure_not_empty()?;

        let stats = HistogramStats::compute_with(buffer, self.params.mode.intensity())?;
        let occupied = stats.occupied_levels();
        if occupied <= 1 {
            debug!(occupied, "Flat image, AGCWD is identity");
            return Ok(buffer.clone());
        }

        let map = GammaMap::from_stats(&stats, self.params.alpha);
        debug!(
            occupied,
            mean_level = stats.mean_level(),
            "AGCWD gamma curve built"
        );

        let channels = buffer.channels();
        let per_sample = channels == 1 || self.params.mode == ToneMode::PerChannel;
        match (buffer.samples(), per_sample) {
            (Samples::U8(src), true) => {
                let lut = map.lut();
                let color = color_channels(channels);
                let data = src
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| if i % channels < color { lut[s as usize] } else { s })
                    .collect();
                PixelBuffer::from_u8(buffer.width(), buffer.height(), channels, data)
            }
            (_, true) => {
                let color = color_channels(channels);
                let data = buffer
                    .to_f32_samples()
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| if i % channels < color { map.apply(s) } else { s })
                    .collect();
                buffer.with_f32_samples(data)
            }
            (_, false) => {
                let intensity = self.params.mode.intensity();
                let mut data = buffer.to_f32_samples();
                for px in data.chunks_exact_mut(channels) {
                    scale_pixel(&mut px[..3], intensity, &map);
                }
                buffer.with_f32_samples(data)
            }
        }
    }
}

/// Maps the pixel's intensity through the curve and scales its color
/// channels by the same ratio.
#[inline]
fn scale_pixel(rgb: &mut [f32], intensity: Intensity, map: &GammaMap) {
    let before = intensity.of(rgb);
    // Level 0 stays black: leave the pixel as it is
    if quantize_level(before) == 0 {
        return;
    }
    let ratio = map.apply(before) / before;
    for c in rgb.iter_mut() {
        *c = (*c * ratio).min(1.0);
    }
}

impl Enhancer for Agcwd {
    fn name(&self) -> &'static str {
        "agcwd"
    }

    fn enhance(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        Agcwd::enhance(self, buffer)
    }

    fn max_working_dimension(&self) -> u32 {
        AGCWD_MAX_DIMENSION
    }
}

/// Runs AGCWD with the given `alpha` and luma tone mode.
///
/// # Errors
///
/// [`Error::InvalidInput`] for a zero-dimension buffer or `alpha <= 0`.
pub fn agcwd(buffer: &PixelBuffer, alpha: f32) -> Result<PixelBuffer> {
    Agcwd::new(AgcwdParams {
        alpha,
        ..AgcwdParams::default()
    })
    .enhance(buffer)
}
