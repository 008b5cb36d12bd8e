//! Synthetic exposure from a camera response model.
//!
//! The beta-gamma response maps a pixel value `v` captured at exposure 1 to
//! the value the camera would have recorded at exposure ratio `k`:
//!
//! ```text
//! beta(k)  = exp((1 - k^a) * b)
//! gamma(k) = k^a
//! J        = clamp(beta * v^gamma, 0, 1)
//! ```
//!
//! With the default `a < 0`, `k > 1` brightens. `k = 1` is the identity.
//!
//! When `k` is not given it is chosen automatically: the under-exposed
//! pixels of a 50x50 thumbnail are collected and `k` maximizes the entropy
//! of their synthetic exposure.

use std::ops::RangeInclusive;

use super::illumination::IlluminationMap;
use lumen_core::pixel::color_channels;
use lumen_core::{Error, PixelBuffer, Result, SampleType};
use lumen_ops::resize::{resize_f32, Filter};
use tracing::{debug, trace};

/// Default response curve coefficient `a`.
pub const DEFAULT_RESPONSE_A: f32 = -0.3293;

/// Default response curve coefficient `b`.
pub const DEFAULT_RESPONSE_B: f32 = 1.1258;

/// Range searched for the exposure ratio.
pub const EXPOSURE_RATIO_RANGE: RangeInclusive<f32> = 1.0..=7.0;

/// Side of the thumbnail used to pick `k`.
const RATIO_SAMPLE_SIDE: usize = 50;

/// Illumination below this marks a pixel as under-exposed.
const UNDEREXPOSED_BELOW: f32 = 0.5;

/// Golden-section search stops once the bracket is this narrow.
const RATIO_TOLERANCE: f64 = 1e-3;

/// Camera response with a resolved exposure ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraResponse {
    a: f32,
    b: f32,
    k: f32,
}

impl CameraResponse {
    /// Creates a response for exposure ratio `k`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if `a` or `b` is not finite, or `k` is not a
    /// finite value `>= 1`.
    pub fn new(a: f32, b: f32, k: f32) -> Result<Self> {
        if !(a.is_finite() && b.is_finite()) {
            return Err(Error::invalid_input(format!(
                "response coefficients must be finite, got a={a} b={b}"
            )));
        }
        check_ratio(k)?;
        Ok(Self { a, b, k })
    }

    /// Coefficient `a`.
    #[inline]
    pub fn a(&self) -> f32 {
        self.a
    }

    /// Coefficient `b`.
    #[inline]
    pub fn b(&self) -> f32 {
        self.b
    }

    /// Exposure ratio.
    #[inline]
    pub fn k(&self) -> f32 {
        self.k
    }

    /// `exp((1 - k^a) * b)`.
    #[inline]
    pub fn beta(&self) -> f32 {
        ((1.0 - self.k.powf(self.a)) * self.b).exp()
    }

    /// `k^a`.
    #[inline]
    pub fn gamma(&self) -> f32 {
        self.k.powf(self.a)
    }

    /// Synthetic value for one normalized sample.
    #[inline]
    pub fn apply(&self, v: f32) -> f32 {
        synthetic_value(v, self.beta(), self.gamma())
    }
}

#[inline]
fn synthetic_value(v: f32, beta: f32, gamma: f32) -> f32 {
    let out = beta * v.max(0.0).powf(gamma);
    if out.is_nan() { 0.0 } else { out.clamp(0.0, 1.0) }
}

fn check_ratio(k: f32) -> Result<()> {
    if !(k.is_finite() && k >= 1.0) {
        return Err(Error::invalid_input(format!(
            "exposure ratio must be finite and >= 1, got {k}"
        )));
    }
    Ok(())
}

/// Response coefficients plus an optional fixed exposure ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseParams {
    /// Coefficient `a`.
    pub a: f32,
    /// Coefficient `b`.
    pub b: f32,
    /// Fixed exposure ratio; `None` picks one automatically.
    pub k: Option<f32>,
}

impl Default for ResponseParams {
    fn default() -> Self {
        Self {
            a: DEFAULT_RESPONSE_A,
            b: DEFAULT_RESPONSE_B,
            k: None,
        }
    }
}

/// A synthetic exposure and the response that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticExposure {
    response: CameraResponse,
    buffer: PixelBuffer,
}

impl SyntheticExposure {
    /// Response used.
    #[inline]
    pub fn response(&self) -> &CameraResponse {
        &self.response
    }

    /// Float buffer with the source's dimensions and channels.
    #[inline]
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Consumes and returns the buffer.
    #[inline]
    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }
}

/// Produces the brighter virtual exposure fused with the original.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExposureSynthesizer {
    params: ResponseParams,
}

impl ExposureSynthesizer {
    /// Creates a synthesizer.
    pub fn new(params: ResponseParams) -> Self {
        Self { params }
    }

    /// Resolves the camera response for `buffer`, solving for `k` when the
    /// parameters leave it open.
    pub fn resolve(
        &self,
        buffer: &PixelBuffer,
        illumination: &IlluminationMap,
    ) -> Result<CameraResponse> {
        let ResponseParams { a, b, k } = self.params;
        let k = match k {
            Some(k) => k,
            None => {
                illumination.ensure_matches(buffer)?;
                let samples = underexposed_samples(buffer, illumination)?;
                let k = solve_exposure_ratio(&samples, a, b, EXPOSURE_RATIO_RANGE);
                debug!(samples = samples.len(), k, "Exposure ratio solved");
                k
            }
        };
        CameraResponse::new(a, b, k)
    }

    /// Synthesizes the exposure of `buffer`. Alpha is copied.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for a zero-dimension buffer, an illumination
    /// map of different size or invalid response parameters.
    pub fn synthesize(
        &self,
        buffer: &PixelBuffer,
        illumination: &IlluminationMap,
    ) -> Result<SyntheticExposure> {
        trace!(
            width = buffer.width(),
            height = buffer.height(),
            k = ?self.params.k,
            "ExposureSynthesizer::synthesize"
        );
        buffer.ensure_not_empty()?;
        illumination.ensure_matches(buffer)?;

        let response = self.resolve(buffer, illumination)?;
        let (beta, gamma) = (response.beta(), response.gamma());
        let channels = buffer.channels();
        let color = color_channels(channels);

        let mut data = buffer.to_f32_samples();
        for px in data.chunks_exact_mut(channels) {
            for v in &mut px[..color] {
                *v = synthetic_value(*v, beta, gamma);
            }
        }
        let synthetic = PixelBuffer::from_normalized(
            buffer.width(),
            buffer.height(),
            channels,
            SampleType::F32,
            data,
        )?;
        Ok(SyntheticExposure {
            response,
            buffer: synthetic,
        })
    }
}

/// Geometric-mean brightness of the under-exposed pixels of a thumbnail.
fn underexposed_samples(buffer: &PixelBuffer, illumination: &IlluminationMap) -> Result<Vec<f32>> {
    let (w, h) = (buffer.width() as usize, buffer.height() as usize);
    let channels = buffer.channels();
    let side = RATIO_SAMPLE_SIDE;

    let image = resize_f32(&buffer.to_f32_samples(), w, h, channels, side, side, Filter::Bicubic)?;
    let light = resize_f32(illumination.as_slice(), w, h, 1, side, side, Filter::Bicubic)?;

    let color = color_channels(channels);
    Ok(image
        .chunks_exact(channels)
        .zip(&light)
        .filter(|&(_, &t)| t < UNDEREXPOSED_BELOW)
        .map(|(px, _)| geometric_mean(&px[..color]))
        .collect())
}

#[inline]
fn geometric_mean(color: &[f32]) -> f32 {
    match color {
        [gray] => gray.max(0.0),
        _ => color
            .iter()
            .map(|v| v.max(0.0))
            .product::<f32>()
            .powf(1.0 / color.len() as f32),
    }
}

/// Shannon entropy (bits) of the 256-level histogram of `values`.
pub fn entropy(values: impl IntoIterator<Item = f32>) -> f64 {
    let mut histogram = [0u64; 256];
    let mut total = 0u64;
    for v in values {
        histogram[lumen_core::quantize_level(v) as usize] += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    histogram
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

/// Exposure ratio in `bounds` maximizing the entropy of the synthetic
/// exposure of `samples`.
///
/// Returns 1 for an empty sample set. The search is golden-section with a
/// fixed evaluation order, so equal inputs give bit-equal results.
///
/// ```rust
/// use lumen_enhance::bimef::exposure::{solve_exposure_ratio, EXPOSURE_RATIO_RANGE};
///
/// assert_eq!(solve_exposure_ratio(&[], -0.3293, 1.1258, EXPOSURE_RATIO_RANGE), 1.0);
///
/// let dark: Vec<f32> = (0..200).map(|i| i as f32 / 2000.0).collect();
/// let k = solve_exposure_ratio(&dark, -0.3293, 1.1258, EXPOSURE_RATIO_RANGE);
/// assert!(k > 1.0 && k <= 7.0);
/// ```
pub fn solve_exposure_ratio(samples: &[f32], a: f32, b: f32, bounds: RangeInclusive<f32>) -> f32 {
    if samples.is_empty() {
        return 1.0;
    }
    let score = |k: f64| {
        let response = CameraResponse { a, b, k: k as f32 };
        let (beta, gamma) = (response.beta(), response.gamma());
        entropy(samples.iter().map(|&v| synthetic_value(v, beta, gamma)))
    };

    let inv_phi = (5.0f64.sqrt() - 1.0) / 2.0;
    let (mut lo, mut hi) = (*bounds.start() as f64, *bounds.end() as f64);
    let mut c = hi - inv_phi * (hi - lo);
    let mut d = lo + inv_phi * (hi - lo);
    let (mut fc, mut fd) = (score(c), score(d));

    while hi - lo > RATIO_TOLERANCE {
        if fc >= fd {
            hi = d;
            d = c;
            fd = fc;
            c = hi - inv_phi * (hi - lo);
            fc = score(c);
        } else {
            lo = c;
            c = d;
            fc = fd;
            d = lo + inv_phi * (hi - lo);
            fd = score(d);
        }
    }
    ((lo + hi) / 2.0) as f32
}
