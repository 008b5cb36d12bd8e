//! Intensity extraction and sample quantization.
//!
//! Both enhancement engines reduce a color pixel to a single brightness
//! value before doing anything else. The histogram engine bins that value
//! into 256 levels; the fusion engine uses it as the starting point of its
//! illumination estimate.
//!
//! Samples handled here are always normalized floats in `[0, 1]`; see
//! [`crate::PixelBuffer::to_f32_samples`].

/// Rec.601 luma coefficient for the red channel.
///
/// Used in the 8-bit video luma formula: `Y = 0.299*R + 0.587*G + 0.114*B`
pub const REC601_LUMA_R: f32 = 0.299;

/// Rec.601 luma coefficient for the green channel.
pub const REC601_LUMA_G: f32 = 0.587;

/// Rec.601 luma coefficient for the blue channel.
pub const REC601_LUMA_B: f32 = 0.114;

/// Rec.601 luma coefficients as an array `[R, G, B]`.
pub const REC601_LUMA: [f32; 3] = [REC601_LUMA_R, REC601_LUMA_G, REC601_LUMA_B];

/// Highest 8-bit intensity level.
pub const MAX_LEVEL: u8 = 255;

/// Computes Rec.601 luma from normalized RGB.
///
/// # Example
/// ```
/// use lumen_core::pixel::luma_rec601;
/// let y = luma_rec601([0.5, 0.5, 0.5]);
/// assert!((y - 0.5).abs() < 1e-6);
/// ```
#[inline]
pub fn luma_rec601(rgb: [f32; 3]) -> f32 {
    rgb[0] * REC601_LUMA_R + rgb[1] * REC601_LUMA_G + rgb[2] * REC601_LUMA_B
}

/// HSV value (the largest color component).
#[inline]
pub fn value(rgb: [f32; 3]) -> f32 {
    rgb[0].max(rgb[1]).max(rgb[2])
}

/// Maps a normalized sample to its nearest 8-bit level.
///
/// Values outside `[0, 1]` (and NaN) are clamped first.
///
/// ```
/// use lumen_core::pixel::quantize_level;
/// assert_eq!(quantize_level(0.0), 0);
/// assert_eq!(quantize_level(128.0 / 255.0), 128);
/// assert_eq!(quantize_level(3.0), 255);
/// ```
#[inline]
pub fn quantize_level(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * MAX_LEVEL as f32).round() as u8
}

/// How a pixel collapses to one brightness value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intensity {
    /// Rec.601 luma of the color channels.
    #[default]
    Luma,
    /// HSV value, the maximum color channel.
    Value,
}

impl Intensity {
    /// Evaluates the intensity of one pixel's color channels.
    ///
    /// `color` holds either one sample (gray) or three (RGB); a gray sample
    /// is its own intensity under every mode. Alpha must not be included.
    #[inline]
    pub fn of(self, color: &[f32]) -> f32 {
        match color {
            [gray] => *gray,
            [r, g, b, ..] => {
                let rgb = [*r, *g, *b];
                match self {
                    Intensity::Luma => luma_rec601(rgb),
                    Intensity::Value => value(rgb),
                }
            }
            _ => 0.0,
        }
    }
}

/// Reduces interleaved normalized samples to a single intensity plane.
///
/// `channels` is the interleave stride; with four channels the last one is
/// treated as alpha and ignored.
pub fn intensity_plane(samples: &[f32], channels: usize, intensity: Intensity) -> Vec<f32> {
    let color = color_channels(channels);
    samples
        .chunks_exact(channels)
        .map(|px| intensity.of(&px[..color]))
        .collect()
}

/// Number of color (non-alpha) channels for a given channel count.
#[inline]
pub fn color_channels(channels: usize) -> usize {
    channels.min(3)
}
