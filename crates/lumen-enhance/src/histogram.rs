//! 256-level intensity histogram with PDF and CDF.
//!
//! Color pixels are reduced to one intensity first (Rec.601 luma by default,
//! see [`Intensity`]) and then binned into 8-bit levels. Float samples are
//! scaled to `0..=255` and rounded.
//!
//! # Example
//!
//! ```rust
//! use lumen_core::PixelBuffer;
//! use lumen_enhance::histogram::HistogramStats;
//!
//! let buf = PixelBuffer::from_u8(2, 2, 1, vec![0, 0, 255, 255]).unwrap();
//! let stats = HistogramStats::compute(&buf).unwrap();
//! assert_eq!(stats.total(), 4);
//! assert_eq!(stats.histogram()[255], 2);
//! assert_eq!(stats.cdf()[255], 1.0);
//! ```

use lumen_core::pixel::{intensity_plane, quantize_level};
use lumen_core::{Error, Intensity, PixelBuffer, Result};
use tracing::trace;

/// Number of intensity levels.
pub const LEVELS: usize = 256;

/// Histogram, probability density and cumulative distribution of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramStats {
    histogram: [u32; LEVELS],
    pdf: [f64; LEVELS],
    cdf: [f64; LEVELS],
    total: u64,
}

impl HistogramStats {
    /// Computes statistics over the Rec.601 luma of `buffer`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for a zero-dimension buffer.
    pub fn compute(buffer: &PixelBuffer) -> Result<Self> {
        Self::compute_with(buffer, Intensity::Luma)
    }

    /// Computes statistics over the chosen intensity of `buffer`.
    pub fn compute_with(buffer: &PixelBuffer, intensity: Intensity) -> Result<Self> {
        trace!(
            width = buffer.width(),
            height = buffer.height(),
            channels = buffer.channels(),
            ?intensity,
            "HistogramStats::compute"
        );
        buffer.ensure_not_empty()?;

        let mut histogram = [0u32; LEVELS];
        for level in intensity_levels(buffer, intensity) {
            let bin = &mut histogram[level as usize];
            *bin = bin.saturating_add(1);
        }
        Self::from_histogram(histogram)
    }

    /// Derives PDF and CDF from raw counts.
    ///
    /// # Errors
    ///
    /// [`Error::NumericDegenerate`] if every count is zero.
    pub fn from_histogram(histogram: [u32; LEVELS]) -> Result<Self> {
        let total: u64 = histogram.iter().map(|&c| c as u64).sum();
        if total == 0 {
            return Err(Error::numeric_degenerate("histogram has zero pixels"));
        }

        let mut pdf = [0.0f64; LEVELS];
        let mut cdf = [0.0f64; LEVELS];
        let mut running = 0.0f64;
        for i in 0..LEVELS {
            pdf[i] = histogram[i] as f64 / total as f64;
            running += pdf[i];
            cdf[i] = running;
        }
        // Rounding must not leave the last bin short of 1
        cdf[LEVELS - 1] = 1.0;

        Ok(Self {
            histogram,
            pdf,
            cdf,
            total,
        })
    }

    /// Raw counts per level.
    #[inline]
    pub fn histogram(&self) -> &[u32; LEVELS] {
        &self.histogram
    }

    /// Probability of each level; sums to 1.
    #[inline]
    pub fn pdf(&self) -> &[f64; LEVELS] {
        &self.pdf
    }

    /// Running sum of the PDF; `cdf()[255] == 1.0`.
    #[inline]
    pub fn cdf(&self) -> &[f64; LEVELS] {
        &self.cdf
    }

    /// Number of pixels counted.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Smallest and largest PDF value over all 256 levels.
    pub fn pdf_min_max(&self) -> (f64, f64) {
        self.pdf
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
                (lo.min(p), hi.max(p))
            })
    }

    /// Number of levels with at least one pixel.
    pub fn occupied_levels(&self) -> usize {
        self.histogram.iter().filter(|&&c| c > 0).count()
    }

    /// Mean intensity level.
    pub fn mean_level(&self) -> f64 {
        self.pdf
            .iter()
            .enumerate()
            .map(|(level, p)| level as f64 * p)
            .sum()
    }
}

/// Quantized intensity level of every pixel, row-major.
pub(crate) fn intensity_levels(buffer: &PixelBuffer, intensity: Intensity) -> Vec<u8> {
    match (buffer.as_u8(), buffer.channels()) {
        (Some(gray), 1) => gray.to_vec(),
        _ => intensity_plane(&buffer.to_f32_samples(), buffer.channels(), intensity)
            .into_iter()
            .map(quantize_level)
            .collect(),
    }
}
