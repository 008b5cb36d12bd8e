//! The pixel buffer every enhancement stage reads and writes.
//!
//! A [`PixelBuffer`] is a plain 2-D grid of interleaved samples. It carries no
//! color space, stride or metadata; platform layers convert their bitmaps to
//! and from this representation.
//!
//! # Memory Layout
//!
//! Samples are stored in **row-major** order, top-to-bottom, channels
//! interleaved:
//!
//! ```text
//! Memory: [R G B R G B R G B ...]  ← Row 0
//!         [R G B R G B R G B ...]  ← Row 1
//!         ...
//! ```
//!
//! For RGBA buffers the fourth channel is alpha. Engines never modify alpha.
//!
//! # Sample Types
//!
//! - [`SampleType::U8`] - 8-bit samples in `[0, 255]`
//! - [`SampleType::F32`] - float samples, `[0.0, 1.0]` once normalized
//!
//! Algorithms work on normalized `f32` copies obtained through
//! [`PixelBuffer::to_f32_samples`] and write results back through
//! [`PixelBuffer::from_normalized`], which quantizes and clamps to the
//! requested sample type.
//!
//! # Usage
//!
//! ```rust
//! use lumen_core::PixelBuffer;
//!
//! let gray = PixelBuffer::from_u8(4, 4, 1, vec![128; 16]).unwrap();
//! assert_eq!(gray.dimensions(), (4, 4));
//! assert_eq!(gray.channels(), 1);
//!
//! // Channel counts other than 1, 3 or 4 are rejected
//! assert!(PixelBuffer::from_u8(1, 1, 2, vec![0, 0]).is_err());
//! ```

use crate::{Error, Result};

/// Channel counts a buffer may have: gray, RGB, RGBA.
pub const SUPPORTED_CHANNELS: [usize; 3] = [1, 3, 4];

/// Storage type of a buffer's samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    /// 8-bit unsigned samples.
    U8,
    /// 32-bit float samples.
    F32,
}

/// Owned sample storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// 8-bit samples.
    U8(Vec<u8>),
    /// Float samples.
    F32(Vec<f32>),
}

impl Samples {
    /// Number of samples stored.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Samples::U8(v) => v.len(),
            Samples::F32(v) => v.len(),
        }
    }

    /// Returns `true` if no samples are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage type.
    #[inline]
    pub fn sample_type(&self) -> SampleType {
        match self {
            Samples::U8(_) => SampleType::U8,
            Samples::F32(_) => SampleType::F32,
        }
    }
}

/// Owned 2-D multi-channel image.
///
/// Invariant: `samples.len() == width * height * channels` and `channels` is
/// one of [`SUPPORTED_CHANNELS`]. Zero width or height is representable (with
/// an empty sample array) so that callers can hand one to an engine, which
/// rejects it with [`Error::InvalidInput`].
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: usize,
    samples: Samples,
}

impl PixelBuffer {
    /// Creates a buffer from existing samples.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedFormat`] if `channels` is not 1, 3 or 4
    /// - [`Error::InvalidInput`] if the sample count doesn't match the shape
    pub fn new(width: u32, height: u32, channels: usize, samples: Samples) -> Result<Self> {
        if !SUPPORTED_CHANNELS.contains(&channels) {
            return Err(Error::unsupported_format(channels));
        }
        let expected = expected_len(width, height, channels)?;
        if samples.len() != expected {
            return Err(Error::invalid_input(format!(
                "{width}x{height}x{channels} buffer expects {expected} samples, got {}",
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// Creates an 8-bit buffer.
    pub fn from_u8(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, channels, Samples::U8(data))
    }

    /// Creates a float buffer.
    pub fn from_f32(width: u32, height: u32, channels: usize, data: Vec<f32>) -> Result<Self> {
        Self::new(width, height, channels, Samples::F32(data))
    }

    /// Creates an 8-bit buffer with every pixel set to `pixel`.
    ///
    /// ```rust
    /// use lumen_core::PixelBuffer;
    ///
    /// let red = PixelBuffer::filled_u8(2, 2, &[255, 0, 0]).unwrap();
    /// assert_eq!(red.as_u8().unwrap()[3..6], [255, 0, 0]);
    /// ```
    pub fn filled_u8(width: u32, height: u32, pixel: &[u8]) -> Result<Self> {
        let count = width as usize * height as usize;
        Self::from_u8(width, height, pixel.len(), pixel.repeat(count))
    }

    /// Creates a float buffer with every pixel set to `pixel`.
    pub fn filled_f32(width: u32, height: u32, pixel: &[f32]) -> Result<Self> {
        let count = width as usize * height as usize;
        Self::from_f32(width, height, pixel.len(), pixel.repeat(count))
    }

    /// Builds a buffer of `sample_type` from normalized float samples.
    ///
    /// Samples are clamped to `[0, 1]` (NaN becomes 0); 8-bit output is
    /// rounded to the nearest level.
    pub fn from_normalized(
        width: u32,
        height: u32,
        channels: usize,
        sample_type: SampleType,
        data: Vec<f32>,
    ) -> Result<Self> {
        let samples = match sample_type {
            SampleType::U8 => Samples::U8(
                data.iter()
                    .map(|&v| crate::pixel::quantize_level(v))
                    .collect(),
            ),
            SampleType::F32 => Samples::F32(data.into_iter().map(clamp_unit).collect()),
        };
        Self::new(width, height, channels, samples)
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

    /// Returns the number of interleaved channels.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of color channels (alpha excluded).
    #[inline]
    pub fn color_channels(&self) -> usize {
        crate::pixel::color_channels(self.channels)
    }

    /// Returns `true` for RGBA buffers.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// Number of pixels (`width * height`).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns `true` if either dimension is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Storage type of the samples.
    #[inline]
    pub fn sample_type(&self) -> SampleType {
        self.samples.sample_type()
    }

    /// Borrows the raw samples.
    #[inline]
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Consumes the buffer and returns its samples.
    #[inline]
    pub fn into_samples(self) -> Samples {
        self.samples
    }

    /// Borrows 8-bit samples, if this is an 8-bit buffer.
    #[inline]
    pub fn as_u8(&self) -> Option<&[u8]> {
        match &self.samples {
            Samples::U8(v) => Some(v),
            Samples::F32(_) => None,
        }
    }

    /// Borrows float samples, if this is a float buffer.
    #[inline]
    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.samples {
            Samples::F32(v) => Some(v),
            Samples::U8(_) => None,
        }
    }

    /// Copies the samples into normalized floats in `[0, 1]`.
    ///
    /// 8-bit samples are divided by 255; float samples are clamped.
    pub fn to_f32_samples(&self) -> Vec<f32> {
        match &self.samples {
            Samples::U8(v) => v.iter().map(|&s| s as f32 / 255.0).collect(),
            Samples::F32(v) => v.iter().copied().map(clamp_unit).collect(),
        }
    }

    /// Builds a buffer of the same shape and sample type from normalized
    /// floats, as [`PixelBuffer::from_normalized`] does.
    pub fn with_f32_samples(&self, data: Vec<f32>) -> Result<Self> {
        Self::from_normalized(
            self.width,
            self.height,
            self.channels,
            self.sample_type(),
            data,
        )
    }

    /// Fails with [`Error::InvalidInput`] on a zero-dimension buffer.
    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::invalid_input(format!(
                "zero-dimension buffer {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Fails with [`Error::InvalidInput`] unless `other` has the same
    /// dimensions and channel count.
    pub fn ensure_same_shape(&self, other: &PixelBuffer) -> Result<()> {
        if self.dimensions() != other.dimensions() || self.channels != other.channels {
            return Err(Error::invalid_input(format!(
                "shape mismatch: {}x{}x{} vs {}x{}x{}",
                self.width,
                self.height,
                self.channels,
                other.width,
                other.height,
                other.channels
            )));
        }
        Ok(())
    }
}

fn expected_len(width: u32, height: u32, channels: usize) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| Error::invalid_input(format!("{width}x{height}x{channels} overflows")))
}

#[inline]
fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch() {
        let err = PixelBuffer::from_u8(2, 2, 3, vec![0; 11]).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_unsupported_channels() {
        for channels in [0, 2, 5] {
            let err = PixelBuffer::from_f32(1, 1, channels, vec![0.0; channels]).unwrap_err();
            assert!(err.is_unsupported_format());
        }
    }

    #[test]
    fn test_zero_dimension_is_representable() {
        let buf = PixelBuffer::from_u8(0, 5, 3, Vec::new()).unwrap();
        assert!(buf.is_empty());
        assert!(buf.ensure_not_empty().unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_normalized_roundtrip_u8() {
        let buf = PixelBuffer::from_u8(2, 1, 1, vec![0, 200]).unwrap();
        let norm = buf.to_f32_samples();
        let back = PixelBuffer::from_normalized(2, 1, 1, SampleType::U8, norm).unwrap();
        assert_eq!(back, buf);
    }

    #[test]
    fn test_from_normalized_clamps() {
        let buf =
            PixelBuffer::from_normalized(3, 1, 1, SampleType::F32, vec![-0.5, 0.25, f32::NAN])
                .unwrap();
        assert_eq!(buf.as_f32().unwrap(), &[0.0, 0.25, 0.0]);

        let buf = PixelBuffer::from_normalized(2, 1, 1, SampleType::U8, vec![1.5, 0.5]).unwrap();
        assert_eq!(buf.as_u8().unwrap(), &[255, 128]);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = PixelBuffer::filled_u8(2, 2, &[1, 2, 3]).unwrap();
        let b = PixelBuffer::filled_u8(2, 2, &[1]).unwrap();
        assert!(a.ensure_same_shape(&b).unwrap_err().is_invalid_input());
        assert!(a.ensure_same_shape(&a.clone()).is_ok());
    }

    #[test]
    fn test_alpha_helpers() {
        let rgba = PixelBuffer::filled_f32(1, 1, &[0.1, 0.2, 0.3, 1.0]).unwrap();
        assert!(rgba.has_alpha());
        assert_eq!(rgba.color_channels(), 3);
        assert_eq!(rgba.sample_type(), SampleType::F32);
    }
}
