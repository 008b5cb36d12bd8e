//! Downscale, enhance, upscale.
//!
//! Both engines scale with pixel count, so they run on a copy whose longer
//! side is at most a fixed bound. The result is resampled back to the
//! caller's exact resolution.
//!
//! | Step | Filter |
//! |------|--------|
//! | downscale | exact area averaging |
//! | upscale | bicubic (Keys, a = -0.75) |
//!
//! Images already within the bound pass straight through, so the adapter
//! never changes the result for small inputs.
//!
//! # Example
//!
//! ```rust
//! use lumen_core::PixelBuffer;
//! use lumen_enhance::{Agcwd, ResolutionAdapter};
//!
//! let engine = Agcwd::default();
//! let adapter = ResolutionAdapter::new(64).unwrap();
//! let data: Vec<u8> = (0..200 * 100).map(|i| (i % 90) as u8).collect();
//! let big = PixelBuffer::from_u8(200, 100, 1, data).unwrap();
//!
//! assert_eq!(adapter.working_dimensions(200, 100), (64, 32));
//! let out = adapter.run(&big, &engine).unwrap();
//! assert_eq!(out.dimensions(), (200, 100));
//! ```

use std::time::Instant;

use crate::engine::Enhancer;
use lumen_core::{Error, PixelBuffer, Result};
use lumen_ops::resize::{fit_longest_side, resize_f32, Filter};
use tracing::{debug, trace};

/// Runs engines at a bounded working resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionAdapter {
    max_dimension: u32,
}

impl ResolutionAdapter {
    /// Creates an adapter bounding the longer side to `max_dimension`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if `max_dimension` is 0.
    pub fn new(max_dimension: u32) -> Result<Self> {
        if max_dimension == 0 {
            return Err(Error::invalid_input("max working dimension must be > 0"));
        }
        Ok(Self { max_dimension })
    }

    /// Adapter using the engine's preferred bound.
    pub fn for_engine<E: Enhancer + ?Sized>(engine: &E) -> Result<Self> {
        Self::new(engine.max_working_dimension())
    }

    /// The bound.
    #[inline]
    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Size an image of `width x height` is processed at.
    pub fn working_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let (w, h) = fit_longest_side(width as usize, height as usize, self.max_dimension as usize);
        (w as u32, h as u32)
    }

    /// Whether `buffer` would be resampled.
    pub fn needs_resize(&self, buffer: &PixelBuffer) -> bool {
        buffer.width().max(buffer.height()) > self.max_dimension
    }

    /// Area-averaged copy within the bound; a clone if already within it.
    pub fn downscale(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        buffer.ensure_not_empty()?;
        if !self.needs_resize(buffer) {
            return Ok(buffer.clone());
        }
        let (w, h) = self.working_dimensions(buffer.width(), buffer.height());
        resample(buffer, w, h, Filter::Area)
    }

    /// Bicubic resample of `buffer` to exactly `dimensions`.
    pub fn upscale(&self, buffer: &PixelBuffer, dimensions: (u32, u32)) -> Result<PixelBuffer> {
        buffer.ensure_not_empty()?;
        let (w, h) = dimensions;
        if w == 0 || h == 0 {
            return Err(Error::invalid_input(format!("cannot upscale to {w}x{h}")));
        }
        if buffer.dimensions() == dimensions {
            return Ok(buffer.clone());
        }
        resample(buffer, w, h, Filter::Bicubic)
    }

    /// Runs `engine` on `buffer` at the working resolution and returns a
    /// result at the original resolution.
    pub fn run<E: Enhancer + ?Sized>(
        &self,
        buffer: &PixelBuffer,
        engine: &E,
    ) -> Result<PixelBuffer> {
        let original = buffer.dimensions();
        trace!(
            engine = engine.name(),
            width = original.0,
            height = original.1,
            max_dimension = self.max_dimension,
            "ResolutionAdapter::run"
        );
        buffer.ensure_not_empty()?;
        if !self.needs_resize(buffer) {
            return engine.enhance(buffer);
        }

        let start = Instant::now();
        let small = self.downscale(buffer)?;
        let downscaled = start.elapsed();

        let start = Instant::now();
        let enhanced = engine.enhance(&small)?;
        let processed = start.elapsed();

        let start = Instant::now();
        let out = self.upscale(&enhanced, original)?;
        let upscaled = start.elapsed();

        debug!(
            engine = engine.name(),
            working = ?small.dimensions(),
            ?downscaled,
            ?processed,
            ?upscaled,
            "Adapted run finished"
        );
        Ok(out)
    }
}

fn resample(buffer: &PixelBuffer, width: u32, height: u32, filter: Filter) -> Result<PixelBuffer> {
    let data = resize_f32(
        &buffer.to_f32_samples(),
        buffer.width() as usize,
        buffer.height() as usize,
        buffer.channels(),
        width as usize,
        height as usize,
        filter,
    )?;
    PixelBuffer::from_normalized(width, height, buffer.channels(), buffer.sample_type(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Agcwd, Bimef};

    #[test]
    fn test_zero_bound_rejected() {
        assert!(ResolutionAdapter::new(0).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_engine_bounds() {
        assert_eq!(ResolutionAdapter::for_engine(&Agcwd::default()).unwrap().max_dimension(), 1024);
        assert_eq!(ResolutionAdapter::for_engine(&Bimef::default()).unwrap().max_dimension(), 512);
    }

    #[test]
    fn test_round_trip_dimensions() {
        for bound in [1u32, 2, 3, 7, 16, 33] {
            let adapter = ResolutionAdapter::new(bound).unwrap();
            for (w, h) in [(1, 1), (1, 40), (40, 1), (17, 5), (64, 64), (99, 38)] {
                let buf = PixelBuffer::filled_u8(w, h, &[10, 20, 30]).unwrap();
                let small = adapter.downscale(&buf).unwrap();
                assert!(small.width().max(small.height()) <= bound);
                assert!(small.width() >= 1 && small.height() >= 1);
                let back = adapter.upscale(&small, (w, h)).unwrap();
                assert_eq!(back.dimensions(), (w, h));
            }
        }
    }

    #[test]
    fn test_downscale_respects_bound() {
        let adapter = ResolutionAdapter::new(10).unwrap();
        let buf = PixelBuffer::filled_f32(45, 12, &[0.5]).unwrap();
        let small = adapter.downscale(&buf).unwrap();
        assert_eq!(small.dimensions(), (10, 3));
        assert!(small.as_f32().unwrap().iter().all(|v| (v - 0.5).abs() < 1e-5));
    }

    #[test]
    fn test_compliant_image_matches_direct_call() {
        let data: Vec<u8> = (0..12 * 8).map(|i| (i * 3 % 70) as u8).collect();
        let buf = PixelBuffer::from_u8(12, 8, 1, data).unwrap();
        let engine = Agcwd::default();
        let adapter = ResolutionAdapter::new(12).unwrap();
        assert_eq!(adapter.run(&buf, &engine).unwrap(), engine.enhance(&buf).unwrap());
        assert_eq!(adapter.downscale(&buf).unwrap(), buf);
    }

    #[test]
    fn test_run_large_image() {
        let data: Vec<u8> = (0..90 * 30 * 3).map(|i| (i % 50) as u8).collect();
        let buf = PixelBuffer::from_u8(90, 30, 3, data).unwrap();
        let adapter = ResolutionAdapter::new(32).unwrap();
        let out = adapter.run(&buf, &Bimef::default()).unwrap();
        assert_eq!(out.dimensions(), (90, 30));
        assert_eq!(out.channels(), 3);
    }

    #[test]
    fn test_empty_rejected() {
        let adapter = ResolutionAdapter::new(8).unwrap();
        let empty = PixelBuffer::from_u8(0, 4, 1, Vec::new()).unwrap();
        assert!(adapter.run(&empty, &Agcwd::default()).unwrap_err().is_invalid_input());
        assert!(adapter.downscale(&empty).unwrap_err().is_invalid_input());
    }
}
