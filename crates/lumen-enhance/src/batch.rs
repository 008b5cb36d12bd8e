//! Image-level parallelism.
//!
//! Each image is processed independently on its own buffers. With the
//! `parallel` feature (on by default) images are spread over the rayon
//! thread pool; without it they run in order. Results keep input order
//! either way.

use crate::adapter::ResolutionAdapter;
use crate::engine::Enhancer;
use lumen_core::{PixelBuffer, Result};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Enhances every buffer, optionally through `adapter`.
///
/// One failing image does not affect the others.
///
/// # Example
///
/// ```rust
/// use lumen_core::PixelBuffer;
/// use lumen_enhance::{batch::enhance_batch, Agcwd};
///
/// let frames: Vec<PixelBuffer> = (1..4u8)
///     .map(|i| PixelBuffer::from_u8(2, 2, 1, vec![0, i, i * 2, 255]).unwrap())
///     .collect();
/// let results = enhance_batch(&frames, &Agcwd::default(), None);
/// assert_eq!(results.len(), 3);
/// assert!(results.iter().all(|r| r.is_ok()));
/// ```
pub fn enhance_batch<E: Enhancer + ?Sized>(
    buffers: &[PixelBuffer],
    engine: &E,
    adapter: Option<&ResolutionAdapter>,
) -> Vec<Result<PixelBuffer>> {
    debug!(images = buffers.len(), engine = engine.name(), "Batch enhance");
    let process = |buffer: &PixelBuffer| match adapter {
        Some(adapter) => adapter.run(buffer, engine),
        None => engine.enhance(buffer),
    };

    #[cfg(feature = "parallel")]
    {
        buffers.par_iter().map(process).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        buffers.iter().map(process).collect()
    }
}
