//! Bit-reproducibility checks.
//!
//! Engines hold no state between calls and every numeric stage runs in a
//! fixed order, so the same input must hash identically across repeated
//! calls, across threads and through the batch API.

use lumen_core::{PixelBuffer, Samples};
use sha2::{Digest, Sha256};

/// SHA-256 of a buffer's shape and samples, as a hex string.
///
/// Float samples are hashed through their bit patterns, so any difference
/// at all changes the digest.
pub fn buffer_digest(buffer: &PixelBuffer) -> String {
    let mut hasher = Sha256::new();
    hasher.update(buffer.width().to_le_bytes());
    hasher.update(buffer.height().to_le_bytes());
    hasher.update((buffer.channels() as u32).to_le_bytes());
    match buffer.samples() {
        Samples::U8(v) => {
            hasher.update([0u8]);
            hasher.update(v);
        }
        Samples::F32(v) => {
            hasher.update([1u8]);
            for s in v {
                hasher.update(s.to_bits().to_le_bytes());
            }
        }
    }
    format!("{:x}", hasher.finalize())
}
