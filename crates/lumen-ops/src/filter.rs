//! Single-plane filters used by texture-aware smoothing.
//!
//! All functions take one `f32` plane (`width * height` samples, row-major)
//! and return a new plane of the same size.
//!
//! - [`forward_diff_h`] / [`forward_diff_v`] - forward differences with a
//!   zero last column / row
//! - [`box_sum_h`] / [`box_sum_v`] - 1-D window sums with zero padding
//!   (the `'same'` convolution with a kernel of ones)
//!
//! # Example
//!
//! ```rust
//! use lumen_ops::filter::{box_sum_h, forward_diff_h};
//!
//! let plane = vec![0.0, 0.0, 1.0, 1.0];
//! let dx = forward_diff_h(&plane, 4, 1).unwrap();
//! assert_eq!(dx, vec![0.0, 1.0, 0.0, 0.0]);
//!
//! let summed = box_sum_h(&dx, 4, 1, 3).unwrap();
//! assert_eq!(summed, vec![1.0, 1.0, 1.0, 0.0]);
//! ```

use crate::error::check_len;
use crate::{OpsError, OpsResult};
use tracing::trace;

/// Horizontal forward difference: `out[x] = p[x + 1] - p[x]`, 0 in the last column.
pub fn forward_diff_h(plane: &[f32], width: usize, height: usize) -> OpsResult<Vec<f32>> {
    check_len(plane.len(), width, height, 1)?;
    let mut dst = vec![0.0f32; plane.len()];
    for y in 0..height {
        let row = &plane[y * width..(y + 1) * width];
        let out = &mut dst[y * width..(y + 1) * width];
        for x in 0..width.saturating_sub(1) {
            out[x] = row[x + 1] - row[x];
        }
    }
    Ok(dst)
}

/// Vertical forward difference: `out[y] = p[y + 1] - p[y]`, 0 in the last row.
pub fn forward_diff_v(plane: &[f32], width: usize, height: usize) -> OpsResult<Vec<f32>> {
    check_len(plane.len(), width, height, 1)?;
    let mut dst = vec![0.0f32; plane.len()];
    for y in 0..height.saturating_sub(1) {
        for x in 0..width {
            dst[y * width + x] = plane[(y + 1) * width + x] - plane[y * width + x];
        }
    }
    Ok(dst)
}

/// Horizontal sum over a window of `len` samples, zero outside the plane.
///
/// The window covers `x - len / 2 ..= x + (len - 1) / 2`.
pub fn box_sum_h(plane: &[f32], width: usize, height: usize, len: usize) -> OpsResult<Vec<f32>> {
    trace!(width, height, len, "box_sum_h");
    check_len(plane.len(), width, height, 1)?;
    check_window(len)?;

    let mut dst = vec![0.0f32; plane.len()];
    for y in 0..height {
        let row = &plane[y * width..(y + 1) * width];
        let out = &mut dst[y * width..(y + 1) * width];
        sliding_sum(row, len, |x, sum| out[x] = sum);
    }
    Ok(dst)
}

/// Vertical sum over a window of `len` samples, zero outside the plane.
pub fn box_sum_v(plane: &[f32], width: usize, height: usize, len: usize) -> OpsResult<Vec<f32>> {
    trace!(width, height, len, "box_sum_v");
    check_len(plane.len(), width, height, 1)?;
    check_window(len)?;

    let mut dst = vec![0.0f32; plane.len()];
    let mut column = vec![0.0f32; height];
    for x in 0..width {
        for (y, v) in column.iter_mut().enumerate() {
            *v = plane[y * width + x];
        }
        sliding_sum(&column, len, |y, sum| dst[y * width + x] = sum);
    }
    Ok(dst)
}

fn check_window(len: usize) -> OpsResult<()> {
    if len == 0 {
        return Err(OpsError::InvalidParameter("window length must be > 0".into()));
    }
    Ok(())
}

/// Sliding window sum over one line, zero padded.
fn sliding_sum(line: &[f32], len: usize, mut emit: impl FnMut(usize, f32)) {
    let n = line.len() as isize;
    // Windows wider than the line see only zeros past its ends
    let before = (len / 2).min(line.len()) as isize;
    let after = ((len - 1) / 2).min(line.len()) as isize;
    let at = |i: isize| if (0..n).contains(&i) { line[i as usize] } else { 0.0 };

    // Initialize window for the first sample
    let mut sum: f32 = (-before..=after).map(at).sum();
    for i in 0..n {
        emit(i as usize, sum);

        // Slide window
        sum -= at(i - before);
        sum += at(i + after + 1);
    }
}
