//! Error types for lumen operations.
//!
//! Every stage of the enhancement pipeline reports failures through the
//! single [`Error`] enum defined here. The taxonomy is intentionally small:
//!
//! - [`InvalidInput`](Error::InvalidInput) - zero-dimension buffers, sample
//!   arrays whose length disagrees with the declared shape, buffers of
//!   different shapes handed to one stage, out-of-range parameters
//! - [`NumericDegenerate`](Error::NumericDegenerate) - the input is
//!   well-formed but the statistics derived from it are unusable (a histogram
//!   with zero pixels, an illumination map stuck at its floor everywhere)
//! - [`UnsupportedFormat`](Error::UnsupportedFormat) - a channel count
//!   outside {1, 3, 4}
//!
//! Errors are deterministic: running the same stage on the same input
//! reproduces the same error, so nothing in lumen retries.
//!
//! # Usage
//!
//! ```rust
//! use lumen_core::{Error, Result};
//!
//! fn check_alpha(alpha: f32) -> Result<()> {
//!     if !(alpha.is_finite() && alpha > 0.0) {
//!         return Err(Error::invalid_input(format!("alpha must be > 0, got {alpha}")));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_alpha(0.5).is_ok());
//! assert!(check_alpha(-1.0).unwrap_err().is_invalid_input());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while enhancing an image.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The buffer or a parameter is malformed.
    ///
    /// Returned for zero-dimension buffers, sample arrays whose length does
    /// not equal `width * height * channels`, mismatched buffer shapes and
    /// parameters outside their valid range.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with the input
        reason: String,
    },

    /// Derived statistics collapsed to a value the algorithm cannot use.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lumen_core::Error;
    ///
    /// let err = Error::numeric_degenerate("histogram has zero pixels");
    /// assert!(err.to_string().contains("zero pixels"));
    /// ```
    #[error("numerically degenerate: {reason}")]
    NumericDegenerate {
        /// Which quantity degenerated
        reason: String,
    },

    /// Channel count is not one of 1 (gray), 3 (RGB) or 4 (RGBA).
    #[error("unsupported format: {channels} channels (expected 1, 3 or 4)")]
    UnsupportedFormat {
        /// Channel count that was supplied
        channels: usize,
    },
}

impl Error {
    /// Creates an [`Error::InvalidInput`] error.
    #[inline]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::NumericDegenerate`] error.
    #[inline]
    pub fn numeric_degenerate(reason: impl Into<String>) -> Self {
        Self::NumericDegenerate {
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::UnsupportedFormat`] error.
    #[inline]
    pub fn unsupported_format(channels: usize) -> Self {
        Self::UnsupportedFormat { channels }
    }

    /// Returns `true` if this is an [`Error::InvalidInput`].
    #[inline]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Returns `true` if this is an [`Error::NumericDegenerate`].
    #[inline]
    pub fn is_numeric_degenerate(&self) -> bool {
        matches!(self, Self::NumericDegenerate { .. })
    }

    /// Returns `true` if this is an [`Error::UnsupportedFormat`].
    #[inline]
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input() {
        let err = Error::invalid_input("zero-dimension buffer 0x4");
        assert!(err.to_string().contains("0x4"));
        assert!(err.is_invalid_input());
        assert!(!err.is_numeric_degenerate());
    }

    #[test]
    fn test_numeric_degenerate() {
        let err = Error::numeric_degenerate("illumination collapsed to floor");
        assert!(err.is_numeric_degenerate());
        assert!(err.to_string().starts_with("numerically degenerate"));
    }

    #[test]
    fn test_unsupported_format() {
        let err = Error::unsupported_format(2);
        let msg = err.to_string();
        assert!(msg.contains("2 channels"));
        assert!(err.is_unsupported_format());
    }
}
