//! Error types for image operations.

use thiserror::Error;

/// Error type for image operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpsError {
    /// Invalid dimensions specified.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for image operations.
pub type OpsResult<T> = Result<T, OpsError>;

impl From<OpsError> for lumen_core::Error {
    fn from(err: OpsError) -> Self {
        lumen_core::Error::invalid_input(err.to_string())
    }
}

/// Checks that `len` samples describe a `width x height x channels` grid.
pub(crate) fn check_len(len: usize, width: usize, height: usize, channels: usize) -> OpsResult<()> {
    let expected = width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| OpsError::InvalidDimensions("image dimensions overflow".into()))?;
    if len != expected {
        return Err(OpsError::InvalidDimensions(format!(
            "expected {} samples, got {}",
            expected, len
        )));
    }
    Ok(())
}
