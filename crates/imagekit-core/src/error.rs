//! Error taxonomy for the transform pipeline.

use thiserror::Error;

use crate::encode::EncodeError;
use crate::load::LoadError;

/// Errors surfaced by the terminal operations of an [`crate::ImageKit`].
///
/// No stage retries internally. Every variant is fatal for the call that
/// produced it.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The source could not be read or decoded.
    #[error("Failed to load image: {0}")]
    Load(#[from] LoadError),

    /// The surface backend could not provide a drawable surface.
    #[error("No drawable surface available: {0}")]
    SurfaceUnavailable(String),

    /// No encoder exists for the requested output format.
    #[error("No encoder available for format: {0}")]
    EncodeUnavailable(String),

    /// The encoder accepted the format but failed on the data.
    #[error("Encoding failed: {0}")]
    Encode(EncodeError),

    /// The caller cancelled the operation.
    #[error("Operation aborted")]
    Cancelled,

    /// The source has a zero-sized axis.
    #[error("Invalid source dimensions: {width}x{height}")]
    InvalidSource { width: u32, height: u32 },

    /// A raw pixel buffer does not match the surface it is written to.
    #[error("Pixel buffer mismatch: expected {expected} bytes, got {actual}")]
    PixelBufferMismatch { expected: usize, actual: usize },
}

impl TransformError {
    /// Stable label for the error class, used when the error crosses a
    /// language boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            TransformError::Load(_) => "LoadError",
            TransformError::SurfaceUnavailable(_) => "SurfaceUnavailable",
            TransformError::EncodeUnavailable(_) => "EncodeUnavailable",
            TransformError::Encode(_) => "EncodeError",
            TransformError::Cancelled => "CancelledError",
            TransformError::InvalidSource { .. } => "InvalidSource",
            TransformError::PixelBufferMismatch { .. } => "PixelBufferMismatch",
        }
    }

    /// Returns true if the failure was a caller-requested abort.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransformError::Cancelled)
    }
}

impl From<EncodeError> for TransformError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Unavailable(mime) => TransformError::EncodeUnavailable(mime),
            other => TransformError::Encode(other),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_unavailable_is_routed() {
        let err: TransformError = EncodeError::Unavailable("image/gif".to_string()).into();
        assert!(matches!(err, TransformError::EncodeUnavailable(ref m) if m == "image/gif"));
        assert_eq!(err.kind(), "EncodeUnavailable");
    }

    #[test]
    fn test_other_encode_errors_are_wrapped() {
        let err: TransformError = EncodeError::InvalidDimensions {
            width: 0,
            height: 4,
        }
        .into();
        assert!(matches!(err, TransformError::Encode(_)));
    }

    #[test]
    fn test_cancelled_is_distinct() {
        let err = TransformError::Cancelled;
        assert!(err.is_cancelled());
        assert_eq!(err.kind(), "CancelledError");
        assert_eq!(err.to_string(), "Operation aborted");

        let other = TransformError::SurfaceUnavailable("headless".to_string());
        assert!(!other.is_cancelled());
    }

    #[test]
    fn test_load_error_display() {
        let err: TransformError = LoadError::EmptySource.into();
        assert_eq!(err.kind(), "LoadError");
        assert_eq!(err.to_string(), "Failed to load image: Image source is empty");
    }
}
