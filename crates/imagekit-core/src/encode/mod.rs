//! Output encoding.
//!
//! This module provides functionality for:
//! - Negotiating an [`OutputFormat`] from a MIME type string
//! - Encoding RGBA surfaces to JPEG (quality-controlled) or PNG
//! - Rendering encoded bytes as a `data:` URL
//!
//! # Examples
//!
//! ```ignore
//! use imagekit_core::encode::{encode_surface, OutputFormat};
//! use imagekit_core::PixelSurface;
//!
//! let surface = PixelSurface::transparent(16, 16);
//! let png = encode_surface(&surface, OutputFormat::Png, 0.9).unwrap();
//! assert_eq!(&png[1..4], b"PNG");
//! ```

mod jpeg;
mod png;

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;
use tracing::debug;

use crate::surface::{PixelSurface, CHANNELS};

pub use jpeg::{encode_jpeg, jpeg_quality};
pub use png::encode_png;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// No encoder exists for the requested MIME type
    #[error("Unsupported output format: {0}")]
    Unavailable(String),

    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying codec failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Container formats the encoder can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Canonical MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// Whether the quality setting affects the output.
    pub fn is_lossy(self) -> bool {
        matches!(self, OutputFormat::Jpeg)
    }
}

impl FromStr for OutputFormat {
    type Err = EncodeError;

    fn from_str(mime: &str) -> Result<Self, Self::Err> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(OutputFormat::Jpeg),
            "image/png" => Ok(OutputFormat::Png),
            _ => Err(EncodeError::Unavailable(mime.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Encode a surface in `format`.
///
/// `quality` is in `0.0..=1.0` and only matters for JPEG.
pub fn encode_surface(
    surface: &PixelSurface,
    format: OutputFormat,
    quality: f32,
) -> Result<Vec<u8>, EncodeError> {
    validate(surface)?;

    let bytes = match format {
        OutputFormat::Jpeg => {
            encode_jpeg(&surface.pixels, surface.width, surface.height, jpeg_quality(quality))?
        }
        OutputFormat::Png => encode_png(&surface.pixels, surface.width, surface.height)?,
    };

    debug!(
        format = format.mime_type(),
        width = surface.width,
        height = surface.height,
        bytes = bytes.len(),
        "Encoded surface"
    );
    Ok(bytes)
}

/// Render encoded bytes as `data:<mime>;base64,<payload>`.
pub fn to_data_url(bytes: &[u8], mime: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        general_purpose::STANDARD.encode(bytes)
    )
}

pub(crate) fn validate_rgba(pixels: &[u8], width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * CHANNELS;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

fn validate(surface: &PixelSurface) -> Result<(), EncodeError> {
    validate_rgba(&surface.pixels, surface.width, surface.height)
}
