//! Source acquisition and decoding.
//!
//! The core never touches the network. Hosts that fetch remote images hand
//! the downloaded bytes in as [`ImageSource::Bytes`].

use std::io::Cursor;
use std::path::PathBuf;

use image::ImageReader;
use thiserror::Error;
use tracing::debug;

use crate::surface::PixelSurface;

/// Error types for loading a source image.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source holds no data.
    #[error("Image source is empty")]
    EmptySource,

    /// The bytes are not a decodable image.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// I/O error while reading a file source.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Where the encoded image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Encoded bytes already in memory.
    Bytes(Vec<u8>),
    /// An image file on disk.
    Path(PathBuf),
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<&[u8]> for ImageSource {
    fn from(bytes: &[u8]) -> Self {
        ImageSource::Bytes(bytes.to_vec())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

/// Decode `source` into an RGBA surface.
///
/// # Errors
///
/// Returns `LoadError::EmptySource` for empty byte sources,
/// `LoadError::Io` if a file cannot be read and `LoadError::Decode` if the
/// data is not a supported image.
pub fn load(source: &ImageSource) -> Result<PixelSurface, LoadError> {
    let surface = match source {
        ImageSource::Bytes(bytes) => decode_bytes(bytes)?,
        ImageSource::Path(path) => {
            let bytes = std::fs::read(path).map_err(|e| LoadError::Io(e.to_string()))?;
            decode_bytes(&bytes)?
        }
    };

    debug!(width = surface.width, height = surface.height, "Loaded source");
    Ok(surface)
}

/// Decode encoded image bytes into an RGBA surface.
pub fn decode_bytes(bytes: &[u8]) -> Result<PixelSurface, LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::EmptySource);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| LoadError::Decode(e.to_string()))?;

    let img = reader
        .decode()
        .map_err(|e| LoadError::Decode(e.to_string()))?;

    Ok(PixelSurface::from_rgba_image(img.into_rgba8()))
}
