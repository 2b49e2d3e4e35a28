//! PNG encoding. Lossless, keeps alpha, ignores quality.

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{validate_rgba, EncodeError};

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
    validate_rgba(pixels, width, height)?;

    let mut buffer = Cursor::new(Vec::new());
    PngEncoder::new(&mut buffer)
        .write_image(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_is_lossless() {
        let pixels: Vec<u8> = (0..6 * 5 * 4).map(|i| (i * 7 % 256) as u8).collect();
        let png = encode_png(&pixels, 6, 5).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().into_rgba8();
        assert_eq!(decoded.dimensions(), (6, 5));
        assert_eq!(decoded.into_raw(), pixels);
    }

    #[test]
    fn test_png_invalid_data() {
        let result = encode_png(&[1, 2, 3], 1, 1);
        assert!(matches!(
            result,
            Err(EncodeError::InvalidPixelData {
                expected: 4,
                actual: 3
            })
        ));
    }
}
