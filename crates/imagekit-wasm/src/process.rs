//! Full-pipeline WASM bindings.
//!
//! # Functions
//!
//! - [`process_image`] - Transform encoded bytes and return encoded bytes
//! - [`process_image_to_data_url`] - Same, rendered as a `data:` URL
//!
//! # Options
//!
//! The options object mirrors `TransformDirectives` in camelCase. Every
//! field is optional:
//!
//! ```typescript
//! {
//!   format?: 'image/jpeg' | 'image/png',
//!   quality?: number,            // 0..1
//!   resize?: { width?, height?, aspectRatio?, crop?, gravity? },
//!   sharpen?: 0 | 1 | 2,
//!   algorithm?: 'standard' | 'lanczos' | 'multistep',
//!   rotate?: number,             // degrees
//!   cropShape?: { type: 'circle' | 'square' | 'rectangle' | 'roundedRect', ... },
//! }
//! ```

use imagekit_core::{EncodedImage, ImageKit, ImageSource, TransformDirectives};
use wasm_bindgen::prelude::*;

use crate::error::{js_error, to_js_error, INVALID_OPTIONS};

/// Transform `bytes` according to `options` and return the encoded image.
///
/// # Errors
///
/// Throws an `Error` whose `name` is one of `InvalidOptions`, `LoadError`,
/// `SurfaceUnavailable`, `EncodeUnavailable` or `EncodeError`.
#[wasm_bindgen]
pub fn process_image(bytes: &[u8], options: JsValue) -> Result<Vec<u8>, JsValue> {
    let directives = parse_options(options)?;
    run(bytes, directives)
        .map(EncodedImage::into_bytes)
        .map_err(to_js_error)
}

/// Transform `bytes` according to `options` and return a `data:` URL.
#[wasm_bindgen]
pub fn process_image_to_data_url(bytes: &[u8], options: JsValue) -> Result<String, JsValue> {
    let directives = parse_options(options)?;
    run(bytes, directives)
        .map(|image| image.to_data_url())
        .map_err(to_js_error)
}

fn parse_options(options: JsValue) -> Result<TransformDirectives, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(TransformDirectives::default());
    }
    let directives: TransformDirectives = serde_wasm_bindgen::from_value(options)
        .map_err(|e| js_error(INVALID_OPTIONS, &format!("Invalid options: {}", e)))?;
    Ok(normalize(directives))
}

/// Apply the same clamping the builder setters apply.
fn normalize(directives: TransformDirectives) -> TransformDirectives {
    let quality = directives.quality;
    let resize = directives.resize;
    let directives = directives.quality(quality);
    match resize {
        Some(resize) => directives.resize(resize),
        None => directives,
    }
}

fn run(
    bytes: &[u8],
    directives: TransformDirectives,
) -> Result<EncodedImage, imagekit_core::TransformError> {
    ImageKit::new(ImageSource::from(bytes))
        .with_directives(directives)
        .to_blob(None)
}
