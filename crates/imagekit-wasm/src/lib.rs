//! ImageKit WASM - WebAssembly bindings for the ImageKit transform pipeline
//!
//! The host fetches or reads the source bytes, then hands them over together
//! with a plain options object.
//!
//! # Module Structure
//!
//! - `process` - Run the full pipeline and return encoded bytes or a data URL
//! - `dimensions` - Preview the target size a resize directive resolves to
//! - `error` - Conversion of pipeline errors into JavaScript `Error` objects
//!
//! # Usage
//!
//! ```typescript
//! import init, { process_image } from '@imagekit/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await (await fetch(url)).arrayBuffer());
//! const jpeg = process_image(bytes, {
//!   format: 'image/jpeg',
//!   quality: 0.8,
//!   resize: { width: 320, aspectRatio: 'original' },
//!   sharpen: 1,
//!   cropShape: { type: 'circle' },
//! });
//! ```

use wasm_bindgen::prelude::*;

mod dimensions;
mod error;
mod process;

pub use dimensions::resolve_target_size;
pub use process::{process_image, process_image_to_data_url};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
