//! Target size preview.

use imagekit_core::{resolve_dimensions, ResizeDirective};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::error::{js_error, to_js_error, INVALID_OPTIONS};

/// Resolved output size, serialized as `{ width, height }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

/// Report the size a resize directive produces for a `src_w` x `src_h`
/// source, without touching any pixels.
#[wasm_bindgen]
pub fn resolve_target_size(src_w: u32, src_h: u32, resize: JsValue) -> Result<JsValue, JsValue> {
    let directive: ResizeDirective = serde_wasm_bindgen::from_value(resize)
        .map_err(|e| js_error(INVALID_OPTIONS, &format!("Invalid resize directive: {}", e)))?;
    let size = target_size(src_w, src_h, directive).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&size).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn target_size(
    src_w: u32,
    src_h: u32,
    directive: ResizeDirective,
) -> imagekit_core::Result<TargetSize> {
    let (width, height) = resolve_dimensions(src_w, src_h, &directive.normalized())?;
    Ok(TargetSize { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagekit_core::CropMode;

    #[test]
    fn test_width_only_keeps_aspect() {
        let size = target_size(400, 300, ResizeDirective::new().width(100)).unwrap();
        assert_eq!(size, TargetSize { width: 100, height: 75 });
    }

    #[test]
    fn test_thumb_preset() {
        let size = target_size(
            400,
            200,
            ResizeDirective::new()
                .width(100)
                .height(100)
                .crop_mode(CropMode::Thumb),
        )
        .unwrap();
        assert_eq!(size, TargetSize { width: 200, height: 100 });
    }

    #[test]
    fn test_zero_source_is_rejected() {
        assert!(target_size(0, 10, ResizeDirective::new()).is_err());
    }
}
