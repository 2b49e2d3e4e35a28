//! JavaScript error conversion.

use imagekit_core::TransformError;
use wasm_bindgen::JsValue;

/// Name given to errors raised while reading the options object.
pub const INVALID_OPTIONS: &str = "InvalidOptions";

/// Name and message pair for a pipeline failure.
pub fn describe(err: &TransformError) -> (&'static str, String) {
    (err.kind(), err.to_string())
}

/// Build a JavaScript `Error` whose `name` is `name`.
pub fn js_error(name: &str, message: &str) -> JsValue {
    let err = js_sys::Error::new(message);
    err.set_name(name);
    err.into()
}

pub fn to_js_error(err: TransformError) -> JsValue {
    let (name, message) = describe(&err);
    js_error(name, &message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagekit_core::LoadError;

    #[test]
    fn test_describe_uses_kind_label() {
        let (name, message) = describe(&TransformError::Cancelled);
        assert_eq!(name, "CancelledError");
        assert_eq!(message, "Operation aborted");

        let (name, _) = describe(&TransformError::from(LoadError::EmptySource));
        assert_eq!(name, "LoadError");
    }
}
