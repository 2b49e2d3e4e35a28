//! ImageKit Core - Image transform pipeline
//!
//! This crate loads an image, resizes it (standard, Lanczos or multistep),
//! rotates it, clips it to a shape, sharpens it and encodes the result as
//! JPEG or PNG bytes or a `data:` URL.
//!
//! The caller-facing entry point is [`ImageKit`]; the individual stages are
//! exposed under [`transform`] for callers that manage their own surfaces.

pub mod cancel;
pub mod dimensions;
pub mod directives;
pub mod encode;
pub mod error;
pub mod kernel;
pub mod load;
pub mod pipeline;
pub mod surface;
pub mod transform;

pub use cancel::CancelToken;
pub use dimensions::resolve_dimensions;
pub use directives::{
    Algorithm, AspectRatio, CropMode, CropShape, DeliveryType, Gravity, NamedGravity,
    ResizeDirective, RotationAngle, SharpenLevel, TransformDirectives,
};
pub use encode::{EncodeError, OutputFormat};
pub use error::{Result, TransformError};
pub use load::{ImageSource, LoadError};
pub use pipeline::{run_pipeline, EncodedImage, ImageKit, PipelineOutput};
pub use surface::{PixelRect, PixelSurface, RasterBackend, Rect, Smoothing, SurfaceBackend};
