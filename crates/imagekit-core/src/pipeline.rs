//! Pipeline orchestration and the caller-facing [`ImageKit`] handle.
//!
//! # Stage Order
//!
//! resolve dimensions → resample → rotate → crop shape → sharpen → encode.
//! Rotation runs on the resized image, the crop box is axis-aligned to the
//! rotated content and sharpening always sees the final pixel grid.

use tracing::{debug, instrument};

use crate::cancel::CancelToken;
use crate::dimensions::resolve_dimensions;
use crate::directives::{
    Algorithm, CropShape, DeliveryType, ResizeDirective, TransformDirectives,
};
use crate::encode::{encode_surface, to_data_url, OutputFormat};
use crate::error::{Result, TransformError};
use crate::load::{load, ImageSource};
use crate::surface::{PixelSurface, RasterBackend, SurfaceBackend};
use crate::transform::{clip_to_shape, resample, rotate, sharpen};

/// The final surface plus what the encoder needs to know about it.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub surface: PixelSurface,
    pub format: OutputFormat,
    pub quality: f32,
}

/// Encoded bytes tagged with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    /// Render as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        to_data_url(&self.bytes, &self.mime)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Run every pixel stage over `source`.
///
/// The output format is negotiated first, so an unsupported MIME type fails
/// before any pixel work is done.
///
/// # Errors
///
/// - [`TransformError::EncodeUnavailable`] for an unknown output format
/// - [`TransformError::InvalidSource`] for a zero-sized source
/// - [`TransformError::PixelBufferMismatch`] if the source buffer is not
///   `width * height * 4` bytes
/// - [`TransformError::SurfaceUnavailable`] if the backend refuses a surface
#[instrument(level = "debug", skip_all, fields(src_w = source.width, src_h = source.height))]
pub fn run_pipeline<B: SurfaceBackend + ?Sized>(
    backend: &B,
    source: &PixelSurface,
    directives: &TransformDirectives,
) -> Result<PipelineOutput> {
    let format: OutputFormat = directives.format.parse()?;

    let resize = directives
        .resize
        .map(ResizeDirective::normalized)
        .unwrap_or_default();
    let (target_w, target_h) = resolve_dimensions(source.width, source.height, &resize)?;
    source.validate()?;
    debug!(target_w, target_h, "Resolved target dimensions");

    let mut surface = resample(backend, source, target_w, target_h, directives.algorithm)?;

    if let Some(rotated) = rotate(backend, &surface, directives.rotate)? {
        surface = rotated;
    }

    let gravity = directives.gravity();
    if let Some(clipped) = clip_to_shape(
        backend,
        &surface,
        directives.crop_shape.as_ref(),
        gravity.as_ref(),
    )? {
        surface = clipped;
    }

    sharpen(&mut surface, directives.sharpen);

    debug!(
        width = surface.width,
        height = surface.height,
        format = format.mime_type(),
        "Pipeline finished"
    );

    Ok(PipelineOutput {
        surface,
        format,
        quality: directives.quality,
    })
}

fn check_cancelled(cancel: Option<&CancelToken>) -> Result<()> {
    match cancel {
        Some(token) if token.is_cancelled() => {
            debug!("Cancellation observed");
            Err(TransformError::Cancelled)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone)]
enum Input {
    Source(ImageSource),
    Surface(PixelSurface),
}

/// Fluent transform handle.
///
/// Every setter consumes the handle and returns the updated value, so a
/// configured `ImageKit` is an immutable description until a terminal
/// operation runs it.
///
/// ```ignore
/// use imagekit_core::{ImageKit, ImageSource, ResizeDirective, Algorithm};
///
/// let png = ImageKit::new(ImageSource::Bytes(bytes))
///     .resize(ResizeDirective::new().width(100))
///     .algorithm(Algorithm::Lanczos)
///     .sharpen(1)
///     .format("image/png")
///     .to_bytes(None)?;
/// ```
#[derive(Debug, Clone)]
pub struct ImageKit<B: SurfaceBackend = RasterBackend> {
    input: Input,
    directives: TransformDirectives,
    backend: B,
}

impl ImageKit<RasterBackend> {
    /// Transform an encoded source with the default raster backend.
    pub fn new(source: impl Into<ImageSource>) -> Self {
        Self {
            input: Input::Source(source.into()),
            directives: TransformDirectives::default(),
            backend: RasterBackend::default(),
        }
    }

    /// Transform an already decoded surface.
    pub fn from_surface(surface: PixelSurface) -> Self {
        Self {
            input: Input::Surface(surface),
            directives: TransformDirectives::default(),
            backend: RasterBackend::default(),
        }
    }
}

impl<B: SurfaceBackend> ImageKit<B> {
    /// Swap the surface backend. Resolved once here, never re-probed.
    pub fn with_backend<C: SurfaceBackend>(self, backend: C) -> ImageKit<C> {
        ImageKit {
            input: self.input,
            directives: self.directives,
            backend,
        }
    }

    /// Replace the whole directive set.
    pub fn with_directives(mut self, directives: TransformDirectives) -> Self {
        self.directives = directives;
        self
    }

    pub fn directives(&self) -> &TransformDirectives {
        &self.directives
    }

    pub fn delivery(mut self, delivery: DeliveryType) -> Self {
        self.directives = self.directives.delivery(delivery);
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.directives = self.directives.format(format);
        self
    }

    pub fn quality(mut self, quality: f32) -> Self {
        self.directives = self.directives.quality(quality);
        self
    }

    pub fn resize(mut self, resize: ResizeDirective) -> Self {
        self.directives = self.directives.resize(resize);
        self
    }

    pub fn sharpen(mut self, level: i64) -> Self {
        self.directives = self.directives.sharpen(level);
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.directives = self.directives.algorithm(algorithm);
        self
    }

    pub fn rotate(mut self, degrees: i64) -> Self {
        self.directives = self.directives.rotate(degrees);
        self
    }

    pub fn crop_as(mut self, shape: CropShape) -> Self {
        self.directives = self.directives.crop_as(shape);
        self
    }

    /// Load the source and run the pixel stages without encoding.
    pub fn render(&self) -> Result<PipelineOutput> {
        match &self.input {
            Input::Surface(surface) => run_pipeline(&self.backend, surface, &self.directives),
            Input::Source(source) => {
                let surface = load(source)?;
                run_pipeline(&self.backend, &surface, &self.directives)
            }
        }
    }

    /// Encode and render as a `data:` URL.
    pub fn to_data_url(&self) -> Result<String> {
        Ok(self.to_blob(None)?.to_data_url())
    }

    /// Encode the transformed image.
    ///
    /// `cancel` is checked right before and right after encoding. A cancel
    /// requested while pixels are still being processed is only observed
    /// once that work has finished.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Cancelled`] if the token fired, otherwise
    /// whatever the loader, backend or encoder reported.
    pub fn to_blob(&self, cancel: Option<&CancelToken>) -> Result<EncodedImage> {
        let output = self.render()?;

        check_cancelled(cancel)?;
        let bytes = encode_surface(&output.surface, output.format, output.quality)?;
        check_cancelled(cancel)?;

        Ok(EncodedImage {
            mime: output.format.mime_type().to_string(),
            bytes,
        })
    }

    /// Encoded bytes. Same as [`Self::to_blob`] without the MIME tag.
    pub fn to_bytes(&self, cancel: Option<&CancelToken>) -> Result<Vec<u8>> {
        Ok(self.to_blob(cancel)?.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::{AspectRatio, NamedGravity};

    fn gradient(width: u32, height: u32) -> PixelSurface {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 7 + y * 13) % 256) as u8;
                pixels.extend_from_slice(&[v, 255 - v, (x % 256) as u8, 255]);
            }
        }
        PixelSurface::new(width, height, pixels)
    }

    struct NoSurfaces;

    impl SurfaceBackend for NoSurfaces {
        fn create_surface(&self, _width: u32, _height: u32) -> Result<PixelSurface> {
            Err(TransformError::SurfaceUnavailable("headless".to_string()))
        }

        fn draw_image(
            &self,
            _dest: &mut PixelSurface,
            _src: &PixelSurface,
            _src_rect: Option<crate::surface::Rect>,
            _dest_rect: crate::surface::Rect,
            _smoothing: crate::surface::Smoothing,
        ) -> Result<()> {
            Err(TransformError::SurfaceUnavailable("headless".to_string()))
        }
    }

    #[test]
    fn test_end_to_end_resize_and_sharpen() {
        let source = gradient(400, 300);
        let resize = ResizeDirective::new()
            .width(100)
            .aspect_ratio(AspectRatio::Original);

        let sharpened = run_pipeline(
            &RasterBackend::default(),
            &source,
            &TransformDirectives::new()
                .resize(resize)
                .algorithm(Algorithm::Lanczos)
                .sharpen(1),
        )
        .unwrap();
        let plain = run_pipeline(
            &RasterBackend::default(),
            &source,
            &TransformDirectives::new()
                .resize(resize)
                .algorithm(Algorithm::Lanczos),
        )
        .unwrap();

        assert_eq!(
            (sharpened.surface.width, sharpened.surface.height),
            (100, 75)
        );
        assert_eq!((plain.surface.width, plain.surface.height), (100, 75));
        assert_ne!(sharpened.surface.pixels, plain.surface.pixels);
    }

    #[test]
    fn test_defaults_in_output() {
        let out = run_pipeline(
            &RasterBackend::default(),
            &gradient(8, 8),
            &TransformDirectives::new(),
        )
        .unwrap();
        assert_eq!(out.format, OutputFormat::Jpeg);
        assert!((out.quality - 0.9).abs() < f32::EPSILON);
        assert_eq!((out.surface.width, out.surface.height), (8, 8));
    }

    #[test]
    fn test_full_turn_is_identity() {
        let source = gradient(12, 9);
        let base = TransformDirectives::new().algorithm(Algorithm::Standard);
        let unrotated = run_pipeline(&RasterBackend::default(), &source, &base).unwrap();
        let turned = run_pipeline(
            &RasterBackend::default(),
            &source,
            &base.clone().rotate(360),
        )
        .unwrap();
        assert_eq!(unrotated.surface, turned.surface);
    }

    #[test]
    fn test_quarter_turn_swaps_axes() {
        let out = run_pipeline(
            &RasterBackend::default(),
            &gradient(40, 20),
            &TransformDirectives::new().rotate(90),
        )
        .unwrap();
        assert_eq!((out.surface.width, out.surface.height), (20, 40));
    }

    #[test]
    fn test_circle_crop_after_resize() {
        let out = run_pipeline(
            &RasterBackend::default(),
            &gradient(400, 200),
            &TransformDirectives::new()
                .resize(ResizeDirective::new().width(200))
                .crop_as(CropShape::circle()),
        )
        .unwrap();
        assert_eq!((out.surface.width, out.surface.height), (100, 100));
        assert_eq!(out.surface.pixel(0, 0)[3], 0);
        assert_eq!(out.surface.pixel(99, 99)[3], 0);
        assert_eq!(out.surface.pixel(50, 50)[3], 255);
    }

    #[test]
    fn test_crop_uses_resize_gravity() {
        let mut source = PixelSurface::transparent(20, 10);
        for y in 0..10 {
            for x in 0..20 {
                let v = if x < 10 { 10 } else { 240 };
                source.set_pixel(x, y, [v, v, v, 255]);
            }
        }
        let out = run_pipeline(
            &RasterBackend::default(),
            &source,
            &TransformDirectives::new()
                .resize(ResizeDirective::new().gravity(NamedGravity::Right))
                .crop_as(CropShape::square()),
        )
        .unwrap();
        assert_eq!((out.surface.width, out.surface.height), (10, 10));
        assert_eq!(out.surface.pixel(5, 5), [240, 240, 240, 255]);
    }

    #[test]
    fn test_unknown_format_fails_before_pixel_work() {
        let err = run_pipeline(
            &NoSurfaces,
            &gradient(4, 4),
            &TransformDirectives::new().format("image/gif"),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::EncodeUnavailable(ref m) if m == "image/gif"));
    }

    #[test]
    fn test_surface_unavailable_propagates() {
        let err = ImageKit::from_surface(gradient(8, 8))
            .with_backend(NoSurfaces)
            .algorithm(Algorithm::Standard)
            .to_bytes(None)
            .unwrap_err();
        assert_eq!(err.kind(), "SurfaceUnavailable");
    }

    #[test]
    fn test_zero_sized_source() {
        let err = run_pipeline(
            &RasterBackend::default(),
            &PixelSurface::transparent(0, 3),
            &TransformDirectives::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TransformError::InvalidSource {
                width: 0,
                height: 3
            }
        ));
    }

    #[test]
    fn test_short_pixel_buffer_is_rejected() {
        let malformed = PixelSurface {
            width: 4,
            height: 4,
            pixels: vec![0; 8],
        };
        let err = ImageKit::from_surface(malformed).to_bytes(None).unwrap_err();
        assert!(matches!(
            err,
            TransformError::PixelBufferMismatch {
                expected: 64,
                actual: 8
            }
        ));
        assert_eq!(err.kind(), "PixelBufferMismatch");
    }

    #[test]
    fn test_cancelled_token() {
        let token = CancelToken::new();
        token.cancel();
        let err = ImageKit::from_surface(gradient(8, 8))
            .to_blob(Some(&token))
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_live_token_completes() {
        let token = CancelToken::new();
        let blob = ImageKit::from_surface(gradient(8, 8))
            .format("image/png")
            .to_blob(Some(&token))
            .unwrap();
        assert_eq!(blob.mime, "image/png");
        assert_eq!(&blob.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_to_bytes_matches_blob() {
        let kit = ImageKit::from_surface(gradient(10, 6)).format("image/png");
        assert_eq!(kit.to_bytes(None).unwrap(), kit.to_blob(None).unwrap().bytes);
    }

    #[test]
    fn test_data_url_prefix() {
        let url = ImageKit::from_surface(gradient(6, 6)).to_data_url().unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,/9j/"));
    }

    #[test]
    fn test_builder_passthroughs() {
        let kit = ImageKit::from_surface(gradient(2, 2))
            .delivery(DeliveryType::Element)
            .format("image/png")
            .quality(0.5)
            .resize(ResizeDirective::thumbnail().width(1))
            .sharpen(5)
            .algorithm(Algorithm::Multistep)
            .rotate(-90)
            .crop_as(CropShape::circle());
        let d = kit.directives();
        assert_eq!(d.delivery, Some(DeliveryType::Element));
        assert_eq!(d.format, "image/png");
        assert!((d.quality - 0.5).abs() < f32::EPSILON);
        assert_eq!(d.sharpen.level(), 2);
        assert_eq!(d.algorithm, Algorithm::Multistep);
        assert_eq!(d.rotate.degrees(), 270);
        assert_eq!(d.crop_shape, Some(CropShape::Circle));
    }

    #[test]
    fn test_load_error_from_bytes() {
        let err = ImageKit::new(vec![1u8, 2, 3]).to_bytes(None).unwrap_err();
        assert_eq!(err.kind(), "LoadError");
    }
}
