//! Pixel surfaces and the drawing backend they are produced by.
//!
//! Every pipeline stage that changes dimensions asks a [`SurfaceBackend`] for
//! a fresh [`PixelSurface`] and draws into it. The backend is chosen once when
//! the [`crate::ImageKit`] is built; stages never probe for capabilities.
//!
//! # Pixel Layout
//!
//! Surfaces hold RGBA8 data in row-major order, 4 bytes per pixel,
//! unpremultiplied. A freshly created surface is fully transparent.

use image::imageops::FilterType;
use image::{ImageBuffer, Rgba, RgbaImage};
use tracing::trace;

use crate::error::{Result, TransformError};

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// A mutable RGBA raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSurface {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// RGBA pixel data in row-major order (4 bytes per pixel).
    /// Length should be width * height * 4.
    pub pixels: Vec<u8>,
}

impl PixelSurface {
    /// Create a surface from dimensions and RGBA pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * CHANNELS,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a fully transparent surface.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * CHANNELS],
        }
    }

    /// Create a surface from an `image::RgbaImage`.
    pub fn from_rgba_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Borrow the pixel data as an image view without copying.
    pub(crate) fn as_image_view(&self) -> Option<ImageBuffer<Rgba<u8>, &[u8]>> {
        ImageBuffer::from_raw(self.width, self.height, self.pixels.as_slice())
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check that the buffer holds exactly `width * height * 4` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::PixelBufferMismatch`] otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.pixels.len() != self.pixel_count() * CHANNELS {
            return Err(buffer_mismatch(self));
        }
        Ok(())
    }

    /// Check if this surface has no area.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Read one pixel. Coordinates must be in bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = self.index(x, y);
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Write one pixel. Coordinates must be in bounds.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: [u8; 4]) {
        let idx = self.index(x, y);
        self.pixels[idx..idx + CHANNELS].copy_from_slice(&value);
    }

    /// Read one pixel, returning transparent black outside the surface.
    #[inline]
    pub fn pixel_or_transparent(&self, x: i64, y: i64) -> [u8; 4] {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return [0, 0, 0, 0];
        }
        self.pixel(x as u32, y as u32)
    }

    /// Copy the pixels of `rect` out of the surface.
    ///
    /// The rectangle is clipped to the surface; pixels outside it are
    /// returned as transparent black so the result is always
    /// `rect.width * rect.height * 4` bytes.
    pub fn get_pixels(&self, rect: PixelRect) -> Vec<u8> {
        let mut out = Vec::with_capacity(rect.width as usize * rect.height as usize * CHANNELS);
        for y in 0..rect.height as i64 {
            for x in 0..rect.width as i64 {
                let p = self.pixel_or_transparent(rect.x as i64 + x, rect.y as i64 + y);
                out.extend_from_slice(&p);
            }
        }
        out
    }

    /// Write `data` into `rect`.
    ///
    /// Rows and columns falling outside the surface are skipped.
    pub fn put_pixels(&mut self, rect: PixelRect, data: &[u8]) -> Result<()> {
        let expected = rect.width as usize * rect.height as usize * CHANNELS;
        if data.len() != expected {
            return Err(TransformError::PixelBufferMismatch {
                expected,
                actual: data.len(),
            });
        }

        for y in 0..rect.height {
            let dy = rect.y.saturating_add(y);
            if dy >= self.height {
                break;
            }
            let cols = rect.width.min(self.width.saturating_sub(rect.x));
            if cols == 0 {
                break;
            }
            let src_start = (y * rect.width) as usize * CHANNELS;
            let dst_start = self.index(rect.x, dy);
            let len = cols as usize * CHANNELS;
            self.pixels[dst_start..dst_start + len]
                .copy_from_slice(&data[src_start..src_start + len]);
        }
        Ok(())
    }
}

/// Integer rectangle used for raw pixel access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle covering a whole surface.
    pub fn full(surface: &PixelSurface) -> Self {
        Self::new(0, 0, surface.width, surface.height)
    }
}

/// Floating-point rectangle used for drawing. Offsets may be negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin with the given size.
    pub fn sized(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }
}

/// Interpolation quality requested for a scaled draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Smoothing {
    /// Nearest neighbour sampling.
    Disabled,
    /// Bilinear interpolation.
    #[default]
    Standard,
    /// Bicubic interpolation, used for staged downscaling.
    High,
}

impl Smoothing {
    /// Convert to the image crate's filter type.
    pub fn to_image_filter(self) -> FilterType {
        match self {
            Smoothing::Disabled => FilterType::Nearest,
            Smoothing::Standard => FilterType::Triangle,
            Smoothing::High => FilterType::CatmullRom,
        }
    }
}

/// Drawing capability used by every pipeline stage.
///
/// Implementations decide how surfaces are allocated and how scaled blits
/// are performed. The pipeline only talks to this trait.
pub trait SurfaceBackend {
    /// Allocate a transparent surface.
    ///
    /// Fails with [`TransformError::SurfaceUnavailable`] when the backend
    /// cannot provide a surface of that size.
    fn create_surface(&self, width: u32, height: u32) -> Result<PixelSurface>;

    /// Draw `src_rect` of `src` (or all of it) scaled into `dest_rect` of
    /// `dest`, replacing the destination pixels it covers.
    fn draw_image(
        &self,
        dest: &mut PixelSurface,
        src: &PixelSurface,
        src_rect: Option<Rect>,
        dest_rect: Rect,
        smoothing: Smoothing,
    ) -> Result<()>;
}

/// Largest edge accepted by [`RasterBackend`] by default.
pub const DEFAULT_MAX_EDGE: u32 = 32_767;

/// Largest pixel count accepted by [`RasterBackend`] by default.
pub const DEFAULT_MAX_PIXELS: u64 = 268_435_456;

/// In-memory backend built on `image::imageops`.
///
/// Samples requested outside a source surface read as transparent black.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterBackend {
    max_edge: u32,
    max_pixels: u64,
}

impl Default for RasterBackend {
    fn default() -> Self {
        Self {
            max_edge: DEFAULT_MAX_EDGE,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl RasterBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with custom allocation limits.
    pub fn with_limits(max_edge: u32, max_pixels: u64) -> Self {
        Self {
            max_edge,
            max_pixels,
        }
    }
}

impl SurfaceBackend for RasterBackend {
    fn create_surface(&self, width: u32, height: u32) -> Result<PixelSurface> {
        if width == 0 || height == 0 {
            return Err(TransformError::SurfaceUnavailable(format!(
                "cannot allocate a {width}x{height} surface"
            )));
        }
        if width > self.max_edge
            || height > self.max_edge
            || width as u64 * height as u64 > self.max_pixels
        {
            return Err(TransformError::SurfaceUnavailable(format!(
                "{width}x{height} exceeds the backend limit"
            )));
        }
        Ok(PixelSurface::transparent(width, height))
    }

    fn draw_image(
        &self,
        dest: &mut PixelSurface,
        src: &PixelSurface,
        src_rect: Option<Rect>,
        dest_rect: Rect,
        smoothing: Smoothing,
    ) -> Result<()> {
        let src_rect = src_rect.unwrap_or_else(|| Rect::sized(src.width, src.height));
        let out_w = dest_rect.width.round().max(0.0) as u32;
        let out_h = dest_rect.height.round().max(0.0) as u32;
        if out_w == 0 || out_h == 0 {
            return Ok(());
        }

        trace!(
            src_w = src_rect.width,
            src_h = src_rect.height,
            out_w,
            out_h,
            ?smoothing,
            "draw_image"
        );

        let whole_source = src_rect.x == 0.0
            && src_rect.y == 0.0
            && src_rect.width == src.width as f64
            && src_rect.height == src.height as f64;

        let drawn = if whole_source && out_w == src.width && out_h == src.height {
            src.clone()
        } else if whole_source {
            let view = src.as_image_view().ok_or_else(|| buffer_mismatch(src))?;
            let scaled = image::imageops::resize(&view, out_w, out_h, smoothing.to_image_filter());
            PixelSurface::from_rgba_image(scaled)
        } else {
            let region = extract_region(src, src_rect);
            if region.width == out_w && region.height == out_h {
                region
            } else {
                let view = region.as_image_view().ok_or_else(|| buffer_mismatch(&region))?;
                let scaled =
                    image::imageops::resize(&view, out_w, out_h, smoothing.to_image_filter());
                PixelSurface::from_rgba_image(scaled)
            }
        };

        blit(dest, &drawn, dest_rect.x.round() as i64, dest_rect.y.round() as i64)
    }
}

fn buffer_mismatch(surface: &PixelSurface) -> TransformError {
    TransformError::PixelBufferMismatch {
        expected: surface.pixel_count() * CHANNELS,
        actual: surface.pixels.len(),
    }
}

/// Copy `rect` of `src` into a new surface, filling out-of-bounds samples
/// with transparent black.
fn extract_region(src: &PixelSurface, rect: Rect) -> PixelSurface {
    let w = rect.width.round().max(1.0) as u32;
    let h = rect.height.round().max(1.0) as u32;
    let ox = rect.x.round() as i64;
    let oy = rect.y.round() as i64;

    let mut out = PixelSurface::transparent(w, h);
    for y in 0..h {
        for x in 0..w {
            let p = src.pixel_or_transparent(ox + x as i64, oy + y as i64);
            out.set_pixel(x, y, p);
        }
    }
    out
}

/// Copy `src` into `dest` at `(ox, oy)`, clipped to `dest`.
fn blit(dest: &mut PixelSurface, src: &PixelSurface, ox: i64, oy: i64) -> Result<()> {
    if ox >= 0 && oy >= 0 && ox <= u32::MAX as i64 && oy <= u32::MAX as i64 {
        let rect = PixelRect::new(ox as u32, oy as u32, src.width, src.height);
        return dest.put_pixels(rect, &src.pixels);
    }

    for y in 0..src.height as i64 {
        let dy = oy + y;
        if dy < 0 || dy >= dest.height as i64 {
            continue;
        }
        for x in 0..src.width as i64 {
            let dx = ox + x;
            if dx < 0 || dx >= dest.width as i64 {
                continue;
            }
            dest.set_pixel(dx as u32, dy as u32, src.pixel(x as u32, y as u32));
        }
    }
    Ok(())
}
