//! Shape cropping with gravity-aware placement.
//!
//! The crop box size comes from the [`CropShape`], its position from the
//! [`Gravity`], and the final mask from a [`ClipPath`] evaluated at pixel
//! centres. Pixels outside the path are fully transparent.
//!
//! # Bounds
//!
//! Declared crop sizes and explicit offsets are not checked against the
//! surface. Offsets may go negative; samples that fall outside the source
//! come back transparent from the backend. Fractional offsets (a centred
//! box on an odd free span, say `50.5`) are snapped to the nearest whole
//! pixel when the region is copied, so `50.5` samples from column `51`.

use tracing::debug;

use crate::directives::{CropShape, Gravity, NamedGravity, DEFAULT_CORNER_RADIUS};
use crate::error::Result;
use crate::surface::{PixelSurface, Rect, Smoothing, SurfaceBackend, CHANNELS};

/// Mask applied to the cropped surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClipPath {
    /// The full crop box.
    Rect { width: f64, height: f64 },
    /// Circle centred at `(cx, cy)`.
    Circle { cx: f64, cy: f64, radius: f64 },
    /// Crop box with quarter-circle corners.
    RoundedRect { width: f64, height: f64, radius: f64 },
}

impl ClipPath {
    /// Build the path for `shape` on a `width` x `height` crop box.
    pub fn for_shape(shape: &CropShape, width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        match shape {
            CropShape::Circle => ClipPath::Circle {
                cx: w / 2.0,
                cy: h / 2.0,
                radius: w.min(h) / 2.0,
            },
            CropShape::RoundedRect { radius, .. } => {
                let mut r = if *radius > 0.0 {
                    *radius
                } else {
                    DEFAULT_CORNER_RADIUS
                };
                if w < 2.0 * r {
                    r = w / 2.0;
                }
                if h < 2.0 * r {
                    r = h / 2.0;
                }
                ClipPath::RoundedRect {
                    width: w,
                    height: h,
                    radius: r,
                }
            }
            CropShape::Square | CropShape::Rectangle { .. } => ClipPath::Rect {
                width: w,
                height: h,
            },
        }
    }

    /// Whether the point `(x, y)` lies inside the path.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match *self {
            ClipPath::Rect { width, height } => x >= 0.0 && y >= 0.0 && x <= width && y <= height,
            ClipPath::Circle { cx, cy, radius } => {
                let (dx, dy) = (x - cx, y - cy);
                dx * dx + dy * dy <= radius * radius
            }
            ClipPath::RoundedRect {
                width,
                height,
                radius,
            } => {
                if x < 0.0 || y < 0.0 || x > width || y > height {
                    return false;
                }
                // Distance into the nearest corner square, if any
                let cx = if x < radius {
                    radius - x
                } else if x > width - radius {
                    x - (width - radius)
                } else {
                    return true;
                };
                let cy = if y < radius {
                    radius - y
                } else if y > height - radius {
                    y - (height - radius)
                } else {
                    return true;
                };
                cx * cx + cy * cy <= radius * radius
            }
        }
    }
}

/// Size of the crop box for `shape` on a `width` x `height` surface.
pub fn crop_size(width: u32, height: u32, shape: &CropShape) -> (u32, u32) {
    match *shape {
        CropShape::Circle | CropShape::Square => {
            let side = width.min(height);
            (side, side)
        }
        CropShape::Rectangle {
            width: cw,
            height: ch,
        }
        | CropShape::RoundedRect {
            width: cw,
            height: ch,
            ..
        } => (
            cw.filter(|&v| v > 0).unwrap_or(width),
            ch.filter(|&v| v > 0).unwrap_or(height),
        ),
    }
}

/// Top-left source offset of a `crop_w` x `crop_h` box on a `width` x
/// `height` surface.
///
/// Named positions centre the box along the free axis and align it flush
/// along the named one. Explicit offsets are returned verbatim.
pub fn crop_offset(
    width: u32,
    height: u32,
    crop_w: u32,
    crop_h: u32,
    gravity: Option<&Gravity>,
) -> (f64, f64) {
    let named = match gravity {
        Some(Gravity::Offset { x, y }) => return (*x, *y),
        Some(Gravity::Named(named)) => *named,
        None => NamedGravity::Center,
    };

    let free_x = width as f64 - crop_w as f64;
    let free_y = height as f64 - crop_h as f64;

    match named {
        NamedGravity::Top => (free_x / 2.0, 0.0),
        NamedGravity::Bottom => (free_x / 2.0, free_y),
        NamedGravity::Left => (0.0, free_y / 2.0),
        NamedGravity::Right => (free_x, free_y / 2.0),
        NamedGravity::TopLeft => (0.0, 0.0),
        NamedGravity::TopRight => (free_x, 0.0),
        NamedGravity::BottomLeft => (0.0, free_y),
        NamedGravity::BottomRight => (free_x, free_y),
        NamedGravity::Center | NamedGravity::Auto => (free_x / 2.0, free_y / 2.0),
    }
}

/// Make every pixel whose centre lies outside `path` transparent.
pub fn apply_clip(surface: &mut PixelSurface, path: &ClipPath) {
    let width = surface.width as usize;
    for (i, pixel) in surface.pixels.chunks_exact_mut(CHANNELS).enumerate() {
        let x = (i % width) as f64 + 0.5;
        let y = (i / width) as f64 + 0.5;
        if !path.contains(x, y) {
            pixel.fill(0);
        }
    }
}

/// Crop `surface` to `shape`, placed according to `gravity`.
///
/// Returns `None` when no shape is requested, so the caller keeps its
/// surface.
pub fn clip_to_shape<B: SurfaceBackend + ?Sized>(
    backend: &B,
    surface: &PixelSurface,
    shape: Option<&CropShape>,
    gravity: Option<&Gravity>,
) -> Result<Option<PixelSurface>> {
    let Some(shape) = shape else {
        return Ok(None);
    };

    let (crop_w, crop_h) = crop_size(surface.width, surface.height, shape);
    let (offset_x, offset_y) = crop_offset(surface.width, surface.height, crop_w, crop_h, gravity);

    debug!(
        ?shape,
        crop_w,
        crop_h,
        offset_x,
        offset_y,
        "Clipping to shape"
    );

    let mut cropped = backend.create_surface(crop_w, crop_h)?;
    backend.draw_image(
        &mut cropped,
        surface,
        Some(Rect::new(offset_x, offset_y, crop_w as f64, crop_h as f64)),
        Rect::sized(crop_w, crop_h),
        Smoothing::Disabled,
    )?;

    apply_clip(&mut cropped, &ClipPath::for_shape(shape, crop_w, crop_h));
    Ok(Some(cropped))
}
