//! Rotation onto an enlarged canvas.
//!
//! The output surface is the axis-aligned bounding box of the rotated
//! source, so no corner is clipped; the padding around the rotated content
//! is transparent. Positive angles rotate clockwise on screen.
//!
//! # Algorithm
//!
//! The rotation uses inverse mapping: for each pixel centre in the output,
//! we calculate which source point maps onto it and sample there with
//! bilinear interpolation on premultiplied values.
//!
//! For rotation by angle θ (y axis pointing down), the inverse transform is:
//! ```text
//! src_x =  (dst_x - dst_cx) * cos(θ) + (dst_y - dst_cy) * sin(θ) + src_cx
//! src_y = -(dst_x - dst_cx) * sin(θ) + (dst_y - dst_cy) * cos(θ) + src_cy
//! ```
//!
//! Quarter turns use exact sine and cosine values, which makes them a pure
//! pixel permutation.

use tracing::debug;

use crate::directives::RotationAngle;
use crate::error::Result;
use crate::surface::{PixelSurface, SurfaceBackend};

/// Compute the dimensions of the bounding box for a rotated image.
///
/// # Arguments
///
/// * `width` - Original image width
/// * `height` - Original image height
/// * `angle_degrees` - Rotation angle in degrees
///
/// # Returns
///
/// Tuple of (new_width, new_height), each at least 1.
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let abs_angle = angle_degrees.rem_euclid(360.0);

    // Fast path: no rotation needed (including near-zero and multiples of 360)
    if abs_angle < 0.001 || (360.0 - abs_angle) < 0.001 {
        return (width, height);
    }

    // Fast path: exact 90/270 degree rotations (swap dimensions)
    if (abs_angle - 90.0).abs() < 0.001 || (abs_angle - 270.0).abs() < 0.001 {
        return (height, width);
    }

    // Fast path: exact 180 degree rotation (same dimensions)
    if (abs_angle - 180.0).abs() < 0.001 {
        return (width, height);
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Rotate `surface` by `angle` around its centre.
///
/// Returns `None` for a zero angle so the caller keeps its surface.
///
/// # Errors
///
/// Propagates [`crate::TransformError::SurfaceUnavailable`] from the backend.
pub fn rotate<B: SurfaceBackend + ?Sized>(
    backend: &B,
    surface: &PixelSurface,
    angle: RotationAngle,
) -> Result<Option<PixelSurface>> {
    if angle.is_zero() {
        return Ok(None);
    }

    let degrees = angle.degrees();
    let (dst_w, dst_h) = compute_rotated_bounds(surface.width, surface.height, degrees as f64);
    debug!(
        degrees,
        src_w = surface.width,
        src_h = surface.height,
        dst_w,
        dst_h,
        "Rotating"
    );

    let (sin, cos) = match degrees {
        90 => (1.0, 0.0),
        180 => (0.0, -1.0),
        270 => (-1.0, 0.0),
        _ => angle.radians().sin_cos(),
    };

    let src_cx = surface.width as f64 / 2.0;
    let src_cy = surface.height as f64 / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let mut output = backend.create_surface(dst_w, dst_h)?;

    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            let dx = dst_x as f64 + 0.5 - dst_cx;
            let dy = dst_y as f64 + 0.5 - dst_cy;

            // Source point in pixel-index space (centre of pixel i is i + 0.5)
            let src_x = dx * cos + dy * sin + src_cx - 0.5;
            let src_y = -dx * sin + dy * cos + src_cy - 0.5;

            output.set_pixel(dst_x, dst_y, sample_bilinear(surface, src_x, src_y));
        }
    }

    Ok(Some(output))
}

/// Sample a pixel using bilinear interpolation on premultiplied values.
///
/// Points outside the source blend towards transparent.
fn sample_bilinear(surface: &PixelSurface, x: f64, y: f64) -> [u8; 4] {
    if x <= -1.0 || y <= -1.0 || x >= surface.width as f64 || y >= surface.height as f64 {
        return [0, 0, 0, 0];
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    // Fractional distances
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1, y0, fx * (1.0 - fy)),
        (x0, y0 + 1, (1.0 - fx) * fy),
        (x0 + 1, y0 + 1, fx * fy),
    ];

    let mut color = [0.0f64; 3];
    let mut alpha = 0.0f64;
    for (px, py, weight) in taps {
        if weight == 0.0 {
            continue;
        }
        let p = surface.pixel_or_transparent(px, py);
        let a = p[3] as f64 * weight;
        for c in 0..3 {
            color[c] += p[c] as f64 * a;
        }
        alpha += a;
    }

    if alpha <= 0.0 {
        return [0, 0, 0, 0];
    }

    [
        (color[0] / alpha).round().clamp(0.0, 255.0) as u8,
        (color[1] / alpha).round().clamp(0.0, 255.0) as u8,
        (color[2] / alpha).round().clamp(0.0, 255.0) as u8,
        alpha.round().clamp(0.0, 255.0) as u8,
    ]
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Bounds are symmetric in the sign of the angle.
        #[test]
        fn prop_bounds_symmetric(
            width in 1u32..=500,
            height in 1u32..=500,
            angle in 0.0f64..360.0,
        ) {
            prop_assert_eq!(
                compute_rotated_bounds(width, height, angle),
                compute_rotated_bounds(width, height, -angle)
            );
        }

        /// Property: Bounds always contain the original area.
        #[test]
        fn prop_bounds_contain_source_area(
            width in 1u32..=500,
            height in 1u32..=500,
            angle in 0.0f64..360.0,
        ) {
            let (w, h) = compute_rotated_bounds(width, height, angle);
            prop_assert!(w as u64 * h as u64 + w as u64 + h as u64 + 1 >= width as u64 * height as u64);
        }
    }
}
