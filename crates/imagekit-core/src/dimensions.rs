//! Target dimension resolution.
//!
//! Turns a [`ResizeDirective`] and the source size into the exact size the
//! resampler produces. Explicit `W:H` ratios are height-driven: the width is
//! always derived from the (explicit or inherited) height.

use crate::directives::{AspectRatio, CropMode, ResizeDirective};
use crate::error::{Result, TransformError};

/// Resolve the resample target for a `src_w` x `src_h` source.
///
/// # Errors
///
/// Returns [`TransformError::InvalidSource`] if either source axis is zero.
pub fn resolve_dimensions(
    src_w: u32,
    src_h: u32,
    directive: &ResizeDirective,
) -> Result<(u32, u32)> {
    if src_w == 0 || src_h == 0 {
        return Err(TransformError::InvalidSource {
            width: src_w,
            height: src_h,
        });
    }

    let width = directive.explicit_width();
    let height = directive.explicit_height();
    let src_aspect = src_w as f64 / src_h as f64;

    let mut target_w = width.unwrap_or(src_w) as f64;
    let mut target_h = height.unwrap_or(src_h) as f64;

    match directive.aspect_ratio {
        Some(AspectRatio::Original) => match (width, height) {
            (None, Some(_)) => target_w = (target_h * src_aspect).round(),
            (Some(_), None) => target_h = (target_w / src_aspect).round(),
            _ => {}
        },
        Some(AspectRatio::Ratio { width: a, height: b }) => {
            target_w = (target_h * a / b).round();
        }
        None => {}
    }

    if directive.crop_mode == Some(CropMode::Thumb) {
        let target_aspect = target_w / target_h;
        if src_aspect > target_aspect {
            target_w = (target_h * src_aspect).round();
        } else {
            target_h = (target_w / src_aspect).round();
        }
    }

    Ok((to_dimension(target_w), to_dimension(target_h)))
}

#[inline]
fn to_dimension(value: f64) -> u32 {
    value.round().clamp(1.0, u32::MAX as f64) as u32
}
