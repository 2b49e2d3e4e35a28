//! Local-contrast sharpening.
//!
//! Every interior pixel is pushed away from the mean of its four direct
//! neighbours:
//!
//! ```text
//! out = clamp(current + (current - mean(N, S, E, W)) * intensity, 0, 255)
//! ```
//!
//! All reads come from a snapshot taken before the first write, so pixels
//! later in raster order never see already-sharpened neighbours. The
//! one-pixel border and the alpha channel are left untouched.

use tracing::debug;

use crate::directives::SharpenLevel;
use crate::surface::{PixelRect, PixelSurface, CHANNELS};

/// Sharpen `surface` in place. Level 0 leaves it untouched.
pub fn sharpen(surface: &mut PixelSurface, level: SharpenLevel) {
    let Some(intensity) = level.intensity() else {
        return;
    };
    if surface.width < 3 || surface.height < 3 {
        return;
    }

    debug!(
        width = surface.width,
        height = surface.height,
        level = level.level(),
        "Sharpening"
    );

    let snapshot = surface.get_pixels(PixelRect::full(surface));
    let stride = surface.width as usize * CHANNELS;
    let height = surface.height as usize;

    let process = |y: usize, row: &mut [u8]| {
        if y == 0 || y == height - 1 {
            return;
        }
        sharpen_row(&snapshot, stride, y, intensity, row);
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        surface
            .pixels
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| process(y, row));
    }

    #[cfg(not(feature = "parallel"))]
    {
        surface
            .pixels
            .chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| process(y, row));
    }
}

fn sharpen_row(snapshot: &[u8], stride: usize, y: usize, intensity: f32, row: &mut [u8]) {
    let width = stride / CHANNELS;
    let row_start = y * stride;

    for x in 1..width - 1 {
        let idx = row_start + x * CHANNELS;
        for c in 0..3 {
            let current = snapshot[idx + c] as f32;
            let neighbors = (snapshot[idx - stride + c] as f32
                + snapshot[idx + stride + c] as f32
                + snapshot[idx - CHANNELS + c] as f32
                + snapshot[idx + CHANNELS + c] as f32)
                / 4.0;

            let diff = (current - neighbors) * intensity;
            row[x * CHANNELS + c] = (current + diff).clamp(0.0, 255.0).round() as u8;
        }
    }
}
