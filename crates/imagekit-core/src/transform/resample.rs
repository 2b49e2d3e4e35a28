//! Resampling to the resolved target size.
//!
//! Three strategies are available through [`Algorithm`]:
//! - **Lanczos**: direct windowed-sinc resampling, used verbatim at every
//!   scale factor
//! - **Standard** / **Multistep**: a single scaled blit through the surface
//!   backend, or a staged shrink when the reduction is larger than 2x
//!
//! # Lanczos Sampling
//!
//! Each destination pixel `(x, y)` maps to the source point
//! `(x * src_w / dst_w, y * src_h / dst_h)`. Every source pixel within the
//! 3-pixel radius box around that point is weighted by
//! [`distance_weight`]; pixels with non-positive weight are skipped and the
//! sum is normalized by the weights that were kept. Alpha is filtered like
//! the colour channels.
//!
//! # Staged Shrink
//!
//! A single large reduction through a bilinear blit aliases. Below a scale
//! factor of 0.5 the image is shrunk in `ceil(log2(1 / scale))` steps, each
//! to 70% of the previous size but never below the target, and the last
//! step lands exactly on the target.

use tracing::{debug, trace};

use crate::directives::Algorithm;
use crate::error::Result;
use crate::kernel::{distance_weight, LANCZOS_RADIUS};
use crate::surface::{PixelSurface, Rect, Smoothing, SurfaceBackend, CHANNELS};

/// Per-step shrink factor of the staged path.
pub const STEP_FACTOR: f64 = 0.7;

/// Resample `source` to `target_w` x `target_h`.
///
/// # Errors
///
/// Propagates [`crate::TransformError::SurfaceUnavailable`] from the backend.
pub fn resample<B: SurfaceBackend + ?Sized>(
    backend: &B,
    source: &PixelSurface,
    target_w: u32,
    target_h: u32,
    algorithm: Algorithm,
) -> Result<PixelSurface> {
    debug!(
        src_w = source.width,
        src_h = source.height,
        target_w,
        target_h,
        ?algorithm,
        "Resampling"
    );

    match algorithm {
        Algorithm::Lanczos => resample_lanczos(backend, source, target_w, target_h),
        Algorithm::Standard | Algorithm::Multistep => {
            resample_staged(backend, source, target_w, target_h)
        }
    }
}

/// Ratio of the smaller axis scale, `min(dst_w / src_w, dst_h / src_h)`.
pub fn scale_factor(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> f64 {
    (target_w as f64 / src_w as f64).min(target_h as f64 / src_h as f64)
}

/// Sizes of every blit the staged path performs, in order.
///
/// A scale factor of 0.5 or more yields a single direct blit. The last entry
/// is always `(target_w, target_h)`.
pub fn plan_multistep(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> Vec<(u32, u32)> {
    let scale = scale_factor(src_w, src_h, target_w, target_h);
    if scale >= 0.5 {
        return vec![(target_w, target_h)];
    }

    let steps = (1.0 / scale).log2().ceil() as usize;
    let mut plan = Vec::with_capacity(steps);
    let (mut current_w, mut current_h) = (src_w, src_h);

    for step in 0..steps {
        let (w, h) = if step == steps - 1 {
            (target_w, target_h)
        } else {
            (
                target_w.max((current_w as f64 * STEP_FACTOR).round() as u32),
                target_h.max((current_h as f64 * STEP_FACTOR).round() as u32),
            )
        };
        plan.push((w, h));
        current_w = w;
        current_h = h;
    }

    plan
}

fn resample_staged<B: SurfaceBackend + ?Sized>(
    backend: &B,
    source: &PixelSurface,
    target_w: u32,
    target_h: u32,
) -> Result<PixelSurface> {
    let plan = plan_multistep(source.width, source.height, target_w, target_h);

    if plan.len() == 1 {
        let mut dest = backend.create_surface(target_w, target_h)?;
        backend.draw_image(
            &mut dest,
            source,
            None,
            Rect::sized(target_w, target_h),
            Smoothing::Standard,
        )?;
        return Ok(dest);
    }

    debug!(steps = plan.len(), "Staged downscale");

    let mut current: Option<PixelSurface> = None;
    for (w, h) in plan {
        trace!(w, h, "Downscale step");
        let mut step = backend.create_surface(w, h)?;
        let input = current.as_ref().unwrap_or(source);
        backend.draw_image(&mut step, input, None, Rect::sized(w, h), Smoothing::High)?;
        current = Some(step);
    }

    // The plan is never empty
    Ok(current.unwrap_or_else(|| source.clone()))
}

fn resample_lanczos<B: SurfaceBackend + ?Sized>(
    backend: &B,
    source: &PixelSurface,
    target_w: u32,
    target_h: u32,
) -> Result<PixelSurface> {
    let mut dest = backend.create_surface(target_w, target_h)?;

    let scale_x = source.width as f64 / target_w as f64;
    let scale_y = source.height as f64 / target_h as f64;
    let row_len = target_w as usize * CHANNELS;

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        dest.pixels
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| lanczos_row(source, y as f64 * scale_y, scale_x, row));
    }

    #[cfg(not(feature = "parallel"))]
    {
        dest.pixels
            .chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| lanczos_row(source, y as f64 * scale_y, scale_x, row));
    }

    Ok(dest)
}

/// Fill one destination row sampled at source row coordinate `src_y`.
fn lanczos_row(source: &PixelSurface, src_y: f64, scale_x: f64, row: &mut [u8]) {
    let max_x = source.width as i64 - 1;
    let max_y = source.height as i64 - 1;

    let start_y = ((src_y - LANCZOS_RADIUS).floor() as i64).max(0);
    let end_y = ((src_y + LANCZOS_RADIUS).ceil() as i64).min(max_y);

    for (x, out) in row.chunks_exact_mut(CHANNELS).enumerate() {
        let src_x = x as f64 * scale_x;
        let start_x = ((src_x - LANCZOS_RADIUS).floor() as i64).max(0);
        let end_x = ((src_x + LANCZOS_RADIUS).ceil() as i64).min(max_x);

        let mut sum = [0.0f64; CHANNELS];
        let mut weight_sum = 0.0;

        for sy in start_y..=end_y {
            let row_start = sy as usize * source.width as usize;
            for sx in start_x..=end_x {
                let weight = distance_weight(src_x - sx as f64, src_y - sy as f64);
                if weight <= 0.0 {
                    continue;
                }

                let idx = (row_start + sx as usize) * CHANNELS;
                for (c, acc) in sum.iter_mut().enumerate() {
                    *acc += source.pixels[idx + c] as f64 * weight;
                }
                weight_sum += weight;
            }
        }

        if weight_sum > 0.0 {
            for (c, value) in out.iter_mut().enumerate() {
                *value = (sum[c] / weight_sum).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use crate::surface::RasterBackend;
    use std::cell::RefCell;

    /// Smooth gradient, opaque.
    fn gradient(width: u32, height: u32) -> PixelSurface {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x % 256) as u8);
                pixels.push((y % 256) as u8);
                pixels.push(128);
                pixels.push(255);
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
            _src_rect: Option<Rect>,
            _dest_rect: Rect,
            _smoothing: Smoothing,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_scale_factor_uses_smaller_axis() {
        assert!((scale_factor(100, 100, 50, 20) - 0.2).abs() < 1e-12);
        assert!((scale_factor(100, 100, 200, 300) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_plan_direct_above_half() {
        assert_eq!(plan_multistep(100, 100, 50, 50), vec![(50, 50)]);
        assert_eq!(plan_multistep(100, 100, 400, 300), vec![(400, 300)]);
    }

    #[test]
    fn test_plan_tenth_has_four_stages() {
        let plan = plan_multistep(1000, 1000, 100, 100);
        assert_eq!(plan.len(), 4);
        assert_eq!(plan[0], (700, 700));
        assert_eq!(plan[1], (490, 490));
        assert_eq!(plan[2], (343, 343));
        assert_eq!(plan[3], (100, 100));
    }

    /// Allocates like `RasterBackend` but only records each draw.
    #[derive(Default)]
    struct RecordingBackend {
        draws: RefCell<Vec<(u32, u32, Smoothing)>>,
    }

    impl SurfaceBackend for RecordingBackend {
        fn create_surface(&self, width: u32, height: u32) -> Result<PixelSurface> {
            Ok(PixelSurface::transparent(width, height))
        }

        fn draw_image(
            &self,
            dest: &mut PixelSurface,
            _src: &PixelSurface,
            _src_rect: Option<Rect>,
            _dest_rect: Rect,
            smoothing: Smoothing,
        ) -> Result<()> {
            self.draws
                .borrow_mut()
                .push((dest.width, dest.height, smoothing));
            Ok(())
        }
    }

    #[test]
    fn test_staged_draws_one_high_quality_blit_per_step() {
        let backend = RecordingBackend::default();
        let source = PixelSurface::transparent(1000, 1000);
        let out = resample(&backend, &source, 100, 100, Algorithm::Multistep).unwrap();

        assert_eq!((out.width, out.height), (100, 100));
        assert_eq!(
            *backend.draws.borrow(),
            vec![
                (700, 700, Smoothing::High),
                (490, 490, Smoothing::High),
                (343, 343, Smoothing::High),
                (100, 100, Smoothing::High),
            ]
        );
    }

    #[test]
    fn test_direct_draw_uses_standard_smoothing() {
        let backend = RecordingBackend::default();
        let source = PixelSurface::transparent(100, 80);
        resample(&backend, &source, 60, 48, Algorithm::Standard).unwrap();
        assert_eq!(*backend.draws.borrow(), vec![(60, 48, Smoothing::Standard)]);

        // Standard takes the staged path below half size
        let backend = RecordingBackend::default();
        resample(&backend, &source, 20, 16, Algorithm::Standard).unwrap();
        let draws = backend.draws.borrow();
        assert_eq!(draws.len(), 3);
        assert!(draws.iter().all(|&(_, _, s)| s == Smoothing::High));
        assert_eq!(draws.last(), Some(&(20, 16, Smoothing::High)));
    }

    #[test]
    fn test_plan_never_overshoots_target() {
        // Width only shrinks a little, so intermediate widths clamp to target
        let plan = plan_multistep(120, 1000, 100, 100);
        for &(w, h) in &plan {
            assert!(w >= 100 && h >= 100, "step {w}x{h} below target");
        }
        assert_eq!(*plan.last().unwrap(), (100, 100));
    }

    #[test]
    fn test_lanczos_identity_on_flat_image() {
        let src = PixelSurface::new(16, 12, [10u8, 200, 30, 255].repeat(16 * 12));
        let out = resample(&RasterBackend::new(), &src, 16, 12, Algorithm::Lanczos).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_lanczos_identity_within_tolerance() {
        let src = gradient(24, 24);
        let out = resample(&RasterBackend::new(), &src, 24, 24, Algorithm::Lanczos).unwrap();

        assert_eq!((out.width, out.height), (24, 24));
        for (a, b) in src.pixels.iter().zip(out.pixels.iter()) {
            assert!((*a as i32 - *b as i32).abs() <= 4, "{a} vs {b}");
        }
    }

    #[test]
    fn test_lanczos_downscale_dimensions() {
        let src = gradient(100, 50);
        let out = resample(&RasterBackend::new(), &src, 25, 10, Algorithm::Lanczos).unwrap();
        assert_eq!((out.width, out.height), (25, 10));
        assert_eq!(out.pixels.len(), 25 * 10 * 4);
        assert!(out.pixels.chunks(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_lanczos_upscale_dimensions() {
        let src = gradient(10, 10);
        let out = resample(&RasterBackend::new(), &src, 30, 20, Algorithm::Lanczos).unwrap();
        assert_eq!((out.width, out.height), (30, 20));
    }

    #[test]
    fn test_lanczos_filters_alpha() {
        let mut src = PixelSurface::transparent(8, 8);
        for y in 0..8 {
            for x in 4..8 {
                src.set_pixel(x, y, [255, 255, 255, 255]);
            }
        }
        let out = resample(&RasterBackend::new(), &src, 4, 4, Algorithm::Lanczos).unwrap();
        // Left edge stays mostly transparent, right edge mostly opaque
        assert!(out.pixel(0, 2)[3] < 128);
        assert!(out.pixel(3, 2)[3] > 128);
    }

    #[test]
    fn test_multistep_output_dimensions() {
        let src = gradient(200, 200);
        let out = resample(&RasterBackend::new(), &src, 20, 20, Algorithm::Multistep).unwrap();
        assert_eq!((out.width, out.height), (20, 20));
    }

    #[test]
    fn test_standard_direct_blit() {
        let src = gradient(40, 30);
        let out = resample(&RasterBackend::new(), &src, 30, 20, Algorithm::Standard).unwrap();
        assert_eq!((out.width, out.height), (30, 20));
    }

    #[test]
    fn test_surface_unavailable_propagates() {
        let src = gradient(10, 10);
        for algorithm in [Algorithm::Standard, Algorithm::Lanczos, Algorithm::Multistep] {
            let err = resample(&NoSurfaces, &src, 5, 5, algorithm).unwrap_err();
            assert!(matches!(err, TransformError::SurfaceUnavailable(_)));
        }
    }
}
