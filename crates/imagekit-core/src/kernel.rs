//! Windowed-sinc kernel math for the Lanczos resampler.
//!
//! The Lanczos kernel is defined as:
//! ```text
//! L(x) = sinc(x) * sinc(x/a)  for |x| < a
//! L(x) = 0                     for |x| >= a
//! ```
//!
//! where sinc(x) = sin(πx) / (πx) and `a` is [`LANCZOS_RADIUS`].

use std::f64::consts::PI;

/// Support radius of the kernel, in source pixels.
pub const LANCZOS_RADIUS: f64 = 3.0;

/// Lanczos3 weight for a normalized distance `x`.
pub fn lanczos_weight(x: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= LANCZOS_RADIUS {
        return 0.0;
    }

    let pi_x = PI * x;

    // = a * sin(πx) * sin(πx/a) / (π²x²)
    (LANCZOS_RADIUS * pi_x.sin() * (pi_x / LANCZOS_RADIUS).sin()) / (pi_x * pi_x)
}

/// Weight of a source pixel at offset `(dx, dy)` from the sample point.
///
/// The Euclidean distance is divided by the radius before the kernel is
/// evaluated, so the whole 3-pixel neighbourhood falls inside the main lobe.
#[inline]
pub fn distance_weight(dx: f64, dy: f64) -> f64 {
    let distance = (dx * dx + dy * dy).sqrt();
    lanczos_weight(distance / LANCZOS_RADIUS)
}
