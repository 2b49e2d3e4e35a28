//! Pixel transform stages: resampling, rotation, shape cropping and
//! sharpening.
//!
//! # Transform Order
//!
//! The pipeline applies the stages in this order:
//! 1. Resample to the resolved target size
//! 2. Rotation (canvas grows to fit the rotated corners)
//! 3. Crop shape (axis-aligned to the rotated content)
//! 4. Sharpening (on the final pixel grid)
//!
//! # Coordinate System
//!
//! - Rotation angles are whole degrees, positive = clockwise on screen
//! - Crop offsets are in pixels and may be negative
//! - Origin is top-left corner

mod clip;
mod resample;
mod rotation;
mod sharpen;

pub use clip::{apply_clip, clip_to_shape, crop_offset, crop_size, ClipPath};
pub use resample::{plan_multistep, resample, scale_factor, STEP_FACTOR};
pub use rotation::{compute_rotated_bounds, rotate};
pub use sharpen::sharpen;
