//! Declarative transform directives.
//!
//! A [`TransformDirectives`] value describes everything a single transform
//! call does: output format and quality, resize, sharpening, resampling
//! algorithm, rotation and crop shape. It is built with consuming builder
//! methods, so every step yields a new value and a finished directive set
//! can be cloned and shared without aliasing concerns.
//!
//! All types deserialize from the camelCase options object accepted by the
//! WASM worker entry point, e.g.
//!
//! ```text
//! {
//!   "format": "image/png",
//!   "quality": 0.8,
//!   "resize": { "width": 100, "aspectRatio": "original", "crop": "thumb",
//!               "gravity": "top-left" },
//!   "sharpen": 1,
//!   "algorithm": "multistep",
//!   "rotate": -90,
//!   "cropShape": { "type": "roundedRect", "width": 80, "radius": 12 }
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Output format used when none is requested.
pub const DEFAULT_FORMAT: &str = "image/jpeg";

/// Encoder quality used when none is requested.
pub const DEFAULT_QUALITY: f32 = 0.9;

/// Corner radius of a rounded-rectangle crop when none is given.
pub const DEFAULT_CORNER_RADIUS: f64 = 10.0;

/// Resampling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Single scaled blit through the surface backend.
    Standard,
    /// Direct windowed-sinc resampling, regardless of scale factor.
    #[default]
    Lanczos,
    /// Staged shrink for large reductions.
    Multistep,
}

/// How the resolved box relates to the source aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropMode {
    /// Grow the target box so it covers the requested size.
    #[serde(alias = "thumbnail")]
    Thumb,
    /// Exact sizing.
    Fill,
    /// Exact sizing; any shaping is left to the crop-shape stage.
    Crop,
}

/// Named anchor positions for crop offsets.
///
/// Unknown labels (including content-aware ones such as `"face"`) parse as
/// [`NamedGravity::Center`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NamedGravity {
    #[default]
    Center,
    Auto,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl NamedGravity {
    pub fn as_str(self) -> &'static str {
        match self {
            NamedGravity::Center => "center",
            NamedGravity::Auto => "auto",
            NamedGravity::Top => "top",
            NamedGravity::Bottom => "bottom",
            NamedGravity::Left => "left",
            NamedGravity::Right => "right",
            NamedGravity::TopLeft => "top-left",
            NamedGravity::TopRight => "top-right",
            NamedGravity::BottomLeft => "bottom-left",
            NamedGravity::BottomRight => "bottom-right",
        }
    }
}

impl From<&str> for NamedGravity {
    fn from(value: &str) -> Self {
        match value {
            "auto" => NamedGravity::Auto,
            "top" => NamedGravity::Top,
            "bottom" => NamedGravity::Bottom,
            "left" => NamedGravity::Left,
            "right" => NamedGravity::Right,
            "top-left" => NamedGravity::TopLeft,
            "top-right" => NamedGravity::TopRight,
            "bottom-left" => NamedGravity::BottomLeft,
            "bottom-right" => NamedGravity::BottomRight,
            _ => NamedGravity::Center,
        }
    }
}

impl From<String> for NamedGravity {
    fn from(value: String) -> Self {
        NamedGravity::from(value.as_str())
    }
}

impl From<NamedGravity> for String {
    fn from(value: NamedGravity) -> Self {
        value.as_str().to_string()
    }
}

/// Anchor for a crop box: a named position or an explicit pixel offset.
///
/// An offset object missing either coordinate deserializes as
/// [`NamedGravity::Center`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Gravity {
    Offset { x: f64, y: f64 },
    Named(NamedGravity),
}

/// Wire shape accepted for [`Gravity`].
#[derive(Deserialize)]
#[serde(untagged)]
enum GravityRepr {
    Offset { x: Option<f64>, y: Option<f64> },
    Named(NamedGravity),
}

impl<'de> Deserialize<'de> for Gravity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match GravityRepr::deserialize(deserializer)? {
            GravityRepr::Offset {
                x: Some(x),
                y: Some(y),
            } => Gravity::Offset { x, y },
            GravityRepr::Offset { .. } => Gravity::Named(NamedGravity::Center),
            GravityRepr::Named(named) => Gravity::Named(named),
        })
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Gravity::Named(NamedGravity::Center)
    }
}

impl From<NamedGravity> for Gravity {
    fn from(value: NamedGravity) -> Self {
        Gravity::Named(value)
    }
}

/// Error returned when an aspect ratio string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid aspect ratio \"{0}\": expected \"original\" or \"W:H\" with positive numbers")]
pub struct AspectRatioError(pub String);

/// Requested aspect ratio for a resize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectRatio {
    /// Keep the source ratio.
    Original,
    /// Explicit `W:H` ratio; the width is derived from the height.
    Ratio { width: f64, height: f64 },
}

impl AspectRatio {
    pub fn ratio(width: f64, height: f64) -> Self {
        AspectRatio::Ratio { width, height }
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("original") {
            return Ok(AspectRatio::Original);
        }

        let err = || AspectRatioError(s.to_string());
        let (w, h) = trimmed.split_once(':').ok_or_else(err)?;
        let width: f64 = w.trim().parse().map_err(|_| err())?;
        let height: f64 = h.trim().parse().map_err(|_| err())?;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(err());
        }
        Ok(AspectRatio::Ratio { width, height })
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = AspectRatioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectRatio::Original => f.write_str("original"),
            AspectRatio::Ratio { width, height } => write!(f, "{width}:{height}"),
        }
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.to_string()
    }
}

/// Target sizing for the resample stage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResizeDirective {
    /// Target width in pixels. Zero counts as unset.
    pub width: Option<u32>,
    /// Target height in pixels. Zero counts as unset.
    pub height: Option<u32>,
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(rename = "crop")]
    pub crop_mode: Option<CropMode>,
    pub gravity: Option<Gravity>,
}

impl ResizeDirective {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset that over-covers the target box (`crop: "thumb"`).
    pub fn thumbnail() -> Self {
        Self::with_mode(CropMode::Thumb)
    }

    /// Preset with exact sizing (`crop: "fill"`).
    pub fn fill() -> Self {
        Self::with_mode(CropMode::Fill)
    }

    /// Preset with exact sizing (`crop: "crop"`).
    pub fn crop() -> Self {
        Self::with_mode(CropMode::Crop)
    }

    fn with_mode(mode: CropMode) -> Self {
        Self {
            crop_mode: Some(mode),
            gravity: Some(Gravity::Named(NamedGravity::Auto)),
            ..Self::default()
        }
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    pub fn crop_mode(mut self, mode: CropMode) -> Self {
        self.crop_mode = Some(mode);
        self
    }

    pub fn gravity(mut self, gravity: impl Into<Gravity>) -> Self {
        self.gravity = Some(gravity.into());
        self
    }

    /// Width if set and non-zero.
    pub fn explicit_width(&self) -> Option<u32> {
        self.width.filter(|&w| w > 0)
    }

    /// Height if set and non-zero.
    pub fn explicit_height(&self) -> Option<u32> {
        self.height.filter(|&h| h > 0)
    }

    /// Default the aspect ratio to [`AspectRatio::Original`] when exactly one
    /// dimension was supplied and no ratio was given.
    pub fn normalized(mut self) -> Self {
        let one_dimension = self.explicit_width().is_some() != self.explicit_height().is_some();
        if one_dimension && self.aspect_ratio.is_none() {
            self.aspect_ratio = Some(AspectRatio::Original);
        }
        self
    }
}

/// Shape of the final crop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CropShape {
    /// Circle inscribed in the largest centred square.
    Circle,
    /// Largest square.
    Square,
    /// Axis-aligned rectangle; missing sides default to the surface size.
    Rectangle {
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
    },
    /// Rectangle with rounded corners.
    RoundedRect {
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default = "default_corner_radius")]
        radius: f64,
    },
}

fn default_corner_radius() -> f64 {
    DEFAULT_CORNER_RADIUS
}

impl CropShape {
    pub fn circle() -> Self {
        CropShape::Circle
    }

    pub fn square() -> Self {
        CropShape::Square
    }

    pub fn rectangle(width: Option<u32>, height: Option<u32>) -> Self {
        CropShape::Rectangle { width, height }
    }

    pub fn rounded_rect(width: Option<u32>, height: Option<u32>, radius: f64) -> Self {
        CropShape::RoundedRect {
            width,
            height,
            radius,
        }
    }
}

/// Sharpening strength, clamped to 0..=2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "u8")]
pub struct SharpenLevel(u8);

impl SharpenLevel {
    pub const NONE: SharpenLevel = SharpenLevel(0);
    pub const NORMAL: SharpenLevel = SharpenLevel(1);
    pub const HIGH: SharpenLevel = SharpenLevel(2);

    pub fn new(level: i64) -> Self {
        SharpenLevel(level.clamp(0, 2) as u8)
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// Blend factor applied to the local contrast, or `None` for level 0.
    pub fn intensity(self) -> Option<f32> {
        match self.0 {
            0 => None,
            1 => Some(0.5),
            _ => Some(1.0),
        }
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<i64> for SharpenLevel {
    fn from(value: i64) -> Self {
        SharpenLevel::new(value)
    }
}

/// Fractional levels truncate toward zero; NaN is level 0.
impl From<f64> for SharpenLevel {
    fn from(value: f64) -> Self {
        SharpenLevel::new(whole(value))
    }
}

impl From<SharpenLevel> for u8 {
    fn from(value: SharpenLevel) -> Self {
        value.0
    }
}

/// Rotation in whole degrees, normalized into `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "u16")]
pub struct RotationAngle(u16);

impl RotationAngle {
    pub fn new(degrees: i64) -> Self {
        RotationAngle(degrees.rem_euclid(360) as u16)
    }

    pub fn degrees(self) -> u16 {
        self.0
    }

    pub fn radians(self) -> f64 {
        (self.0 as f64).to_radians()
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<i64> for RotationAngle {
    fn from(value: i64) -> Self {
        RotationAngle::new(value)
    }
}

/// Fractional degrees truncate toward zero; non-finite input is no rotation.
impl From<f64> for RotationAngle {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            RotationAngle::new((value.trunc() % 360.0) as i64)
        } else {
            RotationAngle::default()
        }
    }
}

impl From<RotationAngle> for u16 {
    fn from(value: RotationAngle) -> Self {
        value.0
    }
}

/// Truncate a JS-style number to an integer, saturating at the `i64` range.
fn whole(value: f64) -> i64 {
    if value.is_nan() {
        0
    } else {
        value.trunc() as i64
    }
}

/// How the embedding host should acquire the source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    /// Fetch the bytes over the network before decoding.
    Fetch,
    /// Let the host's image element load the source.
    Element,
}

/// The full set of directives for one transform call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformDirectives {
    /// Output MIME type handed to the encoder.
    pub format: String,
    /// Encoder quality in `0.0..=1.0`.
    pub quality: f32,
    pub resize: Option<ResizeDirective>,
    pub sharpen: SharpenLevel,
    pub algorithm: Algorithm,
    pub rotate: RotationAngle,
    pub crop_shape: Option<CropShape>,
    pub delivery: Option<DeliveryType>,
}

impl Default for TransformDirectives {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT.to_string(),
            quality: DEFAULT_QUALITY,
            resize: None,
            sharpen: SharpenLevel::NONE,
            algorithm: Algorithm::default(),
            rotate: RotationAngle::default(),
            crop_shape: None,
            delivery: None,
        }
    }
}

impl TransformDirectives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivery(mut self, delivery: DeliveryType) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Set the encoder quality, clamped to `0.0..=1.0`.
    pub fn quality(mut self, quality: f32) -> Self {
        self.quality = if quality.is_nan() {
            DEFAULT_QUALITY
        } else {
            quality.clamp(0.0, 1.0)
        };
        self
    }

    pub fn resize(mut self, resize: ResizeDirective) -> Self {
        self.resize = Some(resize.normalized());
        self
    }

    /// Set the sharpening level (clamped to 0..=2).
    pub fn sharpen(mut self, level: i64) -> Self {
        self.sharpen = SharpenLevel::new(level);
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Rotate by `degrees` (any sign, normalized into `[0, 360)`).
    pub fn rotate(mut self, degrees: i64) -> Self {
        self.rotate = RotationAngle::new(degrees);
        self
    }

    pub fn crop_as(mut self, shape: CropShape) -> Self {
        self.crop_shape = Some(shape);
        self
    }

    /// Gravity used by the crop-shape stage.
    pub fn gravity(&self) -> Option<Gravity> {
        self.resize.and_then(|r| r.gravity)
    }
}
