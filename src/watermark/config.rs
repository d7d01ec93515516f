//! Watermark configuration types.
//!
//! Defines the style configuration shared by both drivers:
//! - Anchor position (center plus the four corners)
//! - Text, color, opacity, font scale, rotation
//! - Form-field parsing with explicit validation
//!
//! Defaults mirror the HTTP form defaults, so an upload with only a `file`
//! field produces the classic diagonal "CONFIDENTIAL" watermark.

use super::error::WatermarkError;
use super::text_renderer::Color;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default watermark text.
pub const DEFAULT_TEXT: &str = "CONFIDENTIAL";
/// Default fill color (Netflix red).
pub const DEFAULT_COLOR: &str = "#E50914";
/// Default opacity (0-255).
pub const DEFAULT_OPACITY: u8 = 128;
/// Default font scale divisor: font pixel size = image width / scale.
pub const DEFAULT_FONT_SCALE: u32 = 20;
/// Default rotation in degrees (center anchor only).
pub const DEFAULT_ROTATION: i32 = 45;

/// Anchor position for the watermark on the image.
///
/// `Center` renders a rotatable diagonal watermark; the corner anchors
/// place the text at a padded corner without rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkAnchor {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl WatermarkAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }
}

impl FromStr for WatermarkAnchor {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "center" => Ok(Self::Center),
            "top-left" => Ok(Self::TopLeft),
            "top-right" => Ok(Self::TopRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-right" => Ok(Self::BottomRight),
            _ => Err(WatermarkError::invalid_param(
                "position",
                format!("unknown position: {}", s),
            )),
        }
    }
}

/// Style configuration for a single watermarking call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Text to render. Empty text produces an output identical to the source.
    pub text: String,

    /// Fill color (RGB). Opacity is carried separately.
    pub color: Color,

    /// Opacity from 0 (invisible) to 255 (opaque).
    pub opacity: u8,

    /// Font scale divisor: font pixel size = image width / font_scale.
    pub font_scale: u32,

    /// Rotation in degrees, counterclockwise. Only the center anchor rotates.
    pub rotation_degrees: i32,

    /// Where to place the watermark.
    pub anchor: WatermarkAnchor,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            color: Color::new(0xE5, 0x09, 0x14),
            opacity: DEFAULT_OPACITY,
            font_scale: DEFAULT_FONT_SCALE,
            rotation_degrees: DEFAULT_ROTATION,
            anchor: WatermarkAnchor::Center,
        }
    }
}

/// Parse an opacity form field.
///
/// Non-numeric input is rejected; numeric values above 255 clamp to 255.
pub fn parse_opacity(value: &str) -> Result<u8, WatermarkError> {
    let parsed: u32 = value
        .trim()
        .parse()
        .map_err(|_| WatermarkError::invalid_param("opacity", format!("not an integer: {}", value)))?;
    Ok(parsed.min(255) as u8)
}

/// Parse a font scale form field. Must be a positive integer.
pub fn parse_font_scale(value: &str) -> Result<u32, WatermarkError> {
    let parsed: u32 = value
        .trim()
        .parse()
        .map_err(|_| WatermarkError::invalid_param("size", format!("not an integer: {}", value)))?;
    if parsed == 0 {
        return Err(WatermarkError::invalid_param("size", "must be positive"));
    }
    Ok(parsed)
}

/// Parse a rotation form field. Negative angles rotate clockwise.
pub fn parse_rotation(value: &str) -> Result<i32, WatermarkError> {
    value
        .trim()
        .parse()
        .map_err(|_| WatermarkError::invalid_param("rotation", format!("not an integer: {}", value)))
}
