//! Text rendering for watermarks.
//!
//! Rasterizes text onto transparent RGBA layers for the compositor.
//!
//! # Features
//!
//! - Hex color parsing (#RGB and #RRGGBB formats)
//! - Kerning-aware text measurement
//! - Glyph rendering with a black stroke/outline drawn under the fill,
//!   so the watermark stays legible on both light and dark backgrounds
//!
//! Rendering draws directly onto a caller-provided canvas; the compositor
//! owns layer allocation and geometry.

use super::error::WatermarkError;
use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// RGB color for the watermark fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Combine with an alpha value into an RGBA pixel.
    pub fn with_alpha(&self, alpha: u8) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, alpha])
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::invalid_param("color", "must start with '#'"))?;

    let component = |range: &str| {
        u8::from_str_radix(range, 16)
            .map_err(|_| WatermarkError::invalid_param("color", format!("invalid hex digit in '{}'", hex)))
    };

    match digits.len() {
        3 => {
            // #RGB format - each digit doubles: 0xF -> 0xFF
            let r = component(&digits[0..1])?;
            let g = component(&digits[1..2])?;
            let b = component(&digits[2..3])?;
            Ok(Color::new(r * 17, g * 17, b * 17))
        }
        6 => {
            let r = component(&digits[0..2])?;
            let g = component(&digits[2..4])?;
            let b = component(&digits[4..6])?;
            Ok(Color::new(r, g, b))
        }
        len => Err(WatermarkError::invalid_param(
            "color",
            format!("must be #RGB or #RRGGBB, got {} digits", len),
        )),
    }
}

/// Measure rendered text, returning (width, height) in pixels.
///
/// Width is the kerned advance width of the whole string; height is the
/// font's line height. Empty text measures (0, line height).
pub fn measure_text(font: &FontArc, text: &str, font_size: f32) -> (u32, u32) {
    let scaled = font.as_scaled(PxScale::from(font_size));

    let mut width = 0.0f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        if let Some(prev) = prev_glyph {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    (width.ceil() as u32, scaled.height().ceil() as u32)
}

/// Draw text onto a canvas with the bounding box's top-left at (x, y).
///
/// The stroke is drawn first, then the fill on top; where the two overlap
/// at full coverage the fill wins. Empty text draws nothing. Glyph pixels
/// falling outside the canvas are discarded.
#[allow(clippy::too_many_arguments)]
pub fn draw_text(
    canvas: &mut RgbaImage,
    x: i32,
    y: i32,
    text: &str,
    font: &FontArc,
    font_size: f32,
    fill: Rgba<u8>,
    stroke: Rgba<u8>,
    stroke_width: i32,
) {
    if text.is_empty() {
        return;
    }

    if stroke_width > 0 && stroke[3] > 0 {
        for dy in -stroke_width..=stroke_width {
            for dx in -stroke_width..=stroke_width {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if dx * dx + dy * dy > stroke_width * stroke_width {
                    continue;
                }
                draw_text_pass(canvas, x + dx, y + dy, text, font, font_size, stroke);
            }
        }
    }

    draw_text_pass(canvas, x, y, text, font, font_size, fill);
}

/// Render one pass of glyphs in a single color.
fn draw_text_pass(
    canvas: &mut RgbaImage,
    x: i32,
    y: i32,
    text: &str,
    font: &FontArc,
    font_size: f32,
    color: Rgba<u8>,
) {
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);

    let canvas_width = canvas.width() as i32;
    let canvas_height = canvas.height() as i32;

    let baseline_y = y as f32 + scaled.ascent();
    let mut cursor_x = x as f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);

        if let Some(prev) = prev_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();

            outlined.draw(|px, py, coverage| {
                let cx = px as i32 + bounds.min.x as i32;
                let cy = py as i32 + bounds.min.y as i32;

                if cx >= 0 && cy >= 0 && cx < canvas_width && cy < canvas_height {
                    let pixel_alpha = (coverage * color[3] as f32) as u8;
                    if pixel_alpha == 0 {
                        return;
                    }
                    let pixel = Rgba([color[0], color[1], color[2], pixel_alpha]);

                    // Blend with existing pixel (for anti-aliasing)
                    let existing = canvas.get_pixel(cx as u32, cy as u32);
                    let blended = blend_glyph_pixel(*existing, pixel);
                    canvas.put_pixel(cx as u32, cy as u32, blended);
                }
            });
        }

        cursor_x += scaled.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }
}

/// Blend two RGBA pixels using alpha compositing ("over" operator).
fn blend_glyph_pixel(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let top_alpha = top[3] as f32 / 255.0;
    let bottom_alpha = bottom[3] as f32 / 255.0;

    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |t: u8, b: u8| -> u8 {
        let t = t as f32 / 255.0;
        let b = b as f32 / 255.0;
        let result = (t * top_alpha + b * bottom_alpha * (1.0 - top_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend(top[0], bottom[0]),
        blend(top[1], bottom[1]),
        blend(top[2], bottom[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
