//! Watermark compositor.
//!
//! The core routine: computes text geometry, renders the text onto a
//! transparent layer, rotates and crops that layer for the center anchor,
//! and alpha-composites the result over the source image.
//!
//! # Geometry
//!
//! The center anchor renders into a layer three times the source's width
//! and height. Rotating a tightly-fitted text layer would clip the text
//! corners at 45°-class angles; the oversized canvas keeps the full text
//! footprint inside for any angle, and the post-rotation center crop
//! recovers a window of exactly the source dimensions. Because the
//! pre-rotation centering and the crop share the same center point, the
//! watermark lands centered on the image without further positioning.
//!
//! Corner anchors skip rotation entirely: the text is drawn directly onto
//! a source-sized layer at a 5%-of-width padded corner.

use super::config::{WatermarkAnchor, WatermarkConfig};
use super::error::WatermarkError;
use super::font;
use super::text_renderer::{draw_text, measure_text};
use image::{imageops, DynamicImage, Rgba, RgbaImage};

/// Corner padding as a fraction of the image width.
const CORNER_PADDING_RATIO: f32 = 0.05;

/// Outline width drawn under the fill, in pixels.
const STROKE_WIDTH: i32 = 2;

/// Oversize factor for the rotatable center layer.
const CENTER_LAYER_FACTOR: u32 = 3;

/// Composite a text watermark onto an image.
///
/// The output always has exactly the source's dimensions, regardless of
/// rotation. Opacity 0 or empty text yields an output identical to the
/// source (the full pipeline still runs, it just composites nothing).
pub fn composite(
    source: &DynamicImage,
    config: &WatermarkConfig,
) -> Result<RgbaImage, WatermarkError> {
    let mut base = source.to_rgba8();
    let (width, height) = base.dimensions();

    if width == 0 || height == 0 {
        return Err(WatermarkError::DecodeError(
            "image has zero width or height".to_string(),
        ));
    }

    // Font size scales with the image so the watermark keeps its
    // proportions across resolutions.
    let font_size = (width / config.font_scale.max(1)).max(1) as f32;
    let font = font::resolve();
    let (text_w, text_h) = measure_text(&font, &config.text, font_size);

    let fill = config.color.with_alpha(config.opacity);
    let stroke = Rgba([0, 0, 0, config.opacity]);

    let overlay = match config.anchor {
        WatermarkAnchor::Center => center_overlay(
            width,
            height,
            config,
            &font,
            font_size,
            (text_w, text_h),
            fill,
            stroke,
        ),
        _ => corner_overlay(
            width,
            height,
            config,
            &font,
            font_size,
            (text_w, text_h),
            fill,
            stroke,
        ),
    };

    // Porter-Duff "over"; the overlay has exactly the base dimensions.
    for (base_pixel, overlay_pixel) in base.pixels_mut().zip(overlay.pixels()) {
        *base_pixel = blend_over(*base_pixel, *overlay_pixel);
    }

    Ok(base)
}

/// Build the rotated, center-anchored watermark layer.
#[allow(clippy::too_many_arguments)]
fn center_overlay(
    width: u32,
    height: u32,
    config: &WatermarkConfig,
    font: &ab_glyph::FontArc,
    font_size: f32,
    (text_w, text_h): (u32, u32),
    fill: Rgba<u8>,
    stroke: Rgba<u8>,
) -> RgbaImage {
    let layer_w = width * CENTER_LAYER_FACTOR;
    let layer_h = height * CENTER_LAYER_FACTOR;
    let mut layer = RgbaImage::new(layer_w, layer_h);

    // Draw centered on the layer's own center so rotation and crop share
    // one center point.
    let cx = layer_w as i32 / 2;
    let cy = layer_h as i32 / 2;
    draw_text(
        &mut layer,
        cx - text_w as i32 / 2,
        cy - text_h as i32 / 2,
        &config.text,
        font,
        font_size,
        fill,
        stroke,
        STROKE_WIDTH,
    );

    let rotated = rotate_about_center(&layer, config.rotation_degrees as f32);

    // Center crop back to the source bounds.
    let left = (layer_w - width) / 2;
    let top = (layer_h - height) / 2;
    imageops::crop_imm(&rotated, left, top, width, height).to_image()
}

/// Build an unrotated corner-anchored watermark layer.
#[allow(clippy::too_many_arguments)]
fn corner_overlay(
    width: u32,
    height: u32,
    config: &WatermarkConfig,
    font: &ab_glyph::FontArc,
    font_size: f32,
    (text_w, text_h): (u32, u32),
    fill: Rgba<u8>,
    stroke: Rgba<u8>,
) -> RgbaImage {
    let mut layer = RgbaImage::new(width, height);

    let padding = (width as f32 * CORNER_PADDING_RATIO) as i32;
    let w = width as i32;
    let h = height as i32;
    let tw = text_w as i32;
    let th = text_h as i32;

    let (x, y) = match config.anchor {
        WatermarkAnchor::TopLeft => (padding, padding),
        WatermarkAnchor::TopRight => (w - tw - padding, padding),
        WatermarkAnchor::BottomLeft => (padding, h - th - padding),
        WatermarkAnchor::BottomRight => (w - tw - padding, h - th - padding),
        // Center is handled by center_overlay
        WatermarkAnchor::Center => ((w - tw) / 2, (h - th) / 2),
    };

    draw_text(
        &mut layer,
        x,
        y,
        &config.text,
        font,
        font_size,
        fill,
        stroke,
        STROKE_WIDTH,
    );

    layer
}

/// Rotate an image counterclockwise about its center, keeping the canvas
/// size fixed. Pixels sampled from outside the source are transparent.
fn rotate_about_center(image: &RgbaImage, degrees: f32) -> RgbaImage {
    if degrees.rem_euclid(360.0) == 0.0 {
        return image.clone();
    }

    let width = image.width();
    let height = image.height();
    let src_w = width as f32;
    let src_h = height as f32;
    let cx = src_w / 2.0;
    let cy = src_h / 2.0;

    let radians = degrees.to_radians();
    // Inverse mapping: rotate each destination pixel back into the source
    // and resample with a bicubic (Catmull-Rom) kernel over the 4x4
    // neighborhood.
    let cos = radians.cos();
    let sin = radians.sin();

    let mut rotated = RgbaImage::new(width, height);

    for dy in 0..height {
        for dx in 0..width {
            let rx = dx as f32 - cx;
            let ry = dy as f32 - cy;

            let sx = rx * cos - ry * sin + cx;
            let sy = rx * sin + ry * cos + cy;

            // The kernel needs one tap left and two right of the sample.
            if sx >= 1.0 && sx < src_w - 2.0 && sy >= 1.0 && sy < src_h - 2.0 {
                let x0 = sx.floor() as i32;
                let y0 = sy.floor() as i32;
                let wx = cubic_weights(sx - x0 as f32);
                let wy = cubic_weights(sy - y0 as f32);

                let mut acc = [0.0f32; 4];
                for (j, row_weight) in wy.iter().enumerate() {
                    let py = (y0 + j as i32 - 1) as u32;
                    for (i, col_weight) in wx.iter().enumerate() {
                        let px = (x0 + i as i32 - 1) as u32;
                        let weight = row_weight * col_weight;
                        let pixel = image.get_pixel(px, py);
                        for (channel, value) in acc.iter_mut().enumerate() {
                            *value += pixel[channel] as f32 * weight;
                        }
                    }
                }

                // Catmull-Rom can overshoot at sharp edges; clamp per channel.
                rotated.put_pixel(
                    dx,
                    dy,
                    Rgba(acc.map(|v| v.round().clamp(0.0, 255.0) as u8)),
                );
            }
        }
    }

    rotated
}

/// Catmull-Rom weights for the four taps around a sample at fractional
/// offset `t` in [0, 1). Weights sum to 1; at `t == 0` only the center
/// tap contributes, so on-grid samples reproduce source pixels exactly.
fn cubic_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        (-t3 + 2.0 * t2 - t) / 2.0,
        (3.0 * t3 - 5.0 * t2 + 2.0) / 2.0,
        (-3.0 * t3 + 4.0 * t2 + t) / 2.0,
        (t3 - t2) / 2.0,
    ]
}

/// Blend two pixels using alpha compositing.
///
/// Uses the "over" operator: result = foreground + background * (1 - foreground.alpha)
fn blend_over(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    // Fully transparent watermark pixels leave the base untouched, exactly.
    if foreground[3] == 0 {
        return background;
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watermark::text_renderer::Color;

    fn solid_image(width: u32, height: u32, color: Rgba<u8>) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, color))
    }

    fn test_config() -> WatermarkConfig {
        WatermarkConfig {
            text: "TEST".to_string(),
            color: Color::new(0, 255, 0),
            opacity: 255,
            font_scale: 10,
            rotation_degrees: 0,
            anchor: WatermarkAnchor::Center,
        }
    }

    // Test: Output dimensions match the source for any rotation
    #[test]
    fn test_output_size_invariant_under_rotation() {
        let source = solid_image(317, 201, Rgba([200, 200, 200, 255]));

        for rotation in [0, 30, 45, 90, 180, 271, 359, -45] {
            let config = WatermarkConfig {
                rotation_degrees: rotation,
                ..test_config()
            };
            let result = composite(&source, &config).unwrap();
            assert_eq!(result.dimensions(), (317, 201), "rotation {}", rotation);
        }
    }

    // Test: Zero opacity watermark leaves the base untouched
    #[test]
    fn test_zero_opacity_is_identity() {
        let source = solid_image(120, 80, Rgba([10, 140, 250, 255]));
        let config = WatermarkConfig {
            opacity: 0,
            rotation_degrees: 45,
            ..test_config()
        };

        let result = composite(&source, &config).unwrap();
        assert_eq!(
            result.as_raw(),
            source.to_rgba8().as_raw(),
            "opacity 0 must be a pixel-exact no-op"
        );
    }

    // Test: Empty text composites nothing
    #[test]
    fn test_empty_text_is_identity() {
        let source = solid_image(120, 80, Rgba([90, 60, 30, 255]));
        let config = WatermarkConfig {
            text: String::new(),
            rotation_degrees: 45,
            ..test_config()
        };

        let result = composite(&source, &config).unwrap();
        assert_eq!(result.as_raw(), source.to_rgba8().as_raw());
    }

    // Test: Full opacity fill shows the exact configured color at glyph interiors
    #[test]
    fn test_full_opacity_shows_fill_color() {
        let source = solid_image(400, 300, Rgba([255, 255, 255, 255]));
        let config = test_config();

        let result = composite(&source, &config).unwrap();
        let has_fill = result.pixels().any(|p| *p == Rgba([0, 255, 0, 255]));
        assert!(has_fill, "Glyph interiors should match the fill color exactly");
    }

    // Test: Rotation 0 with center anchor still runs the rotate/crop pipeline
    #[test]
    fn test_center_rotation_zero_is_centered() {
        let source = solid_image(400, 300, Rgba([255, 255, 255, 255]));
        let config = WatermarkConfig {
            text: "MARK".to_string(),
            ..test_config()
        };

        let result = composite(&source, &config).unwrap();
        let base = source.to_rgba8();

        let mut min_x = u32::MAX;
        let mut max_x = 0;
        let mut min_y = u32::MAX;
        let mut max_y = 0;
        for (x, y, pixel) in result.enumerate_pixels() {
            if pixel != base.get_pixel(x, y) {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
        assert!(min_x < max_x, "Watermark should be visible");

        let center_x = (min_x + max_x) as f32 / 2.0;
        let center_y = (min_y + max_y) as f32 / 2.0;
        assert!(
            (center_x - 200.0).abs() <= 8.0,
            "Horizontal center off: {}",
            center_x
        );
        assert!(
            (center_y - 150.0).abs() <= 8.0,
            "Vertical center off: {}",
            center_y
        );
    }

    // Test: 45 degree rotation keeps the watermark inside the output
    #[test]
    fn test_diagonal_rotation_is_visible() {
        let source = solid_image(400, 300, Rgba([255, 255, 255, 255]));
        let config = WatermarkConfig {
            rotation_degrees: 45,
            opacity: 200,
            ..test_config()
        };

        let result = composite(&source, &config).unwrap();
        let base = source.to_rgba8();
        let changed = result
            .enumerate_pixels()
            .filter(|(x, y, p)| *p != base.get_pixel(*x, *y))
            .count();
        assert!(changed > 0, "Rotated watermark should still be visible");
    }

    // Test: Alpha-less sources are normalized before compositing
    #[test]
    fn test_rgb_source_is_normalized() {
        let rgb = image::RgbImage::from_pixel(100, 60, image::Rgb([20, 20, 20]));
        let source = DynamicImage::ImageRgb8(rgb);

        let result = composite(&source, &test_config()).unwrap();
        assert_eq!(result.dimensions(), (100, 60));
        assert!(result.pixels().all(|p| p[3] == 255));
    }

    // Test: Blend pixels function directly
    #[test]
    fn test_blend_over_direct() {
        // 50% alpha white over opaque black = gray
        let result = blend_over(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 128]));
        assert!(result[0] > 100 && result[0] < 160);
        assert_eq!(result[3], 255);

        // Transparent foreground returns the background untouched
        let bg = Rgba([13, 77, 211, 255]);
        assert_eq!(blend_over(bg, Rgba([255, 0, 0, 0])), bg);

        // Opaque foreground replaces the background
        let result = blend_over(Rgba([255, 255, 255, 255]), Rgba([0, 0, 255, 255]));
        assert_eq!(result, Rgba([0, 0, 255, 255]));
    }

    // Test: Kernel weights sum to one and are exact on grid points
    #[test]
    fn test_cubic_weights() {
        for t in [0.0, 0.25, 0.5, 0.75, 0.99] {
            let weights = cubic_weights(t);
            let sum: f32 = weights.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "t={}: weights sum to {}", t, sum);
        }

        // On-grid samples reproduce the source pixel exactly
        let on_grid = cubic_weights(0.0);
        assert!((on_grid[1] - 1.0).abs() < 1e-6);
        assert!(on_grid[0].abs() < 1e-6 && on_grid[2].abs() < 1e-6 && on_grid[3].abs() < 1e-6);
    }

    // Test: Off-grid samples at a hard edge interpolate instead of snapping
    #[test]
    fn test_rotation_resamples_edges_smoothly() {
        let mut layer = RgbaImage::new(80, 80);
        for y in 0..80 {
            for x in 0..40 {
                layer.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }

        let rotated = rotate_about_center(&layer, 10.0);
        assert_eq!(rotated.dimensions(), (80, 80));

        let intermediate = rotated.pixels().any(|p| p[3] > 30 && p[3] < 225);
        assert!(
            intermediate,
            "Pixels along the rotated edge should carry interpolated alpha"
        );
    }

    // Test: Rotation helper keeps dimensions and transparency
    #[test]
    fn test_rotate_about_center() {
        let mut layer = RgbaImage::new(60, 40);
        layer.put_pixel(30, 20, Rgba([255, 0, 0, 255]));

        let rotated = rotate_about_center(&layer, 90.0);
        assert_eq!(rotated.dimensions(), (60, 40));

        // The center pixel survives rotation about the center
        let near_center = (19..=21)
            .flat_map(|y| (29..=31).map(move |x| (x, y)))
            .any(|(x, y)| rotated.get_pixel(x, y)[0] > 0);
        assert!(near_center);

        // Zero rotation is an exact no-op
        let unrotated = rotate_about_center(&layer, 0.0);
        assert_eq!(unrotated.as_raw(), layer.as_raw());
    }
}
