//! Output encoding for composited images.
//!
//! PNG preserves the alpha channel; JPEG cannot carry one, so the image is
//! flattened against an opaque white background first (never black - a
//! transparent region should read as paper, not ink).

use super::error::WatermarkError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;

/// JPEG quality for the batch driver.
pub const JPEG_QUALITY: u8 = 90;

/// Encode an RGBA image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, WatermarkError> {
    let mut output = Cursor::new(Vec::new());
    PngEncoder::new(&mut output)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| WatermarkError::EncodeError(format!("png: {}", e)))?;
    Ok(output.into_inner())
}

/// Encode an RGBA image as JPEG, flattening alpha against white.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, WatermarkError> {
    let rgb = flatten_onto_white(image);
    let mut output = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut output, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ColorType::Rgb8,
        )
        .map_err(|e| WatermarkError::EncodeError(format!("jpeg: {}", e)))?;
    Ok(output.into_inner())
}

/// Flatten an RGBA image onto an opaque white background.
pub fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    let mut rgb = RgbImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let channel = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([channel(pixel[0]), channel(pixel[1]), channel(pixel[2])]));
    }
    rgb
}

/// Encode an RGBA image as a PNG base64 data URL for the JSON response.
pub fn to_png_data_url(image: &RgbaImage) -> Result<String, WatermarkError> {
    let png = encode_png(image)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}
