//! File-based watermarking driver.
//!
//! Reads an image from disk, composites the watermark, and writes the
//! result. The on-disk format is decided once, by the output extension:
//! `.jpg`/`.jpeg` produce JPEG with alpha flattened to white, everything
//! else produces PNG with alpha preserved.

use crate::watermark::{codec, composite, WatermarkConfig, WatermarkError};
use std::path::Path;

/// Watermark `input` and write the result to `output`.
///
/// Verifies the input exists before any decoding; a missing file reports
/// `FileNotFound` and writes nothing.
pub fn run(input: &Path, output: &Path, config: &WatermarkConfig) -> Result<(), WatermarkError> {
    if !input.exists() {
        return Err(WatermarkError::FileNotFound(input.to_path_buf()));
    }

    let source = image::open(input).map_err(|e| WatermarkError::DecodeError(e.to_string()))?;
    let result = composite(&source, config)?;

    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let encoded = match extension.as_deref() {
        Some("jpg") | Some("jpeg") => codec::encode_jpeg(&result, codec::JPEG_QUALITY)?,
        _ => codec::encode_png(&result)?,
    };

    std::fs::write(output, &encoded).map_err(|e| WatermarkError::IoError(e.to_string()))?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        width = result.width(),
        height = result.height(),
        "Watermarked image written"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_fixture(path: &Path, width: u32, height: u32) {
        let image = RgbaImage::from_pixel(width, height, Rgba([180, 180, 180, 255]));
        image.save(path).unwrap();
    }

    // Test: Missing input reports FileNotFound and writes nothing
    #[test]
    fn test_missing_input_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("does-not-exist.png");
        let output = dir.path().join("out.png");

        let result = run(&input, &output, &WatermarkConfig::default());
        assert!(matches!(result, Err(WatermarkError::FileNotFound(_))));
        assert!(!output.exists(), "No output may be written on failure");
    }

    // Test: PNG output preserves dimensions and alpha
    #[test]
    fn test_png_round_trip() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        write_fixture(&input, 200, 150);

        run(&input, &output, &WatermarkConfig::default()).unwrap();

        let written = image::open(&output).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (200, 150));
    }

    // Test: JPEG output flattens alpha
    #[test]
    fn test_jpeg_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.jpg");
        write_fixture(&input, 200, 150);

        run(&input, &output, &WatermarkConfig::default()).unwrap();

        let written = image::open(&output).unwrap();
        assert_eq!(written.to_rgba8().dimensions(), (200, 150));
    }

    // Test: Corrupt input reports a decode error
    #[test]
    fn test_corrupt_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        std::fs::write(&input, b"definitely not a png").unwrap();

        let result = run(&input, &output, &WatermarkConfig::default());
        assert!(matches!(result, Err(WatermarkError::DecodeError(_))));
        assert!(!output.exists());
    }
}
