//! Watermark module for compositing text watermarks onto images.
//!
//! Pure function from (image, config) to image: no state survives a call,
//! and every intermediate layer is scoped to one invocation.
//!
//! # Features
//!
//! - **Center anchor** with arbitrary rotation (oversized layer, rotate,
//!   center-crop - so diagonal text never clips at the image edges)
//! - **Corner anchors** with 5%-of-width padding, no rotation
//! - Stroke/outline under the fill for legibility on any background
//! - Guaranteed font resolution with an embedded fallback face
//! - PNG (alpha) and JPEG (flattened to white) output encodings

pub mod codec;
pub mod compositor;
pub mod config;
pub mod error;
pub mod font;
pub mod text_renderer;

// Re-export main types for convenience
pub use compositor::composite;
pub use config::{WatermarkAnchor, WatermarkConfig};
pub use error::WatermarkError;
pub use text_renderer::{measure_text, parse_hex_color, Color};
