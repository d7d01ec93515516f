//! Font resolution for watermark text.
//!
//! Resolving a font is a capability, not control flow: `resolve` always
//! succeeds. It prefers a bold system font and silently falls back to the
//! embedded face when none is available, so a missing font file can never
//! fail a watermarking call.

use ab_glyph::FontArc;
use std::sync::OnceLock;

/// Embedded fallback font (DejaVu Sans Mono Bold - free license, bundled
/// so text rendering works without any system fonts installed).
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSansMono-Bold.ttf");

/// Well-known bold system font locations, tried in order.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

static RESOLVED_FONT: OnceLock<FontArc> = OnceLock::new();

/// Resolve the watermark font.
///
/// Tries the system font paths first and falls back to the embedded font.
/// The result is cached for the lifetime of the process. Never fails.
pub fn resolve() -> FontArc {
    RESOLVED_FONT
        .get_or_init(|| {
            for path in SYSTEM_FONT_PATHS {
                if let Ok(data) = std::fs::read(path) {
                    if let Ok(font) = FontArc::try_from_vec(data) {
                        tracing::debug!(path = %path, "Loaded system watermark font");
                        return font;
                    }
                }
            }

            tracing::debug!("No system font available, using embedded fallback");
            FontArc::try_from_slice(EMBEDDED_FONT_DATA)
                .expect("Failed to load embedded font - this is a bug")
        })
        .clone()
}
