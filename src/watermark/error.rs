//! Watermark error types.
//!
//! Defines errors that can occur during watermark processing. Every failure
//! mode maps to a structured error; the drivers decide how to report it
//! (stderr for the CLI, JSON for the HTTP endpoint).

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during watermark processing.
#[derive(Debug)]
pub enum WatermarkError {
    /// Failed to decode the source image
    DecodeError(String),

    /// Failed to render the text watermark
    RenderError(String),

    /// Failed to encode the composited image
    EncodeError(String),

    /// Failed to read or write an image file
    IoError(String),

    /// Input file does not exist
    FileNotFound(PathBuf),

    /// A request parameter is malformed or out of range
    InvalidParameter { param: String, message: String },
}

impl WatermarkError {
    /// Shorthand for building an `InvalidParameter` error.
    pub fn invalid_param(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's input rather than the
    /// service itself. Drives the HTTP status code (400 vs 500).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::DecodeError(_) | Self::FileNotFound(_) | Self::InvalidParameter { .. }
        )
    }
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DecodeError(msg) => write!(f, "Failed to decode image: {}", msg),
            Self::RenderError(msg) => write!(f, "Failed to render text watermark: {}", msg),
            Self::EncodeError(msg) => write!(f, "Failed to encode image: {}", msg),
            Self::IoError(msg) => write!(f, "I/O error: {}", msg),
            Self::FileNotFound(path) => write!(f, "File '{}' not found", path.display()),
            Self::InvalidParameter { param, message } => {
                write!(f, "Invalid parameter '{}': {}", param, message)
            }
        }
    }
}

impl std::error::Error for WatermarkError {}
