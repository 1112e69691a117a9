//! Structured error types for the quotation composer.
//!
//! Two families: [`AssetError`] covers everything that can go wrong while
//! fetching and normalizing an image. Those never reach the caller of
//! [`compose`](crate::QuotationComposer::compose); the prefetcher logs them
//! and lays the item out without its picture. [`ComposerError`] is the
//! fatal kind: bad input or a document that could not be produced.

use thiserror::Error;

/// The error type returned by all public composer entry points.
#[derive(Debug, Error)]
pub enum ComposerError {
    /// JSON input failed to parse as a quotation request.
    #[error("Failed to parse quotation request: {source}{}", format_hint(.hint))]
    ParseError {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// Layout or PDF generation failed.
    #[error("Render error: {0}")]
    RenderError(String),
    /// The finished document could not be written out.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for ComposerError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the quotation request schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        ComposerError::ParseError { source: e, hint }
    }
}

/// Why a single image could not be resolved.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read image file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP request for '{url}' failed: {message}")]
    Http { url: String, message: String },
    #[error("invalid data URI: missing comma")]
    InvalidDataUri,
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image data too short")]
    TooShort,
    #[error("unsupported image format (expected JPEG, PNG or WebP)")]
    UnsupportedFormat,
    #[error("image has zero width or height")]
    EmptyImage,
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to re-encode image as JPEG: {0}")]
    Encode(#[source] image::ImageError),
}
