//! Image file extension ↔ output format mapping.
//!
//! The content loader uses [`extensions`] to find an album entry's image
//! file; the convert plugin uses [`format_for_extension`] to pick the output
//! codec from a configured target filename.

use image::ImageFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Unsupported file extension {0}")]
    Unsupported(String),
}

/// Extensions with a compiled-in codec, in candidate-search order.
const FORMAT_EXTENSIONS: &[(&str, ImageFormat)] = &[
    ("gif", ImageFormat::Gif),
    ("jpeg", ImageFormat::Jpeg),
    ("jpg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// All supported image file extensions.
pub fn extensions() -> impl Iterator<Item = &'static str> {
    FORMAT_EXTENSIONS.iter().map(|(ext, _)| *ext)
}

/// The output format for a file extension (case-insensitive, no leading dot).
pub fn format_for_extension(extension: &str) -> Result<ImageFormat, FormatError> {
    let lower = extension.to_ascii_lowercase();
    FORMAT_EXTENSIONS
        .iter()
        .find(|(ext, _)| *ext == lower)
        .map(|(_, format)| *format)
        .ok_or_else(|| FormatError::Unsupported(extension.to_string()))
}
