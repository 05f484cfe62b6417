//! Built-in `convert` plugin: derived image variants.
//!
//! Each entry of the `convert` config array produces one output file per
//! image, written next to the copy plugin's output in the target tree:
//!
//! ```toml
//! [[convert]]
//! filename = "thumbnail.jpg"
//! quality = 85
//!
//! [convert.resize]
//! width = 400
//! height = 500
//! crop = true          # fill the box exactly, center-cropped
//!
//! [convert.unsharp]
//! sigma = 0.5
//! threshold = 0
//!
//! [[convert]]
//! filename = "large.webp"
//!
//! [convert.resize]
//! width = 2000         # fit within, aspect preserved
//! ```
//!
//! The output codec comes from the target filename's extension. All pixel
//! work is pure Rust via the `image` crate: Lanczos3 resampling,
//! `resize_to_fill` for crops, `unsharpen` for sharpening. A conversion may
//! be limited to matching images with a `convert[i].match` table.

use super::engine::{HookResult, Plugin};
use super::matcher::{self, MatchError};
use super::writer::{self, WriterError};
use crate::config::{Config, ConfigError};
use crate::content::{Album, Image, Site};
use crate::formats::{self, FormatError};
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Writer(#[from] WriterError),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] image::ImageError),
    #[error("Cropping requires both a width and a height")]
    CropRequiresBoth,
    #[error("Resizing requires at least a width or a height")]
    ResizeRequiresOne,
}

pub fn plugin() -> Plugin {
    Plugin::named("convert").image(convert_image)
}

fn convert_image(
    image: Image,
    _index: usize,
    _count: usize,
    album: &Album,
    _site: &Site,
    config: &Config,
) -> HookResult<Image> {
    let conversions: Vec<serde_json::Value> = config.get("convert")?;
    if conversions.is_empty() {
        return Ok(None);
    }

    let source = image::open(&image.filename).map_err(ConvertError::Imaging)?;
    for conversion in 0..conversions.len() {
        if !matcher::image_matches(config, &format!("convert[{conversion}]"), &image)? {
            continue;
        }
        convert_single(&source, &image, album, conversion, config)?;
    }
    Ok(None)
}

/// Run one configured conversion against a decoded source image.
fn convert_single(
    source: &DynamicImage,
    image: &Image,
    album: &Album,
    conversion: usize,
    config: &Config,
) -> Result<(), ConvertError> {
    let key = |path: &str| format!("convert[{conversion}].{path}");

    let target: String = config.get(&key("filename"))?;
    debug!("Converting image {}/{} to {}", album.id, image.id, target);

    let extension = Path::new(&target)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let format = formats::format_for_extension(extension)?;

    let mut output = source.clone();
    if config.has(&key("resize")) {
        output = apply_resize(output, conversion, config)?;
    }
    if config.has(&key("unsharp")) {
        let sigma: f32 = config.get(&key("unsharp.sigma"))?;
        let threshold: i32 = config.get(&key("unsharp.threshold"))?;
        output = DynamicImage::from(image::imageops::unsharpen(&output, sigma, threshold));
    }
    let quality: u32 = config.get_or(&key("quality"), 90)?;

    let bytes = encode(&output, format, quality)?;
    writer::write_image_file(config, album, image, &target, &bytes)?;
    Ok(())
}

/// Apply the `resize` block of one conversion.
///
/// With `crop = true` the output fills the box exactly (resize-to-fill then
/// center crop); otherwise it fits within the given bounds, and a single
/// dimension means "unbounded on the other axis".
fn apply_resize(
    source: DynamicImage,
    conversion: usize,
    config: &Config,
) -> Result<DynamicImage, ConvertError> {
    let key = |path: &str| format!("convert[{conversion}].resize.{path}");
    let width: Option<u32> = config.get_or(&key("width"), None)?;
    let height: Option<u32> = config.get_or(&key("height"), None)?;

    if config.get_or(&key("crop"), false)? {
        let (Some(width), Some(height)) = (width, height) else {
            return Err(ConvertError::CropRequiresBoth);
        };
        Ok(source.resize_to_fill(width, height, FilterType::Lanczos3))
    } else {
        if width.is_none() && height.is_none() {
            return Err(ConvertError::ResizeRequiresOne);
        }
        Ok(source.resize(
            width.unwrap_or(u32::MAX),
            height.unwrap_or(u32::MAX),
            FilterType::Lanczos3,
        ))
    }
}

/// Encode into the requested container, honoring quality where the codec has
/// a lossy knob (JPEG). JPEG has no alpha channel, so pixels are flattened
/// to RGB first.
fn encode(
    output: &DynamicImage,
    format: image::ImageFormat,
    quality: u32,
) -> Result<Vec<u8>, ConvertError> {
    let mut buffer = Cursor::new(Vec::new());
    match format {
        image::ImageFormat::Jpeg => {
            let encoder =
                JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100) as u8);
            DynamicImage::ImageRgb8(output.to_rgb8()).write_with_encoder(encoder)?;
        }
        other => output.write_to(&mut buffer, other)?,
    }
    Ok(buffer.into_inner())
}
