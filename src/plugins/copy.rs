//! Built-in `copy` plugin: copies each source image into the target tree.
//!
//! The output filename defaults to the source file's basename and can be
//! overridden with `copy.filename`.

use super::engine::{HookResult, Plugin};
use super::writer;
use crate::config::Config;
use crate::content::{Album, Image, Site};
use tracing::debug;

pub fn plugin() -> Plugin {
    Plugin::named("copy").image(copy_image)
}

fn copy_image(
    image: Image,
    _index: usize,
    _count: usize,
    album: &Album,
    _site: &Site,
    config: &Config,
) -> HookResult<Image> {
    debug!("Copying image {}/{}", album.id, image.id);
    let basename = image
        .filename
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let filename: String = config.get_or("copy.filename", basename)?;
    writer::copy_image_file(config, album, &image, &filename, &image.filename)?;
    Ok(None)
}
