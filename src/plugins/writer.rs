//! Target-tree path construction and file output for plugins.
//!
//! Every writing plugin goes through this module so the generated site has a
//! single layout: site files at the target root, album files under
//! `<target>/<album id>/`, image files under `<target>/<album id>/<image id>/`.
//! Parent directories are created on demand.

use crate::config::{Config, ConfigError};
use crate::content::{Album, Image};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

fn target_directory(config: &Config) -> Result<PathBuf, WriterError> {
    Ok(config.get("target_directory")?)
}

/// Path of a site-level file in the target tree.
pub fn root_path(config: &Config, name: &str) -> Result<PathBuf, WriterError> {
    Ok(target_directory(config)?.join(name))
}

/// Path of an album-level file in the target tree.
pub fn album_path(config: &Config, album: &Album, name: &str) -> Result<PathBuf, WriterError> {
    Ok(target_directory(config)?.join(&album.id).join(name))
}

/// Path of an image-level file in the target tree.
pub fn image_path(
    config: &Config,
    album: &Album,
    image: &Image,
    name: &str,
) -> Result<PathBuf, WriterError> {
    Ok(target_directory(config)?
        .join(&album.id)
        .join(&image.id)
        .join(name))
}

fn write(path: &Path, contents: &[u8]) -> Result<(), WriterError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Write a site-level file, creating directories as needed.
pub fn write_root_file(config: &Config, name: &str, contents: &[u8]) -> Result<PathBuf, WriterError> {
    let path = root_path(config, name)?;
    write(&path, contents)?;
    Ok(path)
}

/// Write an album-level file, creating directories as needed.
pub fn write_album_file(
    config: &Config,
    album: &Album,
    name: &str,
    contents: &[u8],
) -> Result<PathBuf, WriterError> {
    let path = album_path(config, album, name)?;
    write(&path, contents)?;
    Ok(path)
}

/// Write an image-level file, creating directories as needed.
pub fn write_image_file(
    config: &Config,
    album: &Album,
    image: &Image,
    name: &str,
    contents: &[u8],
) -> Result<PathBuf, WriterError> {
    let path = image_path(config, album, image, name)?;
    write(&path, contents)?;
    Ok(path)
}

/// Copy an existing file to an image-level target path.
pub fn copy_image_file(
    config: &Config,
    album: &Album,
    image: &Image,
    name: &str,
    source: &Path,
) -> Result<PathBuf, WriterError> {
    let path = image_path(config, album, image, name)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, &path)?;
    Ok(path)
}
