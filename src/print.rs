//! Content inspection for `photopipe print`.
//!
//! Loads the content tree and renders it as an indented, information-first
//! listing — each entity leads with its position and title, with source
//! identifiers as context lines. `--json` emits the raw tree instead, and
//! `--no-meta` strips embedded image metadata from either form.
//!
//! ```text
//! My Portfolio
//! 001 Landscapes (2 images)
//!     Source: landscapes/
//!     001 Dawn
//!         Source: dawn/ (image.jpg)
//!     002 Mountains
//!         Source: mountains/ (image.jpg)
//! ```

use crate::config::Config;
use crate::content::{self, ContentError, Image, Site};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrintError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PrintOptions {
    /// Emit the content tree as pretty-printed JSON.
    pub json: bool,
    /// Exclude embedded image metadata from the output.
    pub no_meta: bool,
}

/// Load content and print it to stdout.
pub fn print(config: &Config, options: PrintOptions) -> Result<(), PrintError> {
    let mut site = content::load_content(config)?;
    if options.no_meta {
        strip_meta(&mut site);
    }
    for line in format_site(&site, options)? {
        println!("{line}");
    }
    Ok(())
}

/// Remove the embedded metadata field from every image.
fn strip_meta(site: &mut Site) {
    for album in &mut site.albums {
        for image in &mut album.images {
            image.fields.remove("meta");
        }
    }
}

/// Render the content tree as output lines.
fn format_site(site: &Site, options: PrintOptions) -> Result<Vec<String>, PrintError> {
    if options.json {
        let json = serde_json::to_string_pretty(site)?;
        return Ok(json.lines().map(String::from).collect());
    }

    let mut lines = Vec::new();
    lines.push(site.str_field("title").unwrap_or("(untitled site)").to_string());

    for (position, album) in site.albums.iter().enumerate() {
        lines.push(format!(
            "{:0>3} {} ({} images)",
            position + 1,
            album.title(),
            album.images.len()
        ));
        lines.push(format!("    Source: {}/", album.id));

        for (position, image) in album.images.iter().enumerate() {
            lines.push(format!("    {:0>3} {}", position + 1, image.title()));
            lines.push(format!(
                "        Source: {}/ ({})",
                image.id,
                basename(image)
            ));
            if !options.no_meta {
                if let Some(Value::Object(meta)) = image.field("meta") {
                    for (key, value) in meta {
                        lines.push(format!(
                            "        {key}: {}",
                            content::types::value_to_string(value)
                        ));
                    }
                }
            }
        }
    }
    Ok(lines)
}

fn basename(image: &Image) -> String {
    image
        .filename
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
