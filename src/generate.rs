//! Full pipeline orchestration: init plugins → load content → run plugins.

use crate::config::Config;
use crate::content::{self, ContentError};
use crate::plugins::{Pipeline, PipelineError};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Run one complete generator pass.
///
/// Plugin installation happens before content loading so a misconfigured
/// plugin setup fails without touching the filesystem tree.
pub fn generate(config: Arc<Config>) -> Result<(), GenerateError> {
    let pipeline = Pipeline::init(config.clone())?;
    let site = content::load_content(&config)?;
    pipeline.call_plugins(site)?;
    info!("All done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_png(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            32,
            16,
            image::Rgb([120, 140, 160]),
        ))
        .save(path)
        .unwrap();
    }

    /// End-to-end: a one-album project run through copy + convert + render.
    #[test]
    fn generates_a_full_site() {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        let target = tmp.path().join("target");

        std::fs::create_dir_all(&content).unwrap();
        std::fs::write(content.join("site.toml"), "title = \"Portfolio\"\n").unwrap();
        write_png(&content.join("landscapes/dawn/image.png"));

        let config = Arc::new(Config::from_value(json!({
            "content_directory": content.to_str().unwrap(),
            "plugin_directory": tmp.path().join("plugins").to_str().unwrap(),
            "target_directory": target.to_str().unwrap(),
            "plugins": ["convert", "copy", "render"],
            "convert": [{ "filename": "small.png", "resize": { "width": 16 } }],
        })));

        generate(config).unwrap();

        assert!(target.join("index.html").is_file());
        assert!(target.join("landscapes/index.html").is_file());
        assert!(target.join("landscapes/dawn/index.html").is_file());
        assert!(target.join("landscapes/dawn/image.png").is_file());
        let small = image::open(target.join("landscapes/dawn/small.png")).unwrap();
        assert_eq!(small.width(), 16);
    }

    #[test]
    fn unknown_plugin_name_aborts_the_run() {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        std::fs::create_dir_all(&content).unwrap();

        let config = Arc::new(Config::from_value(json!({
            "content_directory": content.to_str().unwrap(),
            "plugin_directory": tmp.path().join("plugins").to_str().unwrap(),
            "target_directory": tmp.path().join("target").to_str().unwrap(),
            "plugins": ["imaginary"],
        })));

        let error = generate(config).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Plugin imaginary could not be found"
        );
    }
}
