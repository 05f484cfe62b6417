//! Content tree loading.
//!
//! Builds the [`Site`] tree the plugin pipeline transforms. The filesystem is
//! the data source:
//!
//! ```text
//! content/
//! ├── site.toml                 # site-wide fields (optional)
//! ├── landscapes/               # album
//! │   ├── album.toml            # album fields (optional)
//! │   ├── dawn/                 # image entry
//! │   │   ├── image.jpg         # exactly one image.<ext> file
//! │   │   └── image.toml        # image fields (optional)
//! │   └── mountains/
//! │       └── image.jpg
//! └── travel/
//!     └── ...
//! ```
//!
//! Hidden entries are skipped everywhere. Every TOML sidecar is optional and
//! treated as an empty table when absent; an image directory must contain
//! exactly one `image.<ext>` file. Embedded IPTC metadata is attached to each
//! image under the `meta` field.
//!
//! Albums and images can be ordered by any field via configuration:
//!
//! ```toml
//! [sort.albums]
//! property = "title"
//! order = "desc"       # "asc" is the default
//! ```

pub mod iptc;
pub mod types;

pub use types::{Album, Image, Site};

use crate::config::{Config, ConfigError};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("TOML parse error in {0}: {1}")]
    Toml(PathBuf, toml::de::Error),
    #[error("Invalid TOML structure in {0}: {1}")]
    Structure(PathBuf, serde_json::Error),
    #[error("No image file found within {0}")]
    NoImageFile(PathBuf),
    #[error("Found more than one image file within {0}")]
    MultipleImageFiles(PathBuf),
    #[error(transparent)]
    Meta(#[from] iptc::MetaError),
}

/// Load the full content tree from the configured content directory.
pub fn load_content(config: &Config) -> Result<Site, ContentError> {
    let content_dir: PathBuf = config.get("content_directory")?;
    let mut fields = read_fields(&content_dir.join("site.toml"))?;
    fields.remove("albums");
    let albums = load_albums(config, &content_dir)?;
    Ok(Site { fields, albums })
}

fn load_albums(config: &Config, content_dir: &Path) -> Result<Vec<Album>, ContentError> {
    let directories = list_subdirectories(content_dir)?;
    info!(
        "Found albums {}",
        directories
            .iter()
            .map(|d| basename(d))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let albums = directories
        .iter()
        .map(|dir| load_album(config, dir))
        .collect::<Result<Vec<_>, _>>()?;
    sort_by_config(config, "sort.albums", albums, album_sort_value)
}

fn load_album(config: &Config, dir: &Path) -> Result<Album, ContentError> {
    let mut fields = read_fields(&dir.join("album.toml"))?;
    fields.remove("id");
    fields.remove("images");
    Ok(Album {
        id: basename(dir),
        fields,
        images: load_images(config, dir)?,
    })
}

fn load_images(config: &Config, album_dir: &Path) -> Result<Vec<Image>, ContentError> {
    let directories = list_subdirectories(album_dir)?;
    info!(
        "Found images {} within album {}",
        directories
            .iter()
            .map(|d| basename(d))
            .collect::<Vec<_>>()
            .join(", "),
        basename(album_dir)
    );
    let images = directories
        .iter()
        .map(|dir| load_image(dir))
        .collect::<Result<Vec<_>, _>>()?;
    sort_by_config(config, "sort.images", images, image_sort_value)
}

fn load_image(dir: &Path) -> Result<Image, ContentError> {
    let filename = find_image_file(dir)?;
    let mut fields = read_fields(&dir.join("image.toml"))?;
    fields.remove("id");
    fields.remove("filename");
    fields.insert(
        "meta".to_string(),
        Value::Object(iptc::read_meta(&filename)?),
    );
    Ok(Image {
        id: basename(dir),
        filename,
        fields,
    })
}

/// Locate the one `image.<ext>` file in an image directory.
fn find_image_file(dir: &Path) -> Result<PathBuf, ContentError> {
    let candidates: Vec<PathBuf> = crate::formats::extensions()
        .map(|ext| dir.join(format!("image.{ext}")))
        .filter(|path| path.is_file())
        .collect();

    match candidates.len() {
        0 => Err(ContentError::NoImageFile(dir.to_path_buf())),
        1 => Ok(candidates.into_iter().next().unwrap_or_default()),
        _ => Err(ContentError::MultipleImageFiles(dir.to_path_buf())),
    }
}

/// Visible subdirectories of `directory`, sorted by name.
///
/// Entries whose metadata cannot be read (permissions) are skipped rather
/// than failing the whole load.
fn list_subdirectories(directory: &Path) -> Result<Vec<PathBuf>, ContentError> {
    let entries = fs::read_dir(directory).map_err(|e| {
        error!("Error reading directory {}, {}", directory.display(), e);
        e
    })?;

    let mut directories: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| !basename(path).starts_with('.'))
        .filter(|path| path.is_dir())
        .collect();
    directories.sort();
    Ok(directories)
}

/// Read a TOML sidecar into an open fields map; absent files are empty.
fn read_fields(path: &Path) -> Result<Map<String, Value>, ContentError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => {
            error!("Error reading file {}, {}", path.display(), e);
            return Err(e.into());
        }
    };
    let table: toml::Table =
        toml::from_str(&text).map_err(|e| ContentError::Toml(path.to_path_buf(), e))?;
    let value = serde_json::to_value(table)
        .map_err(|e| ContentError::Structure(path.to_path_buf(), e))?;
    Ok(value.as_object().cloned().unwrap_or_default())
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

// ============================================================================
// Configurable sorting
// ============================================================================

fn album_sort_value(album: &Album, property: &str) -> Option<Value> {
    if property == "id" {
        Some(Value::String(album.id.clone()))
    } else {
        album.field(property).cloned()
    }
}

fn image_sort_value(image: &Image, property: &str) -> Option<Value> {
    if property == "id" {
        Some(Value::String(image.id.clone()))
    } else {
        image.field(property).cloned()
    }
}

/// Sort items by the property configured under `<prefix>.property`, if any.
fn sort_by_config<T>(
    config: &Config,
    prefix: &str,
    mut items: Vec<T>,
    sort_value: impl Fn(&T, &str) -> Option<Value>,
) -> Result<Vec<T>, ContentError> {
    if !config.has(&format!("{prefix}.property")) {
        return Ok(items);
    }
    let property: String = config.get(&format!("{prefix}.property"))?;
    let order: String = config.get_or(&format!("{prefix}.order"), "asc".to_string())?;
    let descending = order == "desc";

    items.sort_by(|a, b| {
        let ordering = compare_values(
            sort_value(a, &property).as_ref(),
            sort_value(b, &property).as_ref(),
        );
        if descending { ordering.reverse() } else { ordering }
    });
    Ok(items)
}

/// Order two optional field values: absent first, numbers numerically,
/// strings lexicographically, mixed types by JSON text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    /// A content tree with two albums of one image each.
    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(&root.join("site.toml"), "title = \"My Site\"\n");
        write(
            &root.join("alpha/album.toml"),
            "title = \"Alpha\"\nposition = 2\n",
        );
        write(&root.join("alpha/one/image.toml"), "title = \"One\"\n");
        write_image(&root.join("alpha/one/image.jpg"));
        write(
            &root.join("beta/album.toml"),
            "title = \"Beta\"\nposition = 1\n",
        );
        write_image(&root.join("beta/two/image.jpg"));
        tmp
    }

    fn write_image(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        // Just a marker; nothing decodes the pixels at load time
        fs::write(path, [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
    }

    fn config_for(root: &Path) -> Config {
        Config::from_value(json!({ "content_directory": root.to_str().unwrap() }))
    }

    #[test]
    fn loads_site_fields_and_albums() {
        let tmp = fixture();
        let site = load_content(&config_for(tmp.path())).unwrap();

        assert_eq!(site.str_field("title"), Some("My Site"));
        assert_eq!(site.albums.len(), 2);
        assert_eq!(site.albums[0].id, "alpha");
        assert_eq!(site.albums[0].str_field("title"), Some("Alpha"));
        assert_eq!(site.albums[0].images[0].id, "one");
        assert_eq!(site.albums[0].images[0].str_field("title"), Some("One"));
    }

    #[test]
    fn missing_site_toml_gives_empty_fields() {
        let tmp = TempDir::new().unwrap();
        let site = load_content(&config_for(tmp.path())).unwrap();
        assert!(site.fields.is_empty());
        assert!(site.albums.is_empty());
    }

    #[test]
    fn image_gets_filename_and_meta() {
        let tmp = fixture();
        let site = load_content(&config_for(tmp.path())).unwrap();
        let image = &site.albums[0].images[0];

        assert!(image.filename.ends_with("alpha/one/image.jpg"));
        assert_eq!(image.field("meta"), Some(&json!({})));
    }

    #[test]
    fn hidden_directories_are_skipped() {
        let tmp = fixture();
        write_image(&tmp.path().join(".hidden/x/image.jpg"));
        write_image(&tmp.path().join("alpha/.wip/image.jpg"));

        let site = load_content(&config_for(tmp.path())).unwrap();
        assert_eq!(site.albums.len(), 2);
        assert_eq!(site.albums[0].images.len(), 1);
    }

    #[test]
    fn image_directory_without_image_file_errors() {
        let tmp = fixture();
        fs::create_dir_all(tmp.path().join("alpha/empty")).unwrap();

        let result = load_content(&config_for(tmp.path()));
        assert!(matches!(result, Err(ContentError::NoImageFile(_))));
    }

    #[test]
    fn image_directory_with_two_image_files_errors() {
        let tmp = fixture();
        write_image(&tmp.path().join("alpha/one/image.png"));

        let result = load_content(&config_for(tmp.path()));
        assert!(matches!(result, Err(ContentError::MultipleImageFiles(_))));
    }

    #[test]
    fn invalid_sidecar_toml_errors() {
        let tmp = fixture();
        write(&tmp.path().join("alpha/album.toml"), "title = [broken");

        let result = load_content(&config_for(tmp.path()));
        assert!(matches!(result, Err(ContentError::Toml(_, _))));
    }

    #[test]
    fn albums_default_to_directory_order() {
        let tmp = fixture();
        let site = load_content(&config_for(tmp.path())).unwrap();
        let ids: Vec<&str> = site.albums.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);
    }

    #[test]
    fn albums_sort_by_configured_property() {
        let tmp = fixture();
        let config = Config::from_value(json!({
            "content_directory": tmp.path().to_str().unwrap(),
            "sort": { "albums": { "property": "position" } },
        }));

        let site = load_content(&config).unwrap();
        let ids: Vec<&str> = site.albums.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["beta", "alpha"]);
    }

    #[test]
    fn albums_sort_descending() {
        let tmp = fixture();
        let config = Config::from_value(json!({
            "content_directory": tmp.path().to_str().unwrap(),
            "sort": { "albums": { "property": "title", "order": "desc" } },
        }));

        let site = load_content(&config).unwrap();
        let ids: Vec<&str> = site.albums.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["beta", "alpha"]);
    }

    #[test]
    fn sidecar_cannot_override_structural_fields() {
        let tmp = fixture();
        write(
            &tmp.path().join("alpha/album.toml"),
            "id = \"spoofed\"\ntitle = \"Alpha\"\n",
        );

        let site = load_content(&config_for(tmp.path())).unwrap();
        assert_eq!(site.albums[0].id, "alpha");
        assert!(!site.albums[0].fields.contains_key("id"));
    }

    #[test]
    fn compare_values_orders_mixed_presence() {
        let one = json!(1);
        let two = json!(2);
        assert_eq!(compare_values(None, Some(&one)), Ordering::Less);
        assert_eq!(compare_values(Some(&one), Some(&two)), Ordering::Less);
        assert_eq!(compare_values(Some(&two), Some(&one)), Ordering::Greater);
    }
}
