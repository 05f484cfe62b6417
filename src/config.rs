//! Project configuration loading and the shared configuration accessor.
//!
//! Photopipe is configured by a single `photopipe.toml` in the project root.
//! The file is loaded once at startup into a dynamic value tree; plugins read
//! from it through the [`Config`] accessor with dotted path keys:
//!
//! ```toml
//! content_directory = "./content"
//! plugin_directory = "./plugins"
//! target_directory = "./target"
//!
//! plugins = ["convert", "copy", "render"]
//!
//! [[convert]]
//! filename = "thumbnail.jpg"
//! quality = 85
//!
//! [convert.resize]
//! width = 400
//! height = 500
//! crop = true
//! ```
//!
//! Lookups address nested tables with dots and arrays with brackets, e.g.
//! `convert[0].resize.width`. The tree is dynamic rather than a typed struct
//! because plugins — including project plugins loaded at runtime — define
//! their own keys; the set of valid paths is open-ended.
//!
//! Values handed out by [`Config::get`] are deserialized into owned types, so
//! a plugin can never mutate the shared configuration through what it reads.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to load {0}; {1}")]
    Load(String, std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Configuration parameter '{0}' does not exist")]
    Missing(String),
    #[error("Configuration parameter '{0}' has an unexpected type; {1}")]
    Type(String, serde_json::Error),
}

/// Shared read-only configuration accessor passed to every plugin hook.
#[derive(Debug, Clone)]
pub struct Config {
    root: Value,
}

impl Config {
    /// Load configuration from a TOML file and apply defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(path.display().to_string(), e))?;
        let table: toml::Table = toml::from_str(&text)?;
        let value = serde_json::to_value(table)
            .map_err(|e| ConfigError::Type("<root>".to_string(), e))?;
        Ok(Self::from_value(value))
    }

    /// Build a configuration from an in-memory JSON value.
    ///
    /// Used by the test suites and by embedders that assemble configuration
    /// programmatically. Defaults are applied the same way as for
    /// [`Config::load`].
    pub fn from_value(mut value: Value) -> Self {
        if let Some(table) = value.as_object_mut() {
            table
                .entry("content_directory")
                .or_insert_with(|| Value::String("./content".to_string()));
            table
                .entry("plugin_directory")
                .or_insert_with(|| Value::String("./plugins".to_string()));
        }
        Self { root: value }
    }

    /// Read the value at `path`, deserialized into an owned `T`.
    ///
    /// Fails if the path does not exist or the value cannot deserialize.
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConfigError> {
        match resolve(&self.root, path) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| ConfigError::Type(path.to_string(), e)),
            None => Err(ConfigError::Missing(path.to_string())),
        }
    }

    /// Read the value at `path`, falling back to `default` if absent.
    pub fn get_or<T: DeserializeOwned>(&self, path: &str, default: T) -> Result<T, ConfigError> {
        match resolve(&self.root, path) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| ConfigError::Type(path.to_string(), e)),
            None => Ok(default),
        }
    }

    /// Whether a value exists at `path`.
    pub fn has(&self, path: &str) -> bool {
        resolve(&self.root, path).is_some()
    }
}

/// One step of a dotted path: a table key or an array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Key(String),
    Index(usize),
}

/// Parse a dotted path like `convert[0].resize.width` into segments.
///
/// Malformed bracket expressions (unterminated, non-numeric) are kept as
/// literal key text, which simply fails to resolve.
pub(crate) fn parse_path(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        let (name, brackets) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };
        if !name.is_empty() {
            segments.push(Segment::Key(name.to_string()));
        }
        let mut rest = brackets;
        while let Some(stripped) = rest.strip_prefix('[') {
            match stripped.find(']').and_then(|end| {
                stripped[..end]
                    .parse::<usize>()
                    .ok()
                    .map(|index| (index, &stripped[end + 1..]))
            }) {
                Some((index, after)) => {
                    segments.push(Segment::Index(index));
                    rest = after;
                }
                None => {
                    segments.push(Segment::Key(rest.to_string()));
                    break;
                }
            }
        }
    }
    segments
}

/// Walk `value` down a parsed segment list.
pub(crate) fn resolve_segments<'a>(value: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = match segment {
            Segment::Key(key) => current.as_object()?.get(key)?,
            Segment::Index(index) => current.as_array()?.get(*index)?,
        };
    }
    Some(current)
}

/// Walk `value` down a dotted path.
pub(crate) fn resolve<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    resolve_segments(value, &parse_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> Config {
        Config::from_value(json!({
            "target_directory": "./target",
            "plugins": ["convert", "copy"],
            "sort": { "albums": { "property": "title", "order": "desc" } },
            "convert": [
                { "filename": "small.jpg", "resize": { "width": 400 } },
                { "filename": "large.jpg", "quality": 95 },
            ],
        }))
    }

    #[test]
    fn get_reads_top_level_value() {
        let target: String = config().get("target_directory").unwrap();
        assert_eq!(target, "./target");
    }

    #[test]
    fn get_reads_nested_value() {
        let property: String = config().get("sort.albums.property").unwrap();
        assert_eq!(property, "title");
    }

    #[test]
    fn get_reads_indexed_value() {
        let width: u32 = config().get("convert[0].resize.width").unwrap();
        assert_eq!(width, 400);
        let filename: String = config().get("convert[1].filename").unwrap();
        assert_eq!(filename, "large.jpg");
    }

    #[test]
    fn get_reads_whole_array() {
        let plugins: Vec<String> = config().get("plugins").unwrap();
        assert_eq!(plugins, vec!["convert", "copy"]);
    }

    #[test]
    fn get_missing_path_errors() {
        let result = config().get::<String>("sort.images.property");
        assert!(
            matches!(result, Err(ConfigError::Missing(path)) if path == "sort.images.property")
        );
    }

    #[test]
    fn get_wrong_type_errors() {
        let result = config().get::<u32>("target_directory");
        assert!(matches!(result, Err(ConfigError::Type(path, _)) if path == "target_directory"));
    }

    #[test]
    fn get_or_returns_default_when_missing() {
        let mode: String = config().get_or("convert[0].mode", "max".to_string()).unwrap();
        assert_eq!(mode, "max");
    }

    #[test]
    fn get_or_reads_present_value() {
        let quality: u32 = config().get_or("convert[1].quality", 90).unwrap();
        assert_eq!(quality, 95);
    }

    #[test]
    fn get_or_with_optional_type() {
        let width: Option<u32> = config().get_or("convert[0].resize.width", None).unwrap();
        assert_eq!(width, Some(400));
        let height: Option<u32> = config().get_or("convert[0].resize.height", None).unwrap();
        assert_eq!(height, None);
    }

    #[test]
    fn has_reports_existence() {
        let config = config();
        assert!(config.has("sort.albums.property"));
        assert!(config.has("convert[0].resize"));
        assert!(!config.has("sort.images.property"));
        assert!(!config.has("convert[2]"));
    }

    #[test]
    fn defaults_fill_in_directories() {
        let config = Config::from_value(json!({}));
        let content: String = config.get("content_directory").unwrap();
        let plugins: String = config.get("plugin_directory").unwrap();
        assert_eq!(content, "./content");
        assert_eq!(plugins, "./plugins");
    }

    #[test]
    fn explicit_directories_survive_defaults() {
        let config = Config::from_value(json!({ "content_directory": "./photos" }));
        let content: String = config.get("content_directory").unwrap();
        assert_eq!(content, "./photos");
    }

    #[test]
    fn load_reads_toml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("photopipe.toml");
        std::fs::write(&path, "target_directory = \"./out\"\nplugins = [\"copy\"]\n").unwrap();

        let config = Config::load(&path).unwrap();
        let target: String = config.get("target_directory").unwrap();
        assert_eq!(target, "./out");
        let plugins: Vec<String> = config.get("plugins").unwrap();
        assert_eq!(plugins, vec!["copy"]);
        // Defaults still applied
        assert!(config.has("content_directory"));
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Config::load(&dir.path().join("photopipe.toml"));
        assert!(matches!(result, Err(ConfigError::Load(_, _))));
    }

    #[test]
    fn load_invalid_toml_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("photopipe.toml");
        std::fs::write(&path, "plugins = [unterminated").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn parse_path_splits_keys_and_indexes() {
        assert_eq!(
            parse_path("convert[0].resize.width"),
            vec![
                Segment::Key("convert".to_string()),
                Segment::Index(0),
                Segment::Key("resize".to_string()),
                Segment::Key("width".to_string()),
            ]
        );
    }

    #[test]
    fn parse_path_handles_consecutive_indexes() {
        assert_eq!(
            parse_path("matrix[1][2]"),
            vec![
                Segment::Key("matrix".to_string()),
                Segment::Index(1),
                Segment::Index(2),
            ]
        );
    }

    #[test]
    fn malformed_index_does_not_resolve() {
        let config = config();
        assert!(!config.has("convert[x].filename"));
        assert!(!config.has("convert[0"));
    }
}
