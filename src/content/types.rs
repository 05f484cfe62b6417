//! The content tree passed through the plugin pipeline.
//!
//! Three levels: [`Site`] → [`Album`] → [`Image`]. Each level carries a small
//! set of structural fields plus an open `fields` map holding whatever the
//! TOML sidecars and embedded metadata provided. The open map is flattened in
//! the serialized form, so `site.toml`'s `title = "..."` appears as
//! `content.title` to plugins, exactly as written.
//!
//! All three types are fully owned data — `Clone` produces a deep copy, which
//! is what the plugin engine relies on for hook isolation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// The root of the content tree: site-wide fields plus all albums.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub albums: Vec<Album>,
}

/// One album: a directory of images with its own metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    /// Directory basename; also the album's path segment in the target tree.
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// One image: the source file plus its metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Directory basename; also the image's path segment in the target tree.
    pub id: String,
    /// Absolute or project-relative path to the source image file.
    pub filename: PathBuf,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Walk an open fields map down a dotted path (`meta.title`, `tags[0]`).
pub(crate) fn lookup_field<'a>(fields: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let segments = crate::config::parse_path(path);
    let (first, rest) = segments.split_first()?;
    let root = match first {
        crate::config::Segment::Key(key) => fields.get(key)?,
        crate::config::Segment::Index(_) => return None,
    };
    crate::config::resolve_segments(root, rest)
}

impl Site {
    /// A field value by dotted path.
    pub fn field(&self, path: &str) -> Option<&Value> {
        lookup_field(&self.fields, path)
    }

    /// A string field, if present and a string.
    pub fn str_field(&self, path: &str) -> Option<&str> {
        self.field(path).and_then(Value::as_str)
    }
}

impl Album {
    /// A field value by dotted path.
    pub fn field(&self, path: &str) -> Option<&Value> {
        lookup_field(&self.fields, path)
    }

    /// A string field, if present and a string.
    pub fn str_field(&self, path: &str) -> Option<&str> {
        self.field(path).and_then(Value::as_str)
    }

    /// Display title: the `title` field, falling back to the directory id.
    pub fn title(&self) -> &str {
        self.str_field("title").unwrap_or(&self.id)
    }
}

impl Image {
    /// A field value by dotted path.
    pub fn field(&self, path: &str) -> Option<&Value> {
        lookup_field(&self.fields, path)
    }

    /// A string field, if present and a string.
    pub fn str_field(&self, path: &str) -> Option<&str> {
        self.field(path).and_then(Value::as_str)
    }

    /// Display title: the `title` field, then embedded metadata, then the id.
    pub fn title(&self) -> &str {
        self.str_field("title")
            .or_else(|| self.str_field("meta.title"))
            .unwrap_or(&self.id)
    }

    /// A named property as text, for matching and sorting.
    ///
    /// `id` and `filename` address the structural fields; anything else is a
    /// dotted path into the open fields map. Non-string scalars are rendered
    /// with their JSON representation.
    pub fn property(&self, path: &str) -> Option<String> {
        match path {
            "id" => Some(self.id.clone()),
            "filename" => Some(self.filename.display().to_string()),
            _ => self.field(path).map(value_to_string),
        }
    }
}

/// Render a field value as plain text.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
