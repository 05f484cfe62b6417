//! Config-driven image filtering for transformation plugins.
//!
//! A plugin config block may carry a `match` table restricting which images
//! it applies to:
//!
//! ```toml
//! [[convert]]
//! filename = "print.tiff"
//!
//! [convert.match]
//! property = "meta.keywords[0]"
//! regex = "^print$"
//! ```
//!
//! Without a `match` table every image matches.

use crate::config::{Config, ConfigError};
use crate::content::Image;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid match regex: {0}")]
    Regex(#[from] regex::Error),
}

/// Whether `image` passes the `match` filter configured under `config_path`.
///
/// An image without the configured property never matches.
pub fn image_matches(
    config: &Config,
    config_path: &str,
    image: &Image,
) -> Result<bool, MatchError> {
    if !config.has(&format!("{config_path}.match")) {
        return Ok(true);
    }
    let property: String = config.get(&format!("{config_path}.match.property"))?;
    let pattern: String = config.get(&format!("{config_path}.match.regex"))?;
    let regex = Regex::new(&pattern)?;

    Ok(image
        .property(&property)
        .is_some_and(|value| regex.is_match(&value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn image() -> Image {
        Image {
            id: "dawn-01".to_string(),
            fields: json!({ "meta": { "keywords": ["print"] } })
                .as_object()
                .unwrap()
                .clone(),
            ..Image::default()
        }
    }

    #[test]
    fn no_match_config_matches_everything() {
        let config = Config::from_value(json!({ "convert": [{}] }));
        assert!(image_matches(&config, "convert[0]", &image()).unwrap());
    }

    #[test]
    fn matches_regex_on_id() {
        let config = Config::from_value(json!({
            "convert": [{ "match": { "property": "id", "regex": "^dawn" } }],
        }));
        assert!(image_matches(&config, "convert[0]", &image()).unwrap());
    }

    #[test]
    fn rejects_non_matching_regex() {
        let config = Config::from_value(json!({
            "convert": [{ "match": { "property": "id", "regex": "^dusk" } }],
        }));
        assert!(!image_matches(&config, "convert[0]", &image()).unwrap());
    }

    #[test]
    fn matches_nested_property() {
        let config = Config::from_value(json!({
            "convert": [{ "match": { "property": "meta.keywords[0]", "regex": "^print$" } }],
        }));
        assert!(image_matches(&config, "convert[0]", &image()).unwrap());
    }

    #[test]
    fn missing_property_never_matches() {
        let config = Config::from_value(json!({
            "convert": [{ "match": { "property": "rating", "regex": ".*" } }],
        }));
        assert!(!image_matches(&config, "convert[0]", &image()).unwrap());
    }

    #[test]
    fn incomplete_match_config_errors() {
        let config = Config::from_value(json!({
            "convert": [{ "match": { "property": "id" } }],
        }));
        let result = image_matches(&config, "convert[0]", &image());
        assert!(matches!(result, Err(MatchError::Config(_))));
    }

    #[test]
    fn invalid_regex_errors() {
        let config = Config::from_value(json!({
            "convert": [{ "match": { "property": "id", "regex": "[unclosed" } }],
        }));
        let result = image_matches(&config, "convert[0]", &image());
        assert!(matches!(result, Err(MatchError::Regex(_))));
    }
}
