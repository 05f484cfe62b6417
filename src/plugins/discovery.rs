//! Project plugin discovery and dynamic loading.
//!
//! Projects can extend the pipeline with plugins compiled as shared
//! libraries. The plugin directory is scanned for library files (hidden
//! entries skipped; a subdirectory is searched one level deep, so a cargo
//! project can be symlinked or copied in whole), and each library is loaded
//! with `libloading` and asked for its [`Plugin`] through the
//! `photopipe_plugin` constructor symbol, normally produced with
//! [`export_plugin!`](crate::export_plugin):
//!
//! ```ignore
//! use photopipe::export_plugin;
//! use photopipe::plugins::engine::Plugin;
//!
//! fn build() -> Plugin {
//!     Plugin::named("watermark").image(|image, _, _, _, _, _| Ok(Some(image)))
//! }
//!
//! export_plugin!(build());
//! ```
//!
//! A load failure is fatal — a project that ships a broken plugin should not
//! silently generate without it. A missing plugin directory just means zero
//! project plugins.
//!
//! # Safety
//!
//! Loading a library executes arbitrary code, and the [`Plugin`] value
//! crosses the boundary as a raw pointer with no ABI guarantees beyond "built
//! by the same toolchain". Only load plugins you trust and build alongside
//! the binary.

use super::engine::Plugin;
use crate::config::{Config, ConfigError};
use libloading::Library;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot load module {0}; {1}")]
    Load(PathBuf, String),
}

/// Constructor symbol every project plugin library must export.
pub const PLUGIN_SYMBOL: &[u8] = b"photopipe_plugin";

/// Signature of the exported constructor.
pub type PluginConstructor = unsafe extern "C" fn() -> *mut Plugin;

/// Project plugins with the libraries that back them.
///
/// The libraries must outlive every hook call, so the pipeline facade keeps
/// this struct alive for the whole run.
#[derive(Default)]
pub struct ProjectPlugins {
    pub plugins: Vec<Plugin>,
    libraries: Vec<Library>,
}

impl ProjectPlugins {
    /// Number of loaded libraries (for logging).
    pub fn library_count(&self) -> usize {
        self.libraries.len()
    }
}

/// Load all project plugins from the configured plugin directory.
pub fn load_project_plugins(config: &Config) -> Result<ProjectPlugins, DiscoveryError> {
    let directory: PathBuf = config.get("plugin_directory")?;
    let candidates = match candidate_paths(&directory) {
        Ok(candidates) => candidates,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No plugin directory at {}", directory.display());
            return Ok(ProjectPlugins::default());
        }
        Err(e) => return Err(e.into()),
    };

    let mut loaded = ProjectPlugins::default();
    for path in candidates {
        let (plugin, library) = unsafe { load_library(&path) }
            .map_err(|message| DiscoveryError::Load(path.clone(), message))?;
        info!(
            "Loaded project plugin {} from {}",
            plugin.name,
            path.display()
        );
        loaded.plugins.push(plugin);
        loaded.libraries.push(library);
    }
    Ok(loaded)
}

/// Shared-library files in the plugin directory, one subdirectory level deep,
/// hidden entries skipped, sorted for deterministic install order.
pub(crate) fn candidate_paths(directory: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if is_hidden(&path) {
            continue;
        }
        if is_library(&path) {
            candidates.push(path);
        } else if path.is_dir() {
            for nested in std::fs::read_dir(&path)? {
                let nested = nested?.path();
                if !is_hidden(&nested) && is_library(&nested) {
                    candidates.push(nested);
                }
            }
        }
    }
    candidates.sort();
    Ok(candidates)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn is_library(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext == std::env::consts::DLL_EXTENSION)
}

/// Load one library and take ownership of its plugin.
///
/// # Safety
///
/// Runs library initialization code and trusts the exported constructor to
/// return a `Plugin` allocated with this crate's layout.
unsafe fn load_library(path: &Path) -> Result<(Plugin, Library), String> {
    unsafe {
        let library = Library::new(path).map_err(|e| e.to_string())?;
        let constructor: libloading::Symbol<PluginConstructor> =
            library.get(PLUGIN_SYMBOL).map_err(|e| e.to_string())?;
        let plugin = *Box::from_raw(constructor());
        Ok((plugin, library))
    }
}

/// Define the `photopipe_plugin` constructor a project plugin library needs.
#[macro_export]
macro_rules! export_plugin {
    ($plugin:expr) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn photopipe_plugin() -> *mut $crate::plugins::engine::Plugin {
            Box::into_raw(Box::new($plugin))
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn library_name(stem: &str) -> String {
        format!("{stem}.{}", std::env::consts::DLL_EXTENSION)
    }

    #[test]
    fn missing_plugin_directory_yields_no_plugins() {
        let tmp = TempDir::new().unwrap();
        let config = Config::from_value(json!({
            "plugin_directory": tmp.path().join("absent").to_str().unwrap(),
        }));

        let loaded = load_project_plugins(&config).unwrap();
        assert!(loaded.plugins.is_empty());
        assert_eq!(loaded.library_count(), 0);
    }

    #[test]
    fn candidates_are_library_files_only() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(library_name("watermark")), b"").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), b"").unwrap();
        std::fs::write(tmp.path().join(library_name(".hidden")), b"").unwrap();

        let candidates = candidate_paths(tmp.path()).unwrap();
        assert_eq!(candidates, vec![tmp.path().join(library_name("watermark"))]);
    }

    #[test]
    fn candidates_include_one_subdirectory_level() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("exif-extras");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join(library_name("exif_extras")), b"").unwrap();
        let deep = nested.join("deps");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(deep.join(library_name("too_deep")), b"").unwrap();

        let candidates = candidate_paths(tmp.path()).unwrap();
        assert_eq!(candidates, vec![nested.join(library_name("exif_extras"))]);
    }

    #[test]
    fn hidden_directories_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let hidden = tmp.path().join(".git");
        std::fs::create_dir_all(&hidden).unwrap();
        std::fs::write(hidden.join(library_name("sneaky")), b"").unwrap();

        assert!(candidate_paths(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn unloadable_library_is_fatal() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(library_name("broken")), b"not a library").unwrap();
        let config = Config::from_value(json!({
            "plugin_directory": tmp.path().to_str().unwrap(),
        }));

        let result = load_project_plugins(&config);
        assert!(matches!(result, Err(DiscoveryError::Load(_, _))));
    }

    #[test]
    fn candidates_are_sorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(library_name("zeta")), b"").unwrap();
        std::fs::write(tmp.path().join(library_name("alpha")), b"").unwrap();

        let candidates = candidate_paths(tmp.path()).unwrap();
        assert_eq!(
            candidates,
            vec![
                tmp.path().join(library_name("alpha")),
                tmp.path().join(library_name("zeta")),
            ]
        );
    }
}
