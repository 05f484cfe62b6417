//! The plugin execution engine.
//!
//! A [`Plugin`] is a named unit of work declaring up to three hooks — site,
//! album, image — of which at least one must be present. The [`Registry`]
//! owns installed plugins; [`Registry::sequence`] resolves a configured name
//! list into a [`PluginSequence`] that folds the content tree through each
//! plugin in order.
//!
//! # Execution contract
//!
//! For one plugin, hooks run in the fixed order site → album → image. Every
//! hook receives the value it transforms **by value** (an owned deep copy)
//! and its surrounding context **by shared reference**, so no hook can ever
//! observe or leak an in-place mutation of engine state — ownership gives the
//! isolation that dynamic-language pipelines need defensive deep copies for.
//! A hook returns `Ok(Some(v))` to replace the original or `Ok(None)` to
//! keep it.
//!
//! Album and image hooks are dispatched across items with rayon; results are
//! collected back in positional order, so item `i` of the output always
//! corresponds to item `i` of the input regardless of completion order.
//! Plugins themselves run strictly one after another — each may depend on
//! the cumulative effect of its predecessors.
//!
//! Any hook failure aborts the run: the error is wrapped with the plugin's
//! name and the sequence short-circuits. Mutations already applied to the
//! content stand; there is no rollback.

use crate::config::Config;
use crate::content::{Album, Image, Site};
use crate::timer::{self, Timer};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin does not define a name")]
    MissingName,
    #[error("Plugin {0} does not define a site, album or image hook")]
    MissingHooks(String),
    #[error("Plugin {0} already registered")]
    AlreadyRegistered(String),
    #[error("Plugin {0} could not be found")]
    NotFound(String),
    #[error("Plugin {0} threw an error; {1}")]
    HookFailed(String, String),
}

/// Error type hooks may fail with; the engine wraps it with the plugin name.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Hook outcome: `Some(v)` replaces the original value, `None` keeps it.
pub type HookResult<T> = Result<Option<T>, HookError>;

pub type SiteHook = Box<dyn Fn(Site, &Config) -> HookResult<Site> + Send + Sync>;
pub type AlbumHook =
    Box<dyn Fn(Album, usize, usize, &Site, &Config) -> HookResult<Album> + Send + Sync>;
pub type ImageHook =
    Box<dyn Fn(Image, usize, usize, &Album, &Site, &Config) -> HookResult<Image> + Send + Sync>;

/// A named plugin: a capability record of up to three optional hooks.
pub struct Plugin {
    pub name: String,
    pub site: Option<SiteHook>,
    pub album: Option<AlbumHook>,
    pub image: Option<ImageHook>,
}

impl Plugin {
    /// Start a plugin definition with no hooks; attach them with
    /// [`site`](Plugin::site), [`album`](Plugin::album),
    /// [`image`](Plugin::image).
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            site: None,
            album: None,
            image: None,
        }
    }

    /// Attach the site-level hook.
    pub fn site(
        mut self,
        hook: impl Fn(Site, &Config) -> HookResult<Site> + Send + Sync + 'static,
    ) -> Self {
        self.site = Some(Box::new(hook));
        self
    }

    /// Attach the album-level hook.
    pub fn album(
        mut self,
        hook: impl Fn(Album, usize, usize, &Site, &Config) -> HookResult<Album>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.album = Some(Box::new(hook));
        self
    }

    /// Attach the image-level hook.
    pub fn image(
        mut self,
        hook: impl Fn(Image, usize, usize, &Album, &Site, &Config) -> HookResult<Image>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.image = Some(Box::new(hook));
        self
    }

    fn has_hooks(&self) -> bool {
        self.site.is_some() || self.album.is_some() || self.image.is_some()
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("site", &self.site.is_some())
            .field("album", &self.album.is_some())
            .field("image", &self.image.is_some())
            .finish()
    }
}

// ============================================================================
// Stage runner
// ============================================================================

/// One installed plugin, wrapped with its per-invocation behavior: staging,
/// timing, and error translation.
#[derive(Debug)]
struct StageRunner {
    plugin: Plugin,
}

impl StageRunner {
    /// Apply the plugin's hooks to `content`, site stage first.
    fn run(&self, mut content: Site, config: &Config) -> Result<Site, PluginError> {
        let name = &self.plugin.name;
        info!("Calling plugin {name}");
        let mut time = Timer::new();
        time.stamp("start");

        if let Some(hook) = &self.plugin.site {
            if let Some(replacement) = hook(content.clone(), config).map_err(|e| self.wrap(e))? {
                content = replacement;
            }
        }

        if let Some(hook) = &self.plugin.album {
            let count = content.albums.len();
            let albums = content
                .albums
                .par_iter()
                .enumerate()
                .map(|(index, album)| {
                    match hook(album.clone(), index, count, &content, config) {
                        Ok(Some(replacement)) => Ok(replacement),
                        Ok(None) => Ok(album.clone()),
                        Err(e) => Err(self.wrap(e)),
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            content.albums = albums;
        }

        if let Some(hook) = &self.plugin.image {
            let albums = content
                .albums
                .par_iter()
                .map(|album| {
                    let count = album.images.len();
                    let images = album
                        .images
                        .par_iter()
                        .enumerate()
                        .map(|(index, image)| {
                            match hook(image.clone(), index, count, album, &content, config) {
                                Ok(Some(replacement)) => Ok(replacement),
                                Ok(None) => Ok(image.clone()),
                                Err(e) => Err(self.wrap(e)),
                            }
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Album {
                        images,
                        ..album.clone()
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            content.albums = albums;
        }

        info!(
            "Plugin {name} finished in {}",
            timer::pretty(time.since("start"))
        );
        Ok(content)
    }

    fn wrap(&self, error: HookError) -> PluginError {
        PluginError::HookFailed(self.plugin.name.clone(), error.to_string())
    }
}

// ============================================================================
// Registry and sequencing
// ============================================================================

/// Owns installed plugins by unique name.
///
/// Mutated only during initialization; read-only once the pipeline runs.
#[derive(Default)]
pub struct Registry {
    installed: BTreeMap<String, Arc<StageRunner>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a plugin.
    ///
    /// Fails if the plugin has no name, defines no hook, or its name is
    /// already taken.
    pub fn install(&mut self, plugin: Plugin) -> Result<(), PluginError> {
        if plugin.name.is_empty() {
            return Err(PluginError::MissingName);
        }
        debug!("Installing plugin {}", plugin.name);
        if !plugin.has_hooks() {
            return Err(PluginError::MissingHooks(plugin.name));
        }
        if self.installed.contains_key(&plugin.name) {
            return Err(PluginError::AlreadyRegistered(plugin.name));
        }
        self.installed
            .insert(plugin.name.clone(), Arc::new(StageRunner { plugin }));
        Ok(())
    }

    /// Resolve a name list into a runnable sequence.
    ///
    /// Resolution is eager: an unknown name fails here, before any plugin
    /// executes, so a misconfigured run never partially applies.
    pub fn sequence(&self, names: &[String]) -> Result<PluginSequence, PluginError> {
        let runners = names
            .iter()
            .map(|name| {
                self.installed
                    .get(name)
                    .cloned()
                    .ok_or_else(|| PluginError::NotFound(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PluginSequence { runners })
    }

    /// Names of all installed plugins, sorted.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.installed.keys().map(String::as_str).collect()
    }

    /// Remove every installed plugin.
    ///
    /// Exists for test harnesses that reuse a registry between cases; never
    /// called in production control flow.
    pub fn clear(&mut self) {
        self.installed.clear();
    }
}

/// An ordered chain of resolved plugins for one pipeline run.
#[derive(Debug)]
pub struct PluginSequence {
    runners: Vec<Arc<StageRunner>>,
}

impl PluginSequence {
    /// Fold the content through every plugin, left to right.
    ///
    /// Strictly sequential: each plugin completes before the next starts,
    /// and the first failure aborts the rest of the chain.
    pub fn call(&self, content: Site, config: &Config) -> Result<Site, PluginError> {
        self.runners
            .iter()
            .try_fold(content, |content, runner| runner.run(content, config))
    }
}
