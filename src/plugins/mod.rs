//! The plugin pipeline: engine, built-ins, discovery, and the facade the
//! rest of the application drives.
//!
//! [`Pipeline::init`] installs the built-in plugins (convert, copy, render)
//! and then the project's own plugins — built-ins first, so a project plugin
//! name collision is caught at startup rather than shadowing silently.
//! [`Pipeline::call_plugins`] resolves the configured `plugins` name list and
//! folds the content tree through it.

pub mod convert;
pub mod copy;
pub mod discovery;
pub mod engine;
pub mod matcher;
pub mod render;
pub mod writer;

use crate::config::{Config, ConfigError};
use crate::content::Site;
use discovery::DiscoveryError;
use engine::{PluginError, Registry};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// The initialized plugin pipeline for one generator run.
pub struct Pipeline {
    registry: Registry,
    config: Arc<Config>,
    // Keeps project plugin libraries loaded for as long as their hooks can run
    _project: discovery::ProjectPlugins,
}

impl Pipeline {
    /// Install built-in and project plugins against the given configuration.
    pub fn init(config: Arc<Config>) -> Result<Self, PipelineError> {
        let mut registry = Registry::new();

        debug!("Loading built-in plugins");
        for plugin in [convert::plugin(), copy::plugin(), render::plugin()] {
            registry.install(plugin)?;
        }

        debug!("Loading project plugins");
        let mut project = discovery::load_project_plugins(&config)?;
        for plugin in project.plugins.drain(..) {
            registry.install(plugin)?;
        }

        Ok(Self {
            registry,
            config,
            _project: project,
        })
    }

    /// Run the configured plugin sequence over a loaded content tree.
    ///
    /// The `plugins` configuration key names the sequence; every name must
    /// resolve before anything executes.
    pub fn call_plugins(&self, content: Site) -> Result<Site, PipelineError> {
        let names: Vec<String> = self.config.get("plugins")?;
        let sequence = self.registry.sequence(&names)?;
        Ok(sequence.call(content, &self.config)?)
    }

    /// The underlying registry, for embedders that install their own plugins.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }
}
