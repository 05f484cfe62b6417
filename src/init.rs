//! Project scaffolding for `photopipe init`.
//!
//! Creates the standard directory layout and a documented `photopipe.toml`
//! in an empty directory.

use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum InitError {
    #[error("Could not read current working directory; {0}")]
    Unreadable(std::io::Error),
    #[error("Current working directory is not empty")]
    NotEmpty,
    #[error("Could not create directory ./{0}; {1}")]
    CreateDir(String, std::io::Error),
    #[error("Could not create photopipe.toml; {0}")]
    CreateConfig(std::io::Error),
}

const STOCK_CONFIG: &str = "\
# Photopipe project configuration.

content_directory = \"./content\"
plugin_directory = \"./plugins\"
target_directory = \"./target\"

# Ordered list of plugins to run on every generate.
# Built-ins: \"convert\", \"copy\", \"render\".
plugins = []
";

/// Scaffold a new project in `directory`, which must be empty.
pub fn init(directory: &Path) -> Result<(), InitError> {
    let entries = std::fs::read_dir(directory).map_err(InitError::Unreadable)?;
    if entries.count() > 0 {
        return Err(InitError::NotEmpty);
    }

    for name in ["content", "plugins", "target"] {
        info!("Creating directory {name}");
        std::fs::create_dir(directory.join(name))
            .map_err(|e| InitError::CreateDir(name.to_string(), e))?;
    }

    info!("Creating file photopipe.toml");
    std::fs::write(directory.join("photopipe.toml"), STOCK_CONFIG)
        .map_err(InitError::CreateConfig)?;

    info!("You're good to go");
    Ok(())
}
