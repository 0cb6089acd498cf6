//! Error type shared by the config loader, resolver, and linter.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// No entry points were passed and none could be discovered from config.
    #[error("No APIs were provided or defined in the config.")]
    NoEntryPoints,

    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Failed to read {reference}: {source}")]
    Read {
        reference: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {reference}: {message}")]
    Parse { reference: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
