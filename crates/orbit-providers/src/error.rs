//! Error types for providers.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Provider error types.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No provider registered under this name.
    #[error("Unknown provider \"{name}\". Available: {available}")]
    UnknownProvider { name: String, available: String },

    /// A file belonging to the provider could not be read or written.
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The provider's own CLI could not be started.
    #[error("Failed to run `{command}`: {source}")]
    Command {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Live auth file is not valid JSON.
    #[error("Invalid auth file {path}: {source}")]
    AuthFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
