//! Error types for Orbit core.

use std::path::PathBuf;
use thiserror::Error;

/// Core result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for Orbit core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("Failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Malformed user input, rejected before anything is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{kind} name cannot be empty")]
    Empty { kind: &'static str },

    #[error("{kind} name is too long (max {max} characters)")]
    TooLong { kind: &'static str, max: usize },

    #[error("{kind} name must be alphanumeric (hyphens and underscores allowed): {name:?}")]
    InvalidChars { kind: &'static str, name: String },
}

/// Registry (config store) errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No profiles found for provider \"{0}\"")]
    UnknownProvider(String),

    #[error("Profile \"{profile}\" does not exist for provider \"{provider}\"")]
    ProfileNotFound { provider: String, profile: String },

    #[error("Registry IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Registry serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
