//! Error types for the credential vault.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The key file exists but is not exactly 64 hex characters. Fatal: the
    /// key is never silently replaced.
    #[error("Malformed encryption key file {path}: {reason}")]
    MalformedKey { path: PathBuf, reason: String },

    /// Entries exist but the key that sealed them is gone. A new key is
    /// never generated over existing entries.
    #[error("Encryption key file {path} is missing but the vault holds {entries} stored token(s)")]
    MissingKey { path: PathBuf, entries: usize },

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Rotation was abandoned; the original key and store are in place.
    #[error("Key rotation failed: {0}")]
    KeyRotation(String),

    #[error("Vault IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VaultError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Convenience result alias for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
