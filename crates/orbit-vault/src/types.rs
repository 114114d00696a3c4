//! Vault data types.

use std::collections::BTreeMap;

use orbit_core::SecretString;
use serde::{Deserialize, Serialize};

/// One sealed token as stored on disk. All fields are lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEntry {
    /// 16-byte initialization vector.
    pub iv: String,
    /// 16-byte GCM authentication tag.
    pub tag: String,
    /// Ciphertext.
    pub data: String,
}

/// The whole vault file: composite key → sealed token.
pub type VaultFile = BTreeMap<String, EncryptedEntry>;

/// Composite vault key for a profile.
pub fn entry_key(provider: &str, profile: &str) -> String {
    format!("{provider}:{profile}")
}

/// Result of looking a token up.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup {
    Found(SecretString),
    Missing,
    /// An entry exists but does not decrypt under the active key.
    Undecryptable,
}

impl Lookup {
    /// Collapse to "available or not".
    pub fn into_option(self) -> Option<SecretString> {
        match self {
            Lookup::Found(token) => Some(token),
            Lookup::Missing | Lookup::Undecryptable => None,
        }
    }
}

/// Outcome of a successful key rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationReport {
    /// Number of entries re-encrypted under the new key.
    pub entries: usize,
}
