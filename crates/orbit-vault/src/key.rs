//! Vault key material and its on-disk file.
//!
//! The key file holds exactly 64 hex characters (32 bytes), optionally
//! followed by a line ending. Anything else is a fatal configuration error:
//! the file is never regenerated over a malformed one, since that would make
//! every stored token unrecoverable.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use orbit_core::fs::{atomic_write, ensure_private_file};
use rand::RngCore;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{Result, VaultError};

pub const KEY_SIZE: usize = 32;
const KEY_HEX_LEN: usize = KEY_SIZE * 2;

/// A 256-bit vault key, zeroed on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey([u8; KEY_SIZE]);

impl VaultKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut key);
        Self(key)
    }

    /// Parse the key file format.
    pub fn from_hex(text: &str) -> std::result::Result<Self, String> {
        let text = text.strip_suffix('\n').unwrap_or(text);
        let text = text.strip_suffix('\r').unwrap_or(text);

        if text.len() != KEY_HEX_LEN {
            return Err(format!(
                "expected {KEY_HEX_LEN} hex characters, found {}",
                text.len()
            ));
        }
        if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err("key contains non-hex characters".to_string());
        }

        let mut key = [0u8; KEY_SIZE];
        hex::decode_to_slice(text, &mut key).map_err(|e| e.to_string())?;
        Ok(Self(key))
    }

    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultKey([REDACTED])")
    }
}

/// The key file plus the backup slot used during rotation.
#[derive(Debug, Clone)]
pub struct KeyFile {
    path: PathBuf,
    backup_path: PathBuf,
}

impl KeyFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut backup = path.clone().into_os_string();
        backup.push(".bak");
        Self {
            path,
            backup_path: PathBuf::from(backup),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    pub fn has_backup(&self) -> bool {
        self.backup_path.exists()
    }

    /// Read and validate the key. `None` when no key file exists yet.
    pub fn load(&self) -> Result<Option<VaultKey>> {
        read_key(&self.path)
    }

    /// Read the key, generating and persisting one on first use.
    pub fn load_or_create(&self) -> Result<VaultKey> {
        if let Some(key) = self.load()? {
            return Ok(key);
        }
        debug!(path = %self.path.display(), "generating vault key");
        let key = VaultKey::generate();
        self.write(&key)?;
        Ok(key)
    }

    /// Atomically replace the key file.
    pub fn write(&self, key: &VaultKey) -> Result<()> {
        atomic_write(&self.path, key.to_hex().as_bytes()).map_err(|e| VaultError::io(&self.path, e))
    }

    /// Copy the current key file into the backup slot.
    pub fn backup(&self) -> Result<()> {
        let bytes = Zeroizing::new(fs::read(&self.path).map_err(|e| VaultError::io(&self.path, e))?);
        atomic_write(&self.backup_path, &bytes).map_err(|e| VaultError::io(&self.backup_path, e))
    }

    /// Read the backup key, if a backup exists.
    pub fn load_backup(&self) -> Result<Option<VaultKey>> {
        read_key(&self.backup_path)
    }

    /// Move the backup back over the key file.
    pub fn restore_backup(&self) -> Result<()> {
        fs::rename(&self.backup_path, &self.path).map_err(|e| VaultError::io(&self.path, e))
    }

    pub fn discard_backup(&self) -> Result<()> {
        if self.backup_path.exists() {
            fs::remove_file(&self.backup_path).map_err(|e| VaultError::io(&self.backup_path, e))?;
        }
        Ok(())
    }

    /// Remove the key file entirely (used when a first-ever key write must
    /// be undone).
    pub(crate) fn remove(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| VaultError::io(&self.path, e))?;
        }
        Ok(())
    }
}

fn read_key(path: &Path) -> Result<Option<VaultKey>> {
    if !path.exists() {
        return Ok(None);
    }
    ensure_private_file(path).map_err(|e| VaultError::io(path, e))?;

    let text = Zeroizing::new(fs::read_to_string(path).map_err(|e| VaultError::io(path, e))?);
    VaultKey::from_hex(&text)
        .map(Some)
        .map_err(|reason| VaultError::MalformedKey {
            path: path.to_path_buf(),
            reason,
        })
}
