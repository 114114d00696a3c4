//! Registry persistence.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::schema::{ProfileMetadata, Registry};
use crate::error::{Error, RegistryError};
use crate::fs::{atomic_write, ensure_private_dir, ensure_private_file, quarantine};
use crate::paths;

/// File-backed registry.
///
/// Every mutating call loads, modifies, and saves in one step; callers never
/// observe a half-applied change.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<base>/config.json`.
    pub fn in_dir(base: &Path) -> Self {
        Self::new(paths::registry_file(base))
    }

    /// Store under the default base directory.
    pub fn from_default_dir() -> Result<Self, Error> {
        Ok(Self::in_dir(&paths::base_dir()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> RegistryError {
        RegistryError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Load the registry.
    ///
    /// A missing file is created empty. A file that cannot be parsed is
    /// quarantined and replaced by an empty registry. A file that parses but
    /// breaks invariants is repaired and rewritten.
    pub fn load(&self) -> Result<Registry, RegistryError> {
        if let Some(parent) = self.path.parent() {
            ensure_private_dir(parent).map_err(|e| self.io_err(e))?;
        }

        if !self.path.exists() {
            debug!(path = %self.path.display(), "creating empty registry");
            let registry = Registry::new();
            self.save(&registry)?;
            return Ok(registry);
        }

        ensure_private_file(&self.path).map_err(|e| self.io_err(e))?;
        let raw = fs::read(&self.path).map_err(|e| self.io_err(e))?;

        let mut registry = match serde_json::from_slice::<Registry>(&raw) {
            Ok(registry) => registry,
            Err(parse_error) => return self.recover_corrupt(&parse_error),
        };

        let repairs = registry.normalize();
        if !repairs.is_empty() {
            for repair in &repairs {
                warn!(path = %self.path.display(), "registry repaired: {repair}");
            }
            self.save(&registry)?;
        }

        Ok(registry)
    }

    fn recover_corrupt(&self, parse_error: &serde_json::Error) -> Result<Registry, RegistryError> {
        match quarantine(&self.path) {
            Ok(moved) => warn!(
                path = %self.path.display(),
                quarantined = %moved.display(),
                "registry file is corrupt ({parse_error}); starting with an empty registry"
            ),
            Err(e) => warn!(
                path = %self.path.display(),
                "registry file is corrupt ({parse_error}) and could not be quarantined: {e}"
            ),
        }

        let registry = Registry::new();
        self.save(&registry)?;
        Ok(registry)
    }

    /// Persist the registry atomically, owner-only.
    pub fn save(&self, registry: &Registry) -> Result<(), RegistryError> {
        let mut content = serde_json::to_vec_pretty(registry)?;
        content.push(b'\n');
        atomic_write(&self.path, &content).map_err(|e| self.io_err(e))
    }

    /// Add a profile; supplied metadata replaces any existing metadata.
    pub fn add_profile(
        &self,
        provider: &str,
        profile: &str,
        metadata: Option<ProfileMetadata>,
    ) -> Result<(), RegistryError> {
        let mut registry = self.load()?;
        registry.add_profile(provider, profile, metadata);
        self.save(&registry)
    }

    /// Remove a profile, its metadata, and a `current` pointer to it.
    /// Returns whether anything was removed.
    pub fn remove_profile(&self, provider: &str, profile: &str) -> Result<bool, RegistryError> {
        let mut registry = self.load()?;
        if !registry.remove_profile(provider, profile) {
            return Ok(false);
        }
        self.save(&registry)?;
        Ok(true)
    }

    /// Mark `profile` active. Nothing is written when it is not a member.
    pub fn set_current(&self, provider: &str, profile: &str) -> Result<(), RegistryError> {
        let mut registry = self.load()?;
        registry.set_current(provider, profile)?;
        self.save(&registry)
    }

    pub fn get_current(&self, provider: &str) -> Result<Option<String>, RegistryError> {
        Ok(self.load()?.current(provider).map(str::to_string))
    }

    pub fn exists(&self, provider: &str, profile: &str) -> Result<bool, RegistryError> {
        Ok(self.load()?.contains(provider, profile))
    }
}
