//! File snapshots of a provider's live auth file.
//!
//! Snapshots live at `<base>/auth/<provider>/<profile>.json`, owner-only.

use std::fs;
use std::path::{Path, PathBuf};

use orbit_core::fs::{atomic_write, ensure_private_dir, ensure_private_file};
use orbit_core::paths;
use tracing::debug;

use crate::error::{ProviderError, Result};

/// Swaps one live auth file with per-profile copies.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    live: PathBuf,
}

impl SnapshotStore {
    pub fn new(base: &Path, provider: &str, live: impl Into<PathBuf>) -> Self {
        Self {
            dir: paths::snapshot_dir(base, provider),
            live: live.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn live_path(&self) -> &Path {
        &self.live
    }

    pub fn path(&self, profile: &str) -> PathBuf {
        self.dir.join(format!("{profile}.json"))
    }

    pub fn exists(&self, profile: &str) -> bool {
        self.path(profile).is_file()
    }

    /// Copy the live file into `profile`'s snapshot. `false` if there is no
    /// live file.
    pub fn capture(&self, profile: &str) -> Result<bool> {
        if !self.live.is_file() {
            debug!(profile, live = %self.live.display(), "no live auth file to capture");
            return Ok(false);
        }
        let bytes = fs::read(&self.live).map_err(|e| ProviderError::io(&self.live, e))?;

        ensure_private_dir(&self.dir).map_err(|e| ProviderError::io(&self.dir, e))?;
        let target = self.path(profile);
        atomic_write(&target, &bytes).map_err(|e| ProviderError::io(&target, e))?;

        debug!(profile, "captured auth snapshot");
        Ok(true)
    }

    /// Copy `profile`'s snapshot over the live file. `false`, with the live
    /// file untouched, if the snapshot does not exist.
    pub fn restore(&self, profile: &str) -> Result<bool> {
        let source = self.path(profile);
        if !source.is_file() {
            debug!(profile, "no auth snapshot to restore");
            return Ok(false);
        }
        ensure_private_file(&source).map_err(|e| ProviderError::io(&source, e))?;
        let bytes = fs::read(&source).map_err(|e| ProviderError::io(&source, e))?;

        atomic_write(&self.live, &bytes).map_err(|e| ProviderError::io(&self.live, e))?;
        debug!(profile, "restored auth snapshot");
        Ok(true)
    }

    pub fn remove(&self, profile: &str) -> Result<()> {
        let target = self.path(profile);
        match fs::remove_file(&target) {
            Ok(()) => {
                debug!(profile, "removed auth snapshot");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ProviderError::io(&target, e)),
        }
    }
}
