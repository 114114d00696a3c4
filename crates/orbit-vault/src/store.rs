//! The credential vault.
//!
//! Invariant: every entry in the store decrypts under the key in the key
//! file. [`Vault::rotate_key`] keeps it across rotation by backing up the
//! key before touching anything and restoring it if any write fails.

use std::fs;
use std::path::{Path, PathBuf};

use orbit_core::fs::{atomic_write, ensure_private_dir, ensure_private_file, quarantine};
use orbit_core::{paths, SecretString};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::crypto;
use crate::error::{Result, VaultError};
use crate::key::{KeyFile, VaultKey};
use crate::types::{entry_key, Lookup, RotationReport, VaultFile};

/// File-backed encrypted token store.
#[derive(Debug)]
pub struct Vault {
    store_path: PathBuf,
    key: KeyFile,
    #[cfg(test)]
    fail_store_write: std::sync::atomic::AtomicBool,
}

impl Vault {
    /// Vault using `store_path` for entries and `key_path` for the key.
    pub fn new(store_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            key: KeyFile::new(key_path),
            #[cfg(test)]
            fail_store_write: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Vault at `<base>/credentials.json` with key `<base>/.key`.
    pub fn in_dir(base: &Path) -> Self {
        Self::new(paths::vault_file(base), paths::key_file(base))
    }

    /// Vault under the default base directory.
    pub fn from_default_dir() -> std::result::Result<Self, orbit_core::Error> {
        Ok(Self::in_dir(&paths::base_dir()?))
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn key_path(&self) -> &Path {
        self.key.path()
    }

    /// Encrypt and store `token`, replacing any previous entry.
    pub fn store(&self, provider: &str, profile: &str, token: &str) -> Result<()> {
        let mut entries = self.prepare()?;
        let key = match self.key.load()? {
            Some(key) => key,
            None if !entries.is_empty() => {
                return Err(VaultError::MissingKey {
                    path: self.key.path().to_path_buf(),
                    entries: entries.len(),
                })
            }
            None => self.key.load_or_create()?,
        };

        let name = entry_key(provider, profile);
        entries.insert(name.clone(), crypto::seal(&key, token.as_bytes())?);
        self.save_entries(&entries)?;

        debug!(entry = %name, "stored token");
        Ok(())
    }

    /// Look a token up, distinguishing "never stored" from "cannot decrypt".
    pub fn lookup(&self, provider: &str, profile: &str) -> Result<Lookup> {
        let entries = self.prepare()?;
        let name = entry_key(provider, profile);

        let Some(entry) = entries.get(&name) else {
            return Ok(Lookup::Missing);
        };
        let Some(key) = self.key.load()? else {
            warn!(entry = %name, "vault entry exists but no key file is present");
            return Ok(Lookup::Undecryptable);
        };

        match crypto::open(&key, entry) {
            Ok(plaintext) => match String::from_utf8(plaintext) {
                Ok(token) => Ok(Lookup::Found(SecretString::new(token))),
                Err(_) => {
                    warn!(entry = %name, "vault entry decrypted to invalid UTF-8");
                    Ok(Lookup::Undecryptable)
                }
            },
            Err(e) => {
                warn!(entry = %name, "vault entry could not be decrypted: {e}");
                Ok(Lookup::Undecryptable)
            }
        }
    }

    /// Fetch a token. Undecryptable entries are reported as absent (and
    /// logged); use [`Vault::lookup`] to tell the cases apart.
    pub fn get(&self, provider: &str, profile: &str) -> Result<Option<SecretString>> {
        Ok(self.lookup(provider, profile)?.into_option())
    }

    /// Remove a token. Returns whether an entry was removed.
    pub fn delete(&self, provider: &str, profile: &str) -> Result<bool> {
        let mut entries = self.prepare()?;
        let name = entry_key(provider, profile);

        if entries.remove(&name).is_none() {
            return Ok(false);
        }
        self.save_entries(&entries)?;
        debug!(entry = %name, "deleted token");
        Ok(true)
    }

    /// Composite keys of all stored entries.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.prepare()?.into_keys().collect())
    }

    /// Replace the key and re-encrypt every entry under it.
    ///
    /// All entries are decrypted before anything is written; a single
    /// undecryptable entry aborts with nothing changed. The old key is
    /// backed up first and restored if writing the new key or the new store
    /// fails, so the store on disk always matches the key on disk.
    pub fn rotate_key(&self) -> Result<RotationReport> {
        let entries = self.prepare()?;
        let current = self.key.load()?;

        let mut plaintexts = Vec::with_capacity(entries.len());
        if !entries.is_empty() {
            let key = current.as_ref().ok_or_else(|| {
                VaultError::KeyRotation("vault has entries but no key file".to_string())
            })?;
            for (name, entry) in &entries {
                let plaintext = crypto::open(key, entry).map_err(|e| {
                    VaultError::KeyRotation(format!("entry {name} cannot be decrypted: {e}"))
                })?;
                plaintexts.push((name.clone(), Zeroizing::new(plaintext)));
            }
        }

        let new_key = VaultKey::generate();
        let mut rotated = VaultFile::new();
        for (name, plaintext) in &plaintexts {
            rotated.insert(name.clone(), crypto::seal(&new_key, plaintext)?);
        }

        if current.is_some() {
            self.key
                .backup()
                .map_err(|e| VaultError::KeyRotation(format!("could not back up key: {e}")))?;
        }

        let written = self
            .key
            .write(&new_key)
            .and_then(|()| self.save_entries(&rotated));

        if let Err(e) = written {
            let rollback = if current.is_some() {
                self.key.restore_backup()
            } else {
                self.key.remove()
            };
            return Err(match rollback {
                Ok(()) => VaultError::KeyRotation(format!("{e}; original key restored")),
                Err(rollback_err) => VaultError::KeyRotation(format!(
                    "{e}; restoring the original key also failed: {rollback_err} (backup kept at {})",
                    self.key.backup_path().display()
                )),
            });
        }

        if let Err(e) = self.key.discard_backup() {
            warn!("key rotated but the backup could not be removed: {e}");
        }
        info!(entries = rotated.len(), "vault key rotated");
        Ok(RotationReport {
            entries: rotated.len(),
        })
    }

    /// Load entries, fixing permissions and finishing any interrupted
    /// rotation first.
    fn prepare(&self) -> Result<VaultFile> {
        for dir in [self.store_path.parent(), self.key.path().parent()].into_iter().flatten() {
            if !dir.as_os_str().is_empty() {
                ensure_private_dir(dir).map_err(|e| VaultError::io(dir, e))?;
            }
        }
        let entries = self.load_entries()?;
        if self.key.has_backup() {
            self.recover_interrupted_rotation(&entries)?;
        }
        Ok(entries)
    }

    fn load_entries(&self) -> Result<VaultFile> {
        if !self.store_path.exists() {
            return Ok(VaultFile::new());
        }
        ensure_private_file(&self.store_path).map_err(|e| VaultError::io(&self.store_path, e))?;

        let raw = fs::read(&self.store_path).map_err(|e| VaultError::io(&self.store_path, e))?;
        match serde_json::from_slice(&raw) {
            Ok(entries) => Ok(entries),
            Err(parse_error) => {
                let moved = quarantine(&self.store_path)
                    .map_err(|e| VaultError::io(&self.store_path, e))?;
                warn!(
                    path = %self.store_path.display(),
                    quarantined = %moved.display(),
                    "credential store is corrupt ({parse_error}); starting empty"
                );
                Ok(VaultFile::new())
            }
        }
    }

    fn save_entries(&self, entries: &VaultFile) -> Result<()> {
        #[cfg(test)]
        if self
            .fail_store_write
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(VaultError::io(
                &self.store_path,
                std::io::Error::new(std::io::ErrorKind::Other, "injected write failure"),
            ));
        }

        let mut content = serde_json::to_vec_pretty(entries)?;
        content.push(b'\n');
        atomic_write(&self.store_path, &content).map_err(|e| VaultError::io(&self.store_path, e))
    }

    /// A leftover backup means a rotation was cut short between its key
    /// write and its store write (or before cleanup). Keep whichever key
    /// opens every entry.
    fn recover_interrupted_rotation(&self, entries: &VaultFile) -> Result<()> {
        let opens_all = |key: &VaultKey| entries.values().all(|e| crypto::open(key, e).is_ok());

        let current = self.key.load()?;
        if entries.is_empty() || current.as_ref().is_some_and(opens_all) {
            debug!("removing stale key backup");
            return self.key.discard_backup();
        }

        match self.key.load_backup()? {
            Some(backup) if opens_all(&backup) => {
                warn!("recovering from an interrupted key rotation; restoring the previous key");
                self.key.restore_backup()
            }
            _ => {
                warn!(
                    backup = %self.key.backup_path().display(),
                    "key backup present but neither key opens every entry; leaving both in place"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    const TOKEN: &str = "token_abcdefghijklmnopqrstuvwxyz";

    fn test_vault() -> (Vault, TempDir) {
        let tmp = TempDir::new().unwrap();
        let vault = Vault::in_dir(&tmp.path().join("orbit"));
        (vault, tmp)
    }

    #[test]
    fn test_store_get_delete_scenario() {
        let (vault, _tmp) = test_vault();
        vault.store("vercel", "a", TOKEN).unwrap();

        assert_eq!(vault.get("vercel", "a").unwrap().unwrap().expose_secret(), TOKEN);
        assert!(vault.delete("vercel", "a").unwrap());
        assert!(!vault.delete("vercel", "a").unwrap());
        assert!(vault.get("vercel", "a").unwrap().is_none());
    }

    #[test]
    fn test_round_trip_many() {
        let (vault, _tmp) = test_vault();
        let cases = [
            ("vercel", "personal", "tok_personal_0123456789abcdef"),
            ("vercel", "work", "tok-with-symbols_+/=.~"),
            ("netlify", "x", "ünïcødé-token-ok"),
        ];
        for (provider, profile, token) in cases {
            vault.store(provider, profile, token).unwrap();
        }
        for (provider, profile, token) in cases {
            assert_eq!(vault.get(provider, profile).unwrap().unwrap().expose_secret(), token);
        }
        assert_eq!(vault.keys().unwrap(), vec!["netlify:x", "vercel:personal", "vercel:work"]);
    }

    #[test]
    fn test_store_overwrites() {
        let (vault, _tmp) = test_vault();
        vault.store("vercel", "a", "old_token_value_1234567890").unwrap();
        vault.store("vercel", "a", "new_token_value_1234567890").unwrap();
        assert_eq!(
            vault.get("vercel", "a").unwrap().unwrap().expose_secret(),
            "new_token_value_1234567890"
        );
    }

    #[test]
    fn test_on_disk_shape() {
        let (vault, _tmp) = test_vault();
        vault.store("vercel", "a", TOKEN).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(vault.store_path()).unwrap()).unwrap();
        let entry = &raw["vercel:a"];
        assert_eq!(entry["iv"].as_str().unwrap().len(), 32);
        assert_eq!(entry["tag"].as_str().unwrap().len(), 32);
        assert!(!entry["data"].as_str().unwrap().contains(TOKEN));
        assert_eq!(fs::read_to_string(vault.key_path()).unwrap().len(), 64);
    }

    #[test]
    fn test_tampered_entry_reads_as_absent() {
        let (vault, _tmp) = test_vault();
        vault.store("vercel", "a", TOKEN).unwrap();

        let mut entries: VaultFile =
            serde_json::from_slice(&fs::read(vault.store_path()).unwrap()).unwrap();
        let entry = entries.get_mut("vercel:a").unwrap();
        entry.tag = "00".repeat(16);
        fs::write(vault.store_path(), serde_json::to_vec(&entries).unwrap()).unwrap();

        assert_eq!(vault.lookup("vercel", "a").unwrap(), Lookup::Undecryptable);
        assert!(vault.get("vercel", "a").unwrap().is_none());
        assert_eq!(vault.lookup("vercel", "b").unwrap(), Lookup::Missing);
    }

    #[test]
    fn test_malformed_key_is_fatal() {
        let (vault, _tmp) = test_vault();
        vault.store("vercel", "a", TOKEN).unwrap();
        fs::write(vault.key_path(), b"deadbeef").unwrap();

        assert!(matches!(vault.get("vercel", "a"), Err(VaultError::MalformedKey { .. })));
        assert!(matches!(
            vault.store("vercel", "b", TOKEN),
            Err(VaultError::MalformedKey { .. })
        ));
        assert_eq!(fs::read(vault.key_path()).unwrap(), b"deadbeef");
    }

    #[test]
    fn test_store_refuses_new_key_over_existing_entries() {
        let (vault, _tmp) = test_vault();
        vault.store("vercel", "a", TOKEN).unwrap();
        let store_before = fs::read(vault.store_path()).unwrap();
        fs::remove_file(vault.key_path()).unwrap();

        let err = vault.store("vercel", "b", TOKEN).unwrap_err();

        assert!(matches!(err, VaultError::MissingKey { entries: 1, .. }));
        assert!(!vault.key_path().exists());
        assert_eq!(fs::read(vault.store_path()).unwrap(), store_before);
    }

    #[test]
    fn test_store_creates_key_once_vault_is_empty_again() {
        let (vault, _tmp) = test_vault();
        vault.store("vercel", "a", TOKEN).unwrap();
        vault.delete("vercel", "a").unwrap();
        fs::remove_file(vault.key_path()).unwrap();

        vault.store("vercel", "b", TOKEN).unwrap();

        assert!(vault.key_path().exists());
        assert_eq!(vault.get("vercel", "b").unwrap().unwrap().expose_secret(), TOKEN);
    }

    #[test]
    fn test_rotation_preserves_plaintext_and_changes_key() {
        let (vault, _tmp) = test_vault();
        vault.store("vercel", "team", "token_team_abcdefghijklmnopqrstuvwxyz").unwrap();
        vault.store("vercel", "solo", "token_solo_abcdefghijklmnopqrstuvwxyz").unwrap();
        let key_before = fs::read(vault.key_path()).unwrap();

        let report = vault.rotate_key().unwrap();

        assert_eq!(report.entries, 2);
        assert_ne!(fs::read(vault.key_path()).unwrap(), key_before);
        assert_eq!(
            vault.get("vercel", "team").unwrap().unwrap().expose_secret(),
            "token_team_abcdefghijklmnopqrstuvwxyz"
        );
        assert_eq!(
            vault.get("vercel", "solo").unwrap().unwrap().expose_secret(),
            "token_solo_abcdefghijklmnopqrstuvwxyz"
        );
        assert!(!vault.key.has_backup());
    }

    #[test]
    fn test_rotation_write_failure_leaves_everything_unchanged() {
        let (vault, _tmp) = test_vault();
        vault.store("vercel", "a", TOKEN).unwrap();
        let key_before = fs::read(vault.key_path()).unwrap();
        let store_before = fs::read(vault.store_path()).unwrap();

        vault.fail_store_write.store(true, Ordering::SeqCst);
        let err = vault.rotate_key().unwrap_err();
        vault.fail_store_write.store(false, Ordering::SeqCst);

        assert!(matches!(err, VaultError::KeyRotation(_)));
        assert_eq!(fs::read(vault.key_path()).unwrap(), key_before);
        assert_eq!(fs::read(vault.store_path()).unwrap(), store_before);
        assert!(!vault.key.has_backup());
        assert_eq!(vault.get("vercel", "a").unwrap().unwrap().expose_secret(), TOKEN);
    }

    #[test]
    fn test_rotation_aborts_on_undecryptable_entry() {
        let (vault, _tmp) = test_vault();
        vault.store("vercel", "a", TOKEN).unwrap();
        vault.store("vercel", "b", TOKEN).unwrap();

        let mut entries: VaultFile =
            serde_json::from_slice(&fs::read(vault.store_path()).unwrap()).unwrap();
        entries.get_mut("vercel:b").unwrap().data = "00".repeat(8);
        fs::write(vault.store_path(), serde_json::to_vec(&entries).unwrap()).unwrap();
        let key_before = fs::read(vault.key_path()).unwrap();
        let store_before = fs::read(vault.store_path()).unwrap();

        assert!(matches!(vault.rotate_key(), Err(VaultError::KeyRotation(_))));
        assert_eq!(fs::read(vault.key_path()).unwrap(), key_before);
        assert_eq!(fs::read(vault.store_path()).unwrap(), store_before);
    }

    #[test]
    fn test_rotation_on_empty_vault_creates_key() {
        let (vault, _tmp) = test_vault();
        assert_eq!(vault.rotate_key().unwrap().entries, 0);
        assert!(vault.key_path().exists());
    }

    #[test]
    fn test_interrupted_rotation_is_recovered() {
        let (vault, _tmp) = test_vault();
        vault.store("vercel", "a", TOKEN).unwrap();

        // Simulate a crash after the new key landed but before the store did.
        vault.key.backup().unwrap();
        vault.key.write(&VaultKey::generate()).unwrap();

        assert_eq!(vault.get("vercel", "a").unwrap().unwrap().expose_secret(), TOKEN);
        assert!(!vault.key.has_backup());
    }

    #[test]
    fn test_corrupt_store_is_quarantined() {
        let (vault, _tmp) = test_vault();
        let dir = vault.store_path().parent().unwrap().to_path_buf();
        fs::create_dir_all(&dir).unwrap();
        fs::write(vault.store_path(), b"garbage").unwrap();

        assert!(vault.get("vercel", "a").unwrap().is_none());
        let quarantined = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy().starts_with("credentials.json.corrupt-"));
        assert!(quarantined);
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_drift_corrected() {
        use std::os::unix::fs::PermissionsExt;

        let (vault, _tmp) = test_vault();
        vault.store("vercel", "a", TOKEN).unwrap();
        for path in [vault.store_path(), vault.key_path()] {
            fs::set_permissions(path, fs::Permissions::from_mode(0o644)).unwrap();
        }

        vault.get("vercel", "a").unwrap();

        for path in [vault.store_path(), vault.key_path()] {
            let mode = fs::metadata(path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600, "{}", path.display());
        }
    }
}
