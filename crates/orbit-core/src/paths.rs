//! Path resolution utilities.

use crate::env;
use crate::error::Error;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the Orbit base directory.
pub const CONFIG_DIR_ENV: &str = "ORBIT_CONFIG_DIR";

const BASE_DIR_NAME: &str = ".orbit";
const REGISTRY_FILE: &str = "config.json";
const VAULT_FILE: &str = "credentials.json";
const KEY_FILE: &str = ".key";
const LOCK_FILE: &str = ".lock";
const AUTH_DIR: &str = "auth";

/// Get the Orbit base directory.
///
/// Priority: `ORBIT_CONFIG_DIR` > `~/.orbit`.
pub fn base_dir() -> Result<PathBuf, Error> {
    if let Some(dir) = env::get_var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().ok_or(Error::NoHomeDir)?;
    Ok(home.join(BASE_DIR_NAME))
}

/// Get the registry file path (`<base>/config.json`).
pub fn registry_file(base: &Path) -> PathBuf {
    base.join(REGISTRY_FILE)
}

/// Get the vault store path (`<base>/credentials.json`).
pub fn vault_file(base: &Path) -> PathBuf {
    base.join(VAULT_FILE)
}

/// Get the vault key path (`<base>/.key`).
pub fn key_file(base: &Path) -> PathBuf {
    base.join(KEY_FILE)
}

/// Get the advisory lock path (`<base>/.lock`).
pub fn lock_file(base: &Path) -> PathBuf {
    base.join(LOCK_FILE)
}

/// Get a provider's snapshot directory (`<base>/auth/<provider>`).
pub fn snapshot_dir(base: &Path, provider: &str) -> PathBuf {
    base.join(AUTH_DIR).join(provider)
}

/// Get one profile's snapshot file (`<base>/auth/<provider>/<profile>.json`).
pub fn snapshot_file(base: &Path, provider: &str, profile: &str) -> PathBuf {
    snapshot_dir(base, provider).join(format!("{profile}.json"))
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
