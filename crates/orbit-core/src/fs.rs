//! File helpers for owner-only, all-or-nothing persistence.
//!
//! Every persisted Orbit artifact goes through [`atomic_write`]: content is
//! written to a temporary sibling and renamed into place, so a reader sees
//! either the old file or the new one, never a partial write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Mode for persisted files (owner read/write).
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Mode for directories holding persisted files (owner only).
pub const PRIVATE_DIR_MODE: u32 = 0o700;

/// Create `dir` (and parents) if missing and restrict it to the owner.
pub fn ensure_private_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    set_mode(dir, PRIVATE_DIR_MODE)
}

/// Reset `path` to owner-only permissions if it has drifted.
///
/// Missing files are ignored.
pub fn ensure_private_file(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    set_mode(path, PRIVATE_FILE_MODE)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let current = fs::metadata(path)?.permissions().mode() & 0o777;
    if current != mode {
        debug!(path = %path.display(), from = format!("{current:o}"), to = format!("{mode:o}"), "fixing permissions");
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Atomically replace `path` with `contents`, owner-only.
///
/// The parent directory is created (owner-only) when missing. On failure the
/// temporary file is removed and the previous content of `path` is intact.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.exists() {
        ensure_private_dir(&dir)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "orbit".to_string());
    let temp_path = dir.join(format!(
        ".{file_name}.{}.{}.tmp",
        std::process::id(),
        uuid::Uuid::new_v4()
    ));

    let result = write_then_rename(&temp_path, path, contents);
    if result.is_err() && temp_path.exists() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_then_rename(temp_path: &Path, path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(PRIVATE_FILE_MODE);
    }

    let mut file = options.open(temp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    set_mode(temp_path, PRIVATE_FILE_MODE)?;
    fs::rename(temp_path, path)?;
    set_mode(path, PRIVATE_FILE_MODE)
}

/// Rename a corrupt file aside as `<name>.corrupt-<timestamp>`.
///
/// Returns the quarantine path. The original bytes are preserved for
/// inspection; nothing is deleted.
pub fn quarantine(path: &Path) -> io::Result<PathBuf> {
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    let base = format!("{}.corrupt-{stamp}", path.display());

    let mut target = PathBuf::from(&base);
    let mut attempt = 1;
    while target.exists() {
        target = PathBuf::from(format!("{base}-{attempt}"));
        attempt += 1;
    }

    fs::rename(path, &target)?;
    Ok(target)
}
