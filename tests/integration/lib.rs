//! Shared sandbox for Orbit integration tests.
//!
//! A [`Sandbox`] owns a temporary Orbit base directory, a live auth file, and
//! a fake `vercel` shell script. The script treats any live token containing
//! `expired` as invalid for `whoami`, and logs every other invocation as
//! `args=<args>|env=<VERCEL_TOKEN or ->|live=<auth.json, whitespace stripped>`.

use std::fs;
use std::path::{Path, PathBuf};

use orbit_providers::{VercelConfig, VercelProvider};
use orbit_switch::Orchestrator;
use tempfile::TempDir;

pub const TOKEN_A: &str = "tok_alpha_abcdefghijklmnopqrstuvwxyz";
pub const TOKEN_B: &str = "tok_bravo_abcdefghijklmnopqrstuvwxyz";

/// Unroutable API base so identity lookups fail fast.
pub const OFFLINE_API: &str = "http://127.0.0.1:9";

pub struct Sandbox {
    _tmp: TempDir,
    pub base: PathBuf,
    pub auth_path: PathBuf,
    pub bin_dir: PathBuf,
    pub log_path: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().to_path_buf();
        let sandbox = Self {
            base: root.join("orbit"),
            auth_path: root.join("vercel-data").join("com.vercel.cli").join("auth.json"),
            bin_dir: root.join("bin"),
            log_path: root.join("vercel.log"),
            _tmp: tmp,
        };
        install_fake_vercel(&sandbox.bin_dir, &sandbox.auth_path, &sandbox.log_path);
        sandbox
    }

    pub fn cli_path(&self) -> PathBuf {
        self.bin_dir.join("vercel")
    }

    pub fn provider(&self) -> VercelProvider {
        let config = VercelConfig {
            auth_path: self.auth_path.clone(),
            api_base: OFFLINE_API.to_string(),
            cli: self.cli_path().to_string_lossy().into_owned(),
        };
        VercelProvider::new(config, &self.base).expect("vercel provider")
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(&self.base)
    }

    /// Simulate `vercel login` as the account owning `token`.
    pub fn login_as(&self, token: &str) {
        write_auth(&self.auth_path, token);
    }

    /// Token currently in the live auth file.
    pub fn live_token(&self) -> Option<String> {
        read_auth(&self.auth_path)
    }

    pub fn snapshot_path(&self, profile: &str) -> PathBuf {
        orbit_core::paths::snapshot_file(&self.base, "vercel", profile)
    }

    /// Invocations the fake CLI logged, oldest first.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log_path)
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

pub fn write_auth(path: &Path, token: &str) {
    fs::create_dir_all(path.parent().expect("auth dir")).expect("create auth dir");
    fs::write(path, serde_json::json!({ "token": token }).to_string()).expect("write auth");
}

pub fn read_auth(path: &Path) -> Option<String> {
    let raw = fs::read(path).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&raw).ok()?;
    value["token"].as_str().map(str::to_string)
}

/// Write the fake `vercel` script into `bin_dir`.
pub fn install_fake_vercel(bin_dir: &Path, auth: &Path, log: &Path) {
    fs::create_dir_all(bin_dir).expect("create bin dir");
    let script = format!(
        r#"#!/bin/sh
auth='{auth}'
log='{log}'
if [ -f "$auth" ]; then live=$(tr -d ' \n' < "$auth"); else live=-; fi
case "$1" in
  whoami)
    case "$live" in
      *expired*|-) exit 1 ;;
      *) echo ok; exit 0 ;;
    esac
    ;;
  *)
    echo "args=$*|env=${{VERCEL_TOKEN:--}}|live=$live" >> "$log"
    if [ "$1" = "fail" ]; then exit "${{2:-1}}"; fi
    exit 0
    ;;
esac
"#,
        auth = auth.display(),
        log = log.display(),
    );

    let path = bin_dir.join("vercel");
    fs::write(&path, script).expect("write fake vercel");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake vercel");
    }
}
