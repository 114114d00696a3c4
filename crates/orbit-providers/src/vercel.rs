//! Vercel provider.
//!
//! The Vercel CLI keeps its session in a single `auth.json`. Orbit swaps that
//! file with per-profile snapshots so `vercel` runs natively under the chosen
//! account, and falls back to `VERCEL_TOKEN` injection otherwise.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use orbit_core::fs::atomic_write;
use orbit_core::{env, SecretString};
use reqwest::Client;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::capability::{
    AuthCapture, AuthRestore, AuthSeeding, AuthValidation, IdentityLookup, InteractiveLogin,
    SnapshotRemoval, TokenSource,
};
use crate::error::{ProviderError, Result};
use crate::snapshot::SnapshotStore;
use crate::Provider;

/// Default Vercel API base URL.
const DEFAULT_API_BASE: &str = "https://api.vercel.com";

/// Environment variable overriding the API base URL.
pub const API_BASE_ENV: &str = "ORBIT_VERCEL_API";

const NAME: &str = "vercel";
const ENV_VAR: &str = "VERCEL_TOKEN";
const CLI_NAME: &str = "vercel";
const MIN_TOKEN_LEN: usize = 21;

/// Where the Vercel CLI and API live.
#[derive(Debug, Clone)]
pub struct VercelConfig {
    pub auth_path: PathBuf,
    pub api_base: String,
    pub cli: String,
}

impl VercelConfig {
    /// Resolve the platform auth path and API base from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            auth_path: default_auth_path()?,
            api_base: env::get_var_or(API_BASE_ENV, DEFAULT_API_BASE),
            cli: CLI_NAME.to_string(),
        })
    }

    pub fn with_auth_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.auth_path = path.into();
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn with_cli(mut self, cli: impl Into<String>) -> Self {
        self.cli = cli.into();
        self
    }
}

/// Location of the Vercel CLI's `auth.json` on this platform.
fn default_auth_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| ProviderError::config("could not determine home directory"))?;

    let data_dir = if cfg!(target_os = "macos") {
        home.join("Library").join("Application Support")
    } else if cfg!(windows) {
        env::get_var("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join("AppData").join("Roaming"))
    } else {
        env::get_var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".local").join("share"))
    };
    Ok(data_dir.join("com.vercel.cli").join("auth.json"))
}

#[derive(Deserialize)]
struct AuthFile {
    token: Option<String>,
}

#[derive(Deserialize)]
struct UserResponse {
    user: User,
}

#[derive(Deserialize)]
struct User {
    email: Option<String>,
}

/// Vercel provider.
pub struct VercelProvider {
    config: VercelConfig,
    snapshots: SnapshotStore,
    client: Client,
}

impl VercelProvider {
    /// Create a provider keeping snapshots under `base`.
    pub fn new(config: VercelConfig, base: &Path) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            snapshots: SnapshotStore::new(base, NAME, config.auth_path.clone()),
            config,
            client,
        })
    }

    pub fn config(&self) -> &VercelConfig {
        &self.config
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }
}

impl Provider for VercelProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn env_var(&self) -> &str {
        ENV_VAR
    }

    fn cli_name(&self) -> &str {
        &self.config.cli
    }

    fn validate_token(&self, token: &str) -> bool {
        token.len() >= MIN_TOKEN_LEN
    }

    fn auth_config_path(&self) -> Option<PathBuf> {
        Some(self.config.auth_path.clone())
    }

    fn token_source(&self) -> Option<&dyn TokenSource> {
        Some(self)
    }

    fn identity(&self) -> Option<&dyn IdentityLookup> {
        Some(self)
    }

    fn login(&self) -> Option<&dyn InteractiveLogin> {
        Some(self)
    }

    fn auth_capture(&self) -> Option<&dyn AuthCapture> {
        Some(self)
    }

    fn auth_restore(&self) -> Option<&dyn AuthRestore> {
        Some(self)
    }

    fn auth_validation(&self) -> Option<&dyn AuthValidation> {
        Some(self)
    }

    fn auth_seeding(&self) -> Option<&dyn AuthSeeding> {
        Some(self)
    }

    fn snapshot_removal(&self) -> Option<&dyn SnapshotRemoval> {
        Some(self)
    }
}

#[async_trait]
impl TokenSource for VercelProvider {
    async fn stored_token(&self) -> Result<Option<SecretString>> {
        let path = &self.config.auth_path;
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ProviderError::io(path, e)),
        };
        let auth: AuthFile = serde_json::from_slice(&raw).map_err(|source| ProviderError::AuthFile {
            path: path.clone(),
            source,
        })?;

        Ok(auth.token.filter(|t| !t.is_empty()).map(SecretString::new))
    }
}

#[async_trait]
impl IdentityLookup for VercelProvider {
    async fn user_email(&self, token: &SecretString) -> Option<String> {
        let url = format!("{}/v2/user", self.config.api_base.trim_end_matches('/'));

        let response = match self
            .client
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("user lookup failed: {e}");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(status = %response.status(), "user lookup rejected");
            return None;
        }

        match response.json::<UserResponse>().await {
            Ok(body) => body.user.email,
            Err(e) => {
                debug!("user lookup returned an unexpected body: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl InteractiveLogin for VercelProvider {
    async fn login(&self) -> Result<bool> {
        let status = Command::new(&self.config.cli)
            .arg("login")
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| ProviderError::Command {
                command: format!("{} login", self.config.cli),
                source,
            })?;
        Ok(status.success())
    }
}

#[async_trait]
impl AuthCapture for VercelProvider {
    async fn capture(&self, profile: &str) -> Result<bool> {
        self.snapshots.capture(profile)
    }
}

#[async_trait]
impl AuthRestore for VercelProvider {
    async fn restore(&self, profile: &str) -> Result<bool> {
        self.snapshots.restore(profile)
    }
}

#[async_trait]
impl AuthValidation for VercelProvider {
    async fn validate_active_auth(&self) -> Result<bool> {
        let result = Command::new(&self.config.cli)
            .arg("whoami")
            .env_remove(ENV_VAR)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match result {
            Ok(status) => Ok(status.success()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(cli = %self.config.cli, "CLI not found; skipping auth validation");
                Ok(true)
            }
            Err(source) => Err(ProviderError::Command {
                command: format!("{} whoami", self.config.cli),
                source,
            }),
        }
    }
}

#[async_trait]
impl AuthSeeding for VercelProvider {
    async fn seed_from_token(&self, token: &SecretString) -> Result<bool> {
        let path = &self.config.auth_path;
        let mut content = serde_json::to_vec_pretty(&serde_json::json!({
            "token": token.expose_secret(),
        }))
        .map_err(|source| ProviderError::AuthFile {
            path: path.clone(),
            source,
        })?;
        content.push(b'\n');

        atomic_write(path, &content).map_err(|e| ProviderError::io(path, e))?;
        debug!("seeded live auth from stored token");
        Ok(true)
    }
}

#[async_trait]
impl SnapshotRemoval for VercelProvider {
    async fn remove_snapshot(&self, profile: &str) -> Result<()> {
        self.snapshots.remove(profile)
    }
}
