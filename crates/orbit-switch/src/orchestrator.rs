//! Profile protocols: add, remove, switch, run once, exec under current.
//!
//! The registry's `current` pointer only ever moves after live auth has been
//! confirmed to belong to the new profile. Every mutating protocol runs under
//! the advisory lock in the base directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use orbit_core::lock::ProfileLock;
use orbit_core::names::{validate_profile_name, validate_provider_name};
use orbit_core::{paths, ProfileMetadata, RegistryStore, SecretString};
use orbit_providers::Provider;
use orbit_vault::{RotationReport, Vault};
use tracing::{debug, info, warn};

use crate::error::{Result, SwitchError};
use crate::runner::{CommandRunner, Invocation, ProcessRunner};
use crate::slot::LiveSwap;

/// Steps of the switch protocol, as they appear in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchPhase {
    CaptureCurrent,
    RestoreTarget,
    Validate,
    Recover,
    Revalidate,
    Rollback,
    Commit,
}

impl fmt::Display for SwitchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwitchPhase::CaptureCurrent => "capture-current",
            SwitchPhase::RestoreTarget => "restore-target",
            SwitchPhase::Validate => "validate",
            SwitchPhase::Recover => "recover",
            SwitchPhase::Revalidate => "revalidate",
            SwitchPhase::Rollback => "rollback",
            SwitchPhase::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// How live auth was confirmed during a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthCheck {
    /// The provider cannot restore or validate live auth.
    Skipped,
    Passed,
    /// The snapshot was stale; live auth was re-seeded from the vault.
    Recovered,
}

/// Result of a committed switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOutcome {
    pub previous: Option<String>,
    /// Whether a snapshot was restored into live auth.
    pub restored: bool,
    pub auth: AuthCheck,
}

/// Where an added token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    /// Read from the provider CLI's live auth state.
    LiveAuth,
    /// Typed, piped, or passed on the command line.
    Supplied,
}

/// Result of adding a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub email: Option<String>,
    /// The profile already existed and was overwritten.
    pub replaced: bool,
    /// A snapshot of live auth was saved for the profile.
    pub captured: bool,
}

/// Result of removing a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub was_current: bool,
    pub token_deleted: bool,
}

/// How a command was run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Live auth held the profile; the CLI ran unmodified.
    Native,
    /// The token was injected through the provider's environment variable.
    EnvInjection,
}

/// Result of running the provider CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub mode: ExecMode,
}

/// Coordinates the registry, the vault, and a provider's live auth.
pub struct Orchestrator {
    registry: RegistryStore,
    vault: Vault,
    runner: Arc<dyn CommandRunner>,
    lock_path: PathBuf,
}

impl Orchestrator {
    /// Orchestrator over the stores in `base`, running real processes.
    pub fn new(base: &Path) -> Self {
        Self {
            registry: RegistryStore::in_dir(base),
            vault: Vault::in_dir(base),
            runner: Arc::new(ProcessRunner),
            lock_path: paths::lock_file(base),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn registry(&self) -> &RegistryStore {
        &self.registry
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    fn lock(&self) -> Result<ProfileLock> {
        ProfileLock::acquire(&self.lock_path).map_err(SwitchError::Lock)
    }

    fn require_profile(&self, provider: &str, profile: &str) -> Result<()> {
        if self.registry.exists(provider, profile)? {
            Ok(())
        } else {
            Err(SwitchError::ProfileNotFound {
                provider: provider.to_string(),
                profile: profile.to_string(),
            })
        }
    }

    /// Store `token` for a profile and register it.
    ///
    /// The token must pass the provider's format check. When it was read from
    /// live auth, the live state is also captured as the profile's snapshot.
    pub async fn add_profile(
        &self,
        provider: &dyn Provider,
        profile: &str,
        token: &SecretString,
        origin: TokenOrigin,
    ) -> Result<AddOutcome> {
        let provider_name = validate_provider_name(provider.name())?;
        let profile = validate_profile_name(profile)?;
        let token = token.trimmed();
        if token.is_empty() || !provider.validate_token(token.expose_secret()) {
            return Err(SwitchError::InvalidToken {
                provider: provider_name,
            });
        }

        let email = match provider.identity() {
            Some(identity) => identity.user_email(&token).await,
            None => None,
        };

        let _lock = self.lock()?;
        let replaced = self.registry.exists(&provider_name, &profile)?;
        if replaced {
            warn!(provider = %provider_name, profile = %profile, "profile already exists; overwriting");
            // The old snapshot belongs to the replaced token's account.
            if origin == TokenOrigin::Supplied {
                if let Some(removal) = provider.snapshot_removal() {
                    removal.remove_snapshot(&profile).await?;
                    debug!(provider = %provider_name, profile = %profile, "discarded snapshot of replaced token");
                }
            }
        }

        self.vault
            .store(&provider_name, &profile, token.expose_secret())?;
        self.registry.add_profile(
            &provider_name,
            &profile,
            email.clone().map(ProfileMetadata::with_email),
        )?;

        let mut captured = false;
        if origin == TokenOrigin::LiveAuth {
            if let Some(capture) = provider.auth_capture() {
                match capture.capture(&profile).await {
                    Ok(done) => captured = done,
                    Err(e) => warn!(provider = %provider_name, profile = %profile, "could not save auth snapshot: {e}"),
                }
            }
        }

        info!(provider = %provider_name, profile = %profile, "profile added");
        Ok(AddOutcome {
            email,
            replaced,
            captured,
        })
    }

    /// Delete a profile's token, snapshot, and registry record.
    pub async fn remove_profile(&self, provider: &dyn Provider, profile: &str) -> Result<RemoveOutcome> {
        let provider_name = validate_provider_name(provider.name())?;
        let profile = validate_profile_name(profile)?;

        let _lock = self.lock()?;
        self.require_profile(&provider_name, &profile)?;
        let was_current = self.registry.get_current(&provider_name)?.as_deref() == Some(profile.as_str());

        // Snapshot first: if it cannot be removed, the token and registry
        // record are left intact.
        if let Some(removal) = provider.snapshot_removal() {
            removal.remove_snapshot(&profile).await?;
        }
        let token_deleted = self.vault.delete(&provider_name, &profile)?;
        self.registry.remove_profile(&provider_name, &profile)?;

        info!(provider = %provider_name, profile = %profile, "profile removed");
        Ok(RemoveOutcome {
            was_current,
            token_deleted,
        })
    }

    /// Persistently make `target` the active profile.
    pub async fn switch_to(&self, provider: &dyn Provider, target: &str) -> Result<SwitchOutcome> {
        let provider_name = validate_provider_name(provider.name())?;
        let target = validate_profile_name(target)?;

        let _lock = self.lock()?;
        self.require_profile(&provider_name, &target)?;
        let previous = self.registry.get_current(&provider_name)?;
        let displaced = previous.as_deref().filter(|p| *p != target);

        if let (Some(previous), Some(capture)) = (displaced, provider.auth_capture()) {
            debug!(phase = %SwitchPhase::CaptureCurrent, profile = previous);
            if let Err(e) = capture.capture(previous).await {
                warn!(provider = %provider_name, profile = previous, "could not save current auth before switching: {e}");
            }
        }

        let Some(restore) = provider.auth_restore() else {
            self.commit(&provider_name, &target)?;
            return Ok(SwitchOutcome {
                previous,
                restored: false,
                auth: AuthCheck::Skipped,
            });
        };

        debug!(phase = %SwitchPhase::RestoreTarget, profile = %target);
        match restore.restore(&target).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(SwitchError::SnapshotMissing {
                    provider: provider_name,
                    profile: target,
                })
            }
            Err(e) => {
                self.roll_back(provider, displaced).await;
                return Err(e.into());
            }
        }

        let auth = match provider.auth_validation() {
            None => AuthCheck::Skipped,
            Some(validation) => {
                debug!(phase = %SwitchPhase::Validate, profile = %target);
                if self.check_auth(provider, validation).await {
                    AuthCheck::Passed
                } else if self.recover(provider, &provider_name, &target).await {
                    AuthCheck::Recovered
                } else {
                    self.roll_back(provider, displaced).await;
                    return Err(SwitchError::AuthInvalidAfterRestore {
                        provider: provider_name,
                        profile: target,
                    });
                }
            }
        };

        // Keep the snapshot current with anything the CLI refreshed.
        if let Some(capture) = provider.auth_capture() {
            if let Err(e) = capture.capture(&target).await {
                warn!(provider = %provider_name, profile = %target, "could not refresh auth snapshot: {e}");
            }
        }

        if let Err(e) = self.commit(&provider_name, &target) {
            self.roll_back(provider, displaced).await;
            return Err(e);
        }
        Ok(SwitchOutcome {
            previous,
            restored: true,
            auth,
        })
    }

    fn commit(&self, provider: &str, profile: &str) -> Result<()> {
        debug!(phase = %SwitchPhase::Commit, profile);
        self.registry.set_current(provider, profile)?;
        info!(provider, profile, "switched profile");
        Ok(())
    }

    async fn check_auth(
        &self,
        provider: &dyn Provider,
        validation: &dyn orbit_providers::AuthValidation,
    ) -> bool {
        match validation.validate_active_auth().await {
            Ok(valid) => valid,
            Err(e) => {
                warn!(provider = provider.name(), "auth validation failed to run: {e}");
                false
            }
        }
    }

    /// Re-seed live auth from the vault and validate again.
    async fn recover(&self, provider: &dyn Provider, provider_name: &str, profile: &str) -> bool {
        debug!(phase = %SwitchPhase::Recover, profile);
        let (Some(seeding), Some(validation)) = (provider.auth_seeding(), provider.auth_validation())
        else {
            return false;
        };

        let token = match self.vault.get(provider_name, profile) {
            Ok(Some(token)) if provider.validate_token(token.expose_secret()) => token,
            Ok(_) => {
                debug!(provider = provider_name, profile, "no usable stored token to recover with");
                return false;
            }
            Err(e) => {
                warn!(provider = provider_name, profile, "could not read stored token: {e}");
                return false;
            }
        };

        match seeding.seed_from_token(&token).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                warn!(provider = provider_name, profile, "could not seed live auth: {e}");
                return false;
            }
        }

        debug!(phase = %SwitchPhase::Revalidate, profile);
        self.check_auth(provider, validation).await
    }

    async fn roll_back(&self, provider: &dyn Provider, previous: Option<&str>) {
        let (Some(previous), Some(restore)) = (previous, provider.auth_restore()) else {
            return;
        };
        debug!(phase = %SwitchPhase::Rollback, profile = previous);
        match restore.restore(previous).await {
            Ok(true) => {}
            Ok(false) => warn!(provider = provider.name(), profile = previous, "no snapshot to roll back to"),
            Err(e) => warn!(provider = provider.name(), profile = previous, "rollback failed: {e}"),
        }
    }

    /// Run the provider CLI once as `profile` without changing the active
    /// profile. Live auth is put back afterwards whatever the outcome.
    pub async fn run_as(&self, provider: &dyn Provider, profile: &str, args: Vec<String>) -> Result<RunOutcome> {
        let provider_name = validate_provider_name(provider.name())?;
        let profile = validate_profile_name(profile)?;

        let _lock = self.lock()?;
        self.require_profile(&provider_name, &profile)?;
        let previous = self.registry.get_current(&provider_name)?;

        let swap = LiveSwap::acquire(provider, previous, &profile).await?;
        let result = self.spawn(provider, &provider_name, &profile, args, swap.swapped()).await;
        swap.release().await;
        result
    }

    /// Run the provider CLI as the active profile.
    pub async fn exec_current(&self, provider: &dyn Provider, args: Vec<String>) -> Result<RunOutcome> {
        let provider_name = validate_provider_name(provider.name())?;
        let current = self
            .registry
            .get_current(&provider_name)?
            .ok_or_else(|| SwitchError::NoActiveProfile {
                provider: provider_name.clone(),
            })?;

        let restored = match provider.auth_restore() {
            None => true,
            Some(restore) => {
                let _lock = self.lock()?;
                match restore.restore(&current).await {
                    Ok(restored) => restored,
                    Err(e) => {
                        warn!(provider = %provider_name, profile = %current, "could not restore live auth: {e}");
                        false
                    }
                }
            }
        };
        let native = restored && provider.auth_config_path().is_some();

        self.spawn(provider, &provider_name, &current, args, native).await
    }

    async fn spawn(
        &self,
        provider: &dyn Provider,
        provider_name: &str,
        profile: &str,
        args: Vec<String>,
        native: bool,
    ) -> Result<RunOutcome> {
        let invocation = Invocation::new(provider.cli_name(), args);
        let (invocation, mode) = if native {
            (invocation.without_env(provider.env_var()), ExecMode::Native)
        } else {
            let token = self
                .vault
                .get(provider_name, profile)?
                .ok_or_else(|| SwitchError::CredentialNotFound {
                    provider: provider_name.to_string(),
                    profile: profile.to_string(),
                })?;
            (invocation.with_env(provider.env_var(), token), ExecMode::EnvInjection)
        };

        info!(provider = provider_name, profile, ?mode, "running {}", invocation.display());
        let exit_code = self
            .runner
            .run(&invocation)
            .await
            .map_err(|source| SwitchError::Spawn {
                command: invocation.display(),
                source,
            })?;
        Ok(RunOutcome { exit_code, mode })
    }

    /// Re-encrypt the vault under a new key.
    pub fn rotate_key(&self) -> Result<RotationReport> {
        let _lock = self.lock()?;
        Ok(self.vault.rotate_key()?)
    }
}
