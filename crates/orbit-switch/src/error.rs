//! Error types for profile orchestration.

use orbit_core::{RegistryError, ValidationError};
use orbit_providers::ProviderError;
use orbit_vault::VaultError;
use thiserror::Error;

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, SwitchError>;

/// Orchestrator error types.
#[derive(Debug, Error)]
pub enum SwitchError {
    /// Malformed provider or profile name. Nothing was touched.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Profile \"{profile}\" does not exist for provider \"{provider}\"")]
    ProfileNotFound { provider: String, profile: String },

    #[error("No active profile set for {provider}. Use \"orbit use {provider} <profile>\" first.")]
    NoActiveProfile { provider: String },

    #[error("No token found for {provider}/{profile}. Try adding it again with \"orbit add\".")]
    CredentialNotFound { provider: String, profile: String },

    /// The target has no snapshot. Live auth and the registry are unchanged.
    #[error("No saved auth snapshot for {provider}/{profile}. Run \"orbit add {provider} {profile}\" while logged in to that account.")]
    SnapshotMissing { provider: String, profile: String },

    /// Validation failed after restore and recovery. Live auth was rolled
    /// back and the registry is unchanged.
    #[error("Credentials for {provider}/{profile} are invalid or expired. Log in again and re-run \"orbit add {provider} {profile}\".")]
    AuthInvalidAfterRestore { provider: String, profile: String },

    #[error("Invalid token format for {provider}. Please check your token and try again.")]
    InvalidToken { provider: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The advisory lock could not be taken.
    #[error(transparent)]
    Lock(orbit_core::Error),

    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
