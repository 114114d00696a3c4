//! Optional provider capabilities.

use async_trait::async_trait;
use orbit_core::SecretString;

use crate::Result;

/// Discovers a token the provider CLI already holds.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn stored_token(&self) -> Result<Option<SecretString>>;
}

/// Resolves the account behind a token. Any failure yields `None`.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn user_email(&self, token: &SecretString) -> Option<String>;
}

/// Runs the provider's interactive login flow.
#[async_trait]
pub trait InteractiveLogin: Send + Sync {
    /// Returns whether the login completed successfully.
    async fn login(&self) -> Result<bool>;
}

/// Copies live auth state into a profile's snapshot.
#[async_trait]
pub trait AuthCapture: Send + Sync {
    /// Returns `false` when there is no live auth state to capture.
    async fn capture(&self, profile: &str) -> Result<bool>;
}

/// Copies a profile's snapshot into live auth state.
#[async_trait]
pub trait AuthRestore: Send + Sync {
    /// Returns `false`, leaving live auth state untouched, when the profile
    /// has no snapshot.
    async fn restore(&self, profile: &str) -> Result<bool>;
}

/// Checks whether the live credential actually authenticates.
#[async_trait]
pub trait AuthValidation: Send + Sync {
    async fn validate_active_auth(&self) -> Result<bool>;
}

/// Writes live auth state directly from a raw token.
#[async_trait]
pub trait AuthSeeding: Send + Sync {
    async fn seed_from_token(&self, token: &SecretString) -> Result<bool>;
}

/// Deletes a profile's snapshot.
#[async_trait]
pub trait SnapshotRemoval: Send + Sync {
    async fn remove_snapshot(&self, profile: &str) -> Result<()>;
}
