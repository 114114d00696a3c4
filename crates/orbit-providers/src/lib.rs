//! Provider implementations for Orbit.
//!
//! A provider describes how to drive one external service's own CLI. Only
//! [`Provider::name`], [`Provider::env_var`], [`Provider::cli_name`] and
//! [`Provider::validate_token`] are mandatory. Everything else is an optional
//! capability exposed through an accessor that returns `None` by default, so
//! callers branch on presence instead of relying on silent default behavior.
//!
//! # Example
//!
//! ```rust,ignore
//! use orbit_providers::Providers;
//!
//! let providers = Providers::builtin(&base_dir)?;
//! let vercel = providers.get("vercel")?;
//!
//! if let Some(restore) = vercel.auth_restore() {
//!     restore.restore("work").await?;
//! }
//! ```

mod capability;
mod catalogue;
mod error;
pub mod snapshot;
pub mod vercel;

pub use capability::{
    AuthCapture, AuthRestore, AuthSeeding, AuthValidation, IdentityLookup, InteractiveLogin,
    SnapshotRemoval, TokenSource,
};
pub use catalogue::Providers;
pub use error::{ProviderError, Result};
pub use snapshot::SnapshotStore;
pub use vercel::{VercelConfig, VercelProvider};

use std::path::PathBuf;

/// An external service whose CLI Orbit can run under different profiles.
pub trait Provider: Send + Sync {
    /// Lower-case provider name used in the registry and vault keys.
    fn name(&self) -> &str;

    /// Environment variable the provider CLI reads a token from.
    fn env_var(&self) -> &str;

    /// Executable name of the provider CLI.
    fn cli_name(&self) -> &str;

    /// Format check only. Never touches the network.
    fn validate_token(&self, token: &str) -> bool;

    /// Where the provider CLI keeps its live credentials. Presence means the
    /// CLI can run natively after a snapshot swap.
    fn auth_config_path(&self) -> Option<PathBuf> {
        None
    }

    fn token_source(&self) -> Option<&dyn TokenSource> {
        None
    }

    fn identity(&self) -> Option<&dyn IdentityLookup> {
        None
    }

    fn login(&self) -> Option<&dyn InteractiveLogin> {
        None
    }

    fn auth_capture(&self) -> Option<&dyn AuthCapture> {
        None
    }

    fn auth_restore(&self) -> Option<&dyn AuthRestore> {
        None
    }

    fn auth_validation(&self) -> Option<&dyn AuthValidation> {
        None
    }

    fn auth_seeding(&self) -> Option<&dyn AuthSeeding> {
        None
    }

    fn snapshot_removal(&self) -> Option<&dyn SnapshotRemoval> {
        None
    }
}
