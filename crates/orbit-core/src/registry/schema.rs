//! Registry data model.
//!
//! On disk:
//!
//! ```json
//! { "providers": { "vercel": { "profiles": ["a", "b"], "current": "a",
//!                              "metadata": { "a": { "email": "a@example.com" } } } } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::names::is_valid_name;

/// Per-profile metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    /// Account email, when it could be looked up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ProfileMetadata {
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
        }
    }
}

/// One provider's record.
///
/// Invariants: `profiles` has no duplicates, `current` and every `metadata`
/// key are members of `profiles`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub profiles: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, ProfileMetadata>,
}

impl ProviderEntry {
    pub fn contains(&self, profile: &str) -> bool {
        self.profiles.iter().any(|p| p == profile)
    }

    pub fn email(&self, profile: &str) -> Option<&str> {
        self.metadata.get(profile).and_then(|m| m.email.as_deref())
    }

    pub fn is_current(&self, profile: &str) -> bool {
        self.current.as_deref() == Some(profile)
    }
}

/// Mapping of provider name to its profile record.
///
/// Providers with no profiles are removed rather than kept empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub providers: BTreeMap<String, ProviderEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, provider: &str) -> Option<&ProviderEntry> {
        self.providers.get(provider)
    }

    pub fn contains(&self, provider: &str, profile: &str) -> bool {
        self.entry(provider).is_some_and(|e| e.contains(profile))
    }

    pub fn current(&self, provider: &str) -> Option<&str> {
        self.entry(provider).and_then(|e| e.current.as_deref())
    }

    /// Add `profile` (idempotent on membership). Supplied metadata always
    /// replaces what was stored before.
    pub fn add_profile(
        &mut self,
        provider: &str,
        profile: &str,
        metadata: Option<ProfileMetadata>,
    ) {
        let entry = self.providers.entry(provider.to_string()).or_default();
        if !entry.contains(profile) {
            entry.profiles.push(profile.to_string());
        }
        if let Some(metadata) = metadata {
            entry.metadata.insert(profile.to_string(), metadata);
        }
    }

    /// Remove `profile`, its metadata, and the `current` pointer if it named
    /// it. Drops the provider record when no profiles remain.
    ///
    /// Returns whether anything changed.
    pub fn remove_profile(&mut self, provider: &str, profile: &str) -> bool {
        let Some(entry) = self.providers.get_mut(provider) else {
            return false;
        };

        let before = entry.profiles.len();
        entry.profiles.retain(|p| p != profile);
        let removed = entry.profiles.len() != before;

        if entry.is_current(profile) {
            entry.current = None;
        }
        let had_metadata = entry.metadata.remove(profile).is_some();

        if entry.profiles.is_empty() {
            self.providers.remove(provider);
        }
        removed || had_metadata
    }

    /// Point `current` at `profile`. Fails without mutating if the profile
    /// is not a member of the provider's set.
    pub fn set_current(&mut self, provider: &str, profile: &str) -> Result<(), RegistryError> {
        let entry = self
            .providers
            .get_mut(provider)
            .ok_or_else(|| RegistryError::UnknownProvider(provider.to_string()))?;

        if !entry.contains(profile) {
            return Err(RegistryError::ProfileNotFound {
                provider: provider.to_string(),
                profile: profile.to_string(),
            });
        }

        entry.current = Some(profile.to_string());
        Ok(())
    }

    /// Repair invariant violations in place. Returns a description of each
    /// repair so the caller can report it.
    pub fn normalize(&mut self) -> Vec<String> {
        let mut repairs = Vec::new();

        self.providers.retain(|provider, entry| {
            if !is_valid_name(provider) {
                repairs.push(format!("dropped provider with invalid name {provider:?}"));
                return false;
            }

            let mut seen = Vec::with_capacity(entry.profiles.len());
            for profile in entry.profiles.drain(..) {
                if !is_valid_name(&profile) {
                    repairs.push(format!("{provider}: dropped invalid profile name {profile:?}"));
                } else if seen.contains(&profile) {
                    repairs.push(format!("{provider}: dropped duplicate profile {profile:?}"));
                } else {
                    seen.push(profile);
                }
            }
            entry.profiles = seen;

            if let Some(current) = entry.current.clone() {
                if !entry.contains(&current) {
                    repairs.push(format!("{provider}: cleared dangling current {current:?}"));
                    entry.current = None;
                }
            }

            let profiles = entry.profiles.clone();
            entry.metadata.retain(|profile, _| {
                let keep = profiles.contains(profile);
                if !keep {
                    repairs.push(format!("{provider}: dropped metadata for unknown profile {profile:?}"));
                }
                keep
            });

            if entry.profiles.is_empty() {
                repairs.push(format!("{provider}: dropped empty provider record"));
                return false;
            }
            true
        });

        repairs
    }
}
