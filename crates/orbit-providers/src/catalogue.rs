//! Registered providers, looked up by name.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ProviderError, Result};
use crate::vercel::{VercelConfig, VercelProvider};
use crate::Provider;

/// Provider catalogue keyed by lower-case name.
#[derive(Default, Clone)]
pub struct Providers {
    providers: BTreeMap<String, Arc<dyn Provider>>,
}

impl Providers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue with every built-in provider, storing snapshots under `base`.
    pub fn builtin(base: &Path) -> Result<Self> {
        let mut providers = Self::new();
        providers.register(Arc::new(VercelProvider::new(
            VercelConfig::from_env()?,
            base,
        )?));
        Ok(providers)
    }

    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers
            .insert(provider.name().to_lowercase(), provider);
    }

    /// Look a provider up, case-insensitively.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>> {
        self.providers
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("names", &self.names())
            .finish()
    }
}
