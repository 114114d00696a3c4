//! CLI command implementations.

pub mod add;
pub mod exec;
pub mod list;
pub mod remove;
pub mod rotate;
pub mod switch;

use std::path::Path;

use anyhow::Context;
use orbit_core::paths;
use orbit_providers::Providers;
use orbit_switch::Orchestrator;

/// Everything a command needs, resolved once per invocation.
pub struct App {
    pub providers: Providers,
    pub orchestrator: Orchestrator,
}

impl App {
    /// Resolve the base directory from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let base = paths::base_dir().context("Failed to resolve the Orbit config directory")?;
        Self::in_dir(&base)
    }

    pub fn in_dir(base: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            providers: Providers::builtin(base)?,
            orchestrator: Orchestrator::new(base),
        })
    }
}
