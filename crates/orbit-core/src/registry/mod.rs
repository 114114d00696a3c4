//! Profile registry: which profiles exist per provider and which is active.
//!
//! [`Registry`] is the in-memory model with its invariants; [`RegistryStore`]
//! persists it as `config.json` with atomic writes and quarantine-on-corruption.

mod schema;
mod store;

pub use schema::{ProfileMetadata, ProviderEntry, Registry};
pub use store::RegistryStore;
