//! # orbit-core
//!
//! Core types and utilities shared by every Orbit crate.
//!
//! - **Registry**: the durable provider → profiles mapping with self-repair
//! - **Files**: atomic writes, quarantine, owner-only permission repair
//! - **Utilities**: path resolution, name validation, redaction, locking

pub mod env;
pub mod error;
pub mod fs;
pub mod lock;
pub mod names;
pub mod paths;
pub mod redact;
pub mod registry;
pub mod secret;

// Re-exports for convenience
pub use error::{Error, RegistryError, Result, ValidationError};
pub use registry::{ProfileMetadata, ProviderEntry, Registry, RegistryStore};
pub use secret::SecretString;
