//! Encrypted credential vault for Orbit.
//!
//! Tokens are sealed with AES-256-GCM under a single local key and stored in
//! one JSON file keyed by `"<provider>:<profile>"`. The key can be rotated
//! transactionally: either every entry moves to the new key or none does.

pub mod crypto;
pub mod error;
pub mod key;
pub mod store;
pub mod types;

pub use error::{Result, VaultError};
pub use key::VaultKey;
pub use store::Vault;
pub use types::{entry_key, EncryptedEntry, Lookup, RotationReport};
