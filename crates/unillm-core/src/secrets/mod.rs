//! Credential lookup used by the config validator
//!
//! - `SecretStore` trait for implementing custom stores
//! - `EnvSecretStore`: process environment (default)
//! - `MemorySecretStore`: in-memory, for tests and hosts that inject credentials

mod traits;
mod env_store;
mod memory_store;

pub use traits::{SecretStore, SecretStoreError, SecretStoreResult};
pub use env_store::{EnvSecretStore, env_vars_for};
pub use memory_store::MemorySecretStore;
