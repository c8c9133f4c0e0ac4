//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// Mapping from provider names to their API key environment variables
static ENV_VAR_MAP: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("openai", vec!["OPENAI_API_KEY"]);
    m.insert("azure", vec!["AZURE_OPENAI_API_KEY", "AZURE_API_KEY"]);
    m.insert("anthropic", vec!["ANTHROPIC_API_KEY"]);
    m.insert("google", vec!["GOOGLE_API_KEY", "GEMINI_API_KEY"]);
    m
});

/// API key environment variables for a provider, empty for unknown providers
pub fn env_vars_for(provider: &str) -> &'static [&'static str] {
    ENV_VAR_MAP
        .get(provider.to_lowercase().as_str())
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// Secret store that reads from environment variables
///
/// This store is read-only. Keys are looked up as-is first; a provider name
/// (`openai`, `azure`, ...) is mapped to its API key variables.
#[derive(Debug, Default)]
pub struct EnvSecretStore {
    _private: (),
}

impl EnvSecretStore {
    /// Create a new environment variable secret store
    pub fn new() -> Self {
        Self { _private: () }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = non_empty_var(key) {
            return Some(value);
        }
        env_vars_for(key).iter().find_map(|var| non_empty_var(var))
    }

    fn store(&self, _key: &str, _value: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }

    fn delete(&self, _key: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_store_name() {
        let store = EnvSecretStore::new();
        assert_eq!(store.name(), "env");
    }

    #[test]
    fn test_env_store_read_only() {
        let store = EnvSecretStore::new();
        assert!(matches!(store.store("test", "value"), Err(SecretStoreError::ReadOnly)));
        assert!(matches!(store.delete("test"), Err(SecretStoreError::ReadOnly)));
    }

    #[test]
    fn test_env_store_get_direct() {
        env::set_var("UNILLM_TEST_SECRET_12345", "test_value");

        let store = EnvSecretStore::new();
        assert_eq!(store.get("UNILLM_TEST_SECRET_12345"), Some("test_value".to_string()));

        env::remove_var("UNILLM_TEST_SECRET_12345");
    }

    #[test]
    fn test_env_store_empty_is_absent() {
        env::set_var("UNILLM_TEST_EMPTY_SECRET", "");

        let store = EnvSecretStore::new();
        assert_eq!(store.get("UNILLM_TEST_EMPTY_SECRET"), None);

        env::remove_var("UNILLM_TEST_EMPTY_SECRET");
    }

    #[test]
    fn test_env_vars_for() {
        assert_eq!(env_vars_for("OpenAI"), &["OPENAI_API_KEY"]);
        assert!(env_vars_for("google").contains(&"GEMINI_API_KEY"));
        assert!(env_vars_for("nonexistent").is_empty());
    }

    #[test]
    fn test_env_store_get_not_found() {
        let store = EnvSecretStore::new();
        assert_eq!(store.get("UNILLM_NONEXISTENT_PROVIDER_XYZ"), None);
    }
}
