//! In-memory secret store

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::{SecretStore, SecretStoreResult};

/// In-memory secret store for testing and ephemeral use
///
/// Secrets are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory store with initial values
    pub fn with_secrets<K, V>(initial: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            secrets: RwLock::new(
                initial
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Get the number of secrets in the store
    pub fn len(&self) -> usize {
        self.secrets.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretStore for MemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.secrets.read().get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        self.secrets.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        self.secrets.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_crud() {
        let store = MemorySecretStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("test"), None);

        store.store("test", "value").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("test"), Some("value".to_string()));
        assert!(store.has("test"));

        store.store("test", "new_value").unwrap();
        assert_eq!(store.get("test"), Some("new_value".to_string()));

        store.delete("test").unwrap();
        assert_eq!(store.get("test"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_with_initial() {
        let store = MemorySecretStore::with_secrets([("key1", "value1"), ("key2", "")]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("key1"), Some("value1".to_string()));
        // empty values behave like missing ones
        assert_eq!(store.get("key2"), None);
    }

    #[test]
    fn test_get_first() {
        let store = MemorySecretStore::with_secrets([("GEMINI_API_KEY", "g-key")]);
        assert_eq!(
            store.get_first(&["GOOGLE_API_KEY", "GEMINI_API_KEY"]),
            Some("g-key".to_string())
        );
        assert_eq!(store.get_first(&["NOPE"]), None);
    }
}
