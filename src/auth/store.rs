use crate::config::Config;
use std::collections::HashMap;
use std::sync::RwLock;

/// Key under which the generative-service credential is stored.
pub const API_KEY: &str = "apiKey";

/// Read-only view of the externally owned credential store.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Credential resolved from config and environment overrides.
pub struct ConfigCredentialStore {
    api_key: Option<String>,
}

impl ConfigCredentialStore {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.api_key.clone(),
        }
    }
}

impl CredentialStore for ConfigCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        if key == API_KEY {
            self.api_key.clone()
        } else {
            None
        }
    }
}

/// In-memory store, handy for embedding and tests.
#[derive(Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        let store = Self::default();
        store.set(API_KEY, api_key);
        store
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value.into());
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_store_exposes_only_api_key() {
        let config = Config {
            api_key: Some("secret".into()),
            ..Config::default()
        };
        let store = ConfigCredentialStore::new(&config);
        assert_eq!(store.get(API_KEY).as_deref(), Some("secret"));
        assert_eq!(store.get("other"), None);
    }

    #[test]
    fn memory_store_reads_back_values() {
        let store = MemoryCredentialStore::with_api_key("k1");
        assert_eq!(store.get(API_KEY).as_deref(), Some("k1"));
        store.set(API_KEY, "k2");
        assert_eq!(store.get(API_KEY).as_deref(), Some("k2"));
        assert_eq!(store.get("missing"), None);
    }
}
