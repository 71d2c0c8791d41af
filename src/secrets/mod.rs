//! Secret stores
//!
//! Provider settings and per-resource configuration are JSON documents kept
//! in a secret store and addressed by a logical secret id
//! (`fivetran-global`, `fivetran-src-conn`, ...).
//!
//! - [`secret_manager`] - Google Secret Manager (production)
//! - [`file`] - YAML/JSON file mapping secret id to document (offline runs)
//! - [`StaticSecretStore`] - in-memory map

pub mod file;
pub mod secret_manager;

use crate::error::SecretError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

pub use file::FileSecretStore;
pub use secret_manager::SecretManagerStore;

/// Keyed lookup of secret payloads
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Return the current payload of `secret_id` as text
    async fn get_secret(&self, secret_id: &str) -> Result<String, SecretError>;

    /// Store type name for logging
    fn store_type(&self) -> &'static str;
}

/// Fetch a secret and decode it as JSON
pub async fn get_json<S>(store: &S, secret_id: &str) -> Result<Value, SecretError>
where
    S: SecretStore + ?Sized,
{
    tracing::info!("Fetching configuration '{}' from {}", secret_id, store.store_type());

    let raw = store.get_secret(secret_id).await?;
    serde_json::from_str(&raw).map_err(|e| SecretError::InvalidValue {
        name: secret_id.to_string(),
        detail: format!("not valid JSON: {e}"),
    })
}

/// In-memory secret store
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, Value>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret; returns self for chaining
    pub fn with(mut self, secret_id: &str, value: Value) -> Self {
        self.insert(secret_id, value);
        self
    }

    pub fn insert(&mut self, secret_id: &str, value: Value) {
        self.secrets.insert(secret_id.to_string(), value);
    }
}

/// Text form of a stored document: strings are returned verbatim, anything
/// else is serialized as JSON
pub(crate) fn document_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_secret(&self, secret_id: &str) -> Result<String, SecretError> {
        self.secrets
            .get(secret_id)
            .map(document_text)
            .ok_or_else(|| SecretError::NotFound {
                name: secret_id.to_string(),
            })
    }

    fn store_type(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_json_decodes_objects() {
        let store = StaticSecretStore::new().with("fivetran-src-conn", json!({"host": "10.0.0.4", "port": 1433}));
        let value = get_json(&store, "fivetran-src-conn").await.unwrap();
        assert_eq!(value["port"], 1433);
    }

    #[tokio::test]
    async fn test_get_json_decodes_string_payloads() {
        let store = StaticSecretStore::new().with("raw", json!("{\"a\": true}"));
        let value = get_json(&store, "raw").await.unwrap();
        assert_eq!(value["a"], true);
    }

    #[tokio::test]
    async fn test_get_json_rejects_non_json() {
        let store = StaticSecretStore::new().with("raw", json!("not json"));
        let err = get_json(&store, "raw").await.unwrap_err();
        assert!(matches!(err, SecretError::InvalidValue { .. }));
    }

    #[tokio::test]
    async fn test_missing_secret_is_not_found() {
        let store = StaticSecretStore::new();
        let err = store.get_secret("nope").await.unwrap_err();
        assert!(matches!(err, SecretError::NotFound { name } if name == "nope"));
    }
}
