//! File-backed secret store
//!
//! Reads a single YAML (or JSON) document mapping secret ids to their
//! payloads. Payloads may be nested mappings or strings holding JSON.

use super::{document_text, SecretStore};
use crate::error::SecretError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Secret store loaded from a local file
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    secrets: HashMap<String, Value>,
}

impl FileSecretStore {
    /// Load and parse the whole file up front
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SecretError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| SecretError::Config(format!("cannot read {}: {e}", path.display())))?;

        let secrets = Self::parse(&content)
            .map_err(|detail| SecretError::Config(format!("{}: {detail}", path.display())))?;

        tracing::info!("Loaded {} secrets from {}", secrets.len(), path.display());

        Ok(Self { secrets })
    }

    /// Parse a document whose top level maps secret ids to payloads
    fn parse(content: &str) -> Result<HashMap<String, Value>, String> {
        // YAML is a superset of JSON, so one parser covers both formats
        let doc: Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        match doc {
            Value::Object(map) => Ok(map.into_iter().collect()),
            Value::Null => Ok(HashMap::new()),
            _ => Err("top level must be a mapping of secret id to value".to_string()),
        }
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_secret(&self, secret_id: &str) -> Result<String, SecretError> {
        self.secrets
            .get(secret_id)
            .map(document_text)
            .ok_or_else(|| SecretError::NotFound {
                name: secret_id.to_string(),
            })
    }

    fn store_type(&self) -> &'static str {
        "file"
    }
}
