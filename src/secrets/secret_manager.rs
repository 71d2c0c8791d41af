//! Google Secret Manager store
//!
//! Always reads the `latest` version alias. The version listing is fetched
//! once per secret, only to report when it has several enabled versions.

use super::SecretStore;
use crate::error::SecretError;
use crate::gcp::client::GcpClient;
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Version alias resolved by Secret Manager to the newest enabled version
pub const LATEST_VERSION: &str = "latest";

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    name: String,
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListSecretVersionsResponse {
    #[serde(default)]
    versions: Vec<SecretVersion>,
}

#[derive(Debug, Deserialize)]
struct SecretVersion {
    name: String,
    #[serde(default)]
    state: String,
}

/// Secret store backed by Secret Manager
#[derive(Debug, Clone)]
pub struct SecretManagerStore {
    client: GcpClient,
    /// Secrets whose versions were already listed
    listed: Arc<Mutex<HashSet<String>>>,
}

impl SecretManagerStore {
    pub fn new(client: GcpClient) -> Self {
        Self {
            client,
            listed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// True the first time a secret is read through this store
    fn should_list(&self, secret_id: &str) -> bool {
        match self.listed.lock() {
            Ok(mut listed) => listed.insert(secret_id.to_string()),
            Err(_) => false,
        }
    }

    /// Count enabled versions; listing needs more than accessor permissions,
    /// so failures are only logged
    async fn log_versions(&self, secret_id: &str) {
        let url = self.client.secret_versions_url(secret_id);
        match self.client.get(&url).await {
            Ok(value) => {
                let listing: ListSecretVersionsResponse =
                    serde_json::from_value(value).unwrap_or_default();
                let enabled: Vec<&str> = listing
                    .versions
                    .iter()
                    .filter(|v| v.state.eq_ignore_ascii_case("ENABLED"))
                    .map(|v| v.name.as_str())
                    .collect();
                if enabled.len() > 1 {
                    tracing::info!(
                        "Secret '{}' has {} enabled versions, using the latest ({})",
                        secret_id,
                        enabled.len(),
                        enabled.first().copied().unwrap_or("-")
                    );
                }
            }
            Err(e) => {
                tracing::debug!("Could not list versions of '{}': {:#}", secret_id, e);
            }
        }
    }

    fn decode(secret_id: &str, response: AccessSecretVersionResponse) -> Result<String, SecretError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(response.payload.data.trim())
            .map_err(|e| SecretError::InvalidValue {
                name: secret_id.to_string(),
                detail: format!("payload is not valid base64: {e}"),
            })?;

        tracing::debug!("Read secret version {}", response.name);

        String::from_utf8(bytes).map_err(|e| SecretError::InvalidValue {
            name: secret_id.to_string(),
            detail: format!("payload is not valid UTF-8: {e}"),
        })
    }
}

#[async_trait]
impl SecretStore for SecretManagerStore {
    async fn get_secret(&self, secret_id: &str) -> Result<String, SecretError> {
        if self.should_list(secret_id) {
            self.log_versions(secret_id).await;
        }

        let url = self.client.secret_access_url(secret_id, LATEST_VERSION);
        let value = self.client.get(&url).await.map_err(|e| {
            let detail = format!("{e:#}");
            if detail.contains("404") {
                SecretError::NotFound {
                    name: secret_id.to_string(),
                }
            } else {
                SecretError::Unavailable {
                    store: "secret-manager",
                    detail,
                }
            }
        })?;

        let response: AccessSecretVersionResponse =
            serde_json::from_value(value).map_err(|e| SecretError::InvalidValue {
                name: secret_id.to_string(),
                detail: format!("unexpected access response: {e}"),
            })?;

        Self::decode(secret_id, response)
    }

    fn store_type(&self) -> &'static str {
        "secret-manager"
    }
}
