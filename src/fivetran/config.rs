//! Provider settings
//!
//! Connection details for the Fivetran API, read once per run from the
//! global secret.

use crate::error::ProvisionError;
use crate::secrets::{self, SecretStore};
use serde::Deserialize;
use serde_json::Value;

/// Default secret id holding the provider settings
pub const DEFAULT_GLOBAL_SECRET: &str = "fivetran-global";

/// Fivetran API connection settings
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// `https`, or `http` for local mocks
    pub protocol: String,
    /// API host, e.g. `api.fivetran.com`
    #[serde(rename = "core_fivetran_url")]
    pub host: String,
    /// Path segment carrying the API version, e.g. `v1`
    pub api_version: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("api_version", &self.api_version)
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl ProviderConfig {
    /// Decode settings from the global secret document
    pub fn from_value(secret_id: &str, value: Value) -> Result<Self, ProvisionError> {
        let config: Self = serde_json::from_value(value).map_err(|e| ProvisionError::InvalidConfig {
            secret_id: secret_id.to_string(),
            detail: e.to_string(),
        })?;

        for (field, v) in [
            ("protocol", &config.protocol),
            ("core_fivetran_url", &config.host),
            ("api_version", &config.api_version),
            ("api_key", &config.api_key),
            ("api_secret", &config.api_secret),
        ] {
            if v.trim().is_empty() {
                return Err(ProvisionError::InvalidConfig {
                    secret_id: secret_id.to_string(),
                    detail: format!("`{field}` is empty"),
                });
            }
        }

        Ok(config)
    }

    /// Fetch and decode settings from a secret store
    pub async fn load<S>(store: &S, secret_id: &str) -> Result<Self, ProvisionError>
    where
        S: SecretStore + ?Sized,
    {
        let value = secrets::get_json(store, secret_id)
            .await
            .map_err(|source| ProvisionError::MissingConfig {
                secret_id: secret_id.to_string(),
                source,
            })?;
        Self::from_value(secret_id, value)
    }

    /// `{protocol}://{host}/{api_version}`
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}/{}",
            self.protocol,
            self.host.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }
}
