//! GCP Client
//!
//! Authenticated client for the Secret Manager REST API.

use super::auth::TokenSource;
use crate::http::{Auth, HttpClient};
use anyhow::Result;
use serde_json::Value;

/// Public Secret Manager endpoint
pub const SECRET_MANAGER_BASE_URL: &str = "https://secretmanager.googleapis.com/v1";

/// Main GCP client
#[derive(Clone, Debug)]
pub struct GcpClient {
    pub tokens: TokenSource,
    pub http: HttpClient,
    pub project_id: String,
    base_url: String,
}

impl GcpClient {
    /// Create a client for `project_id` against the public endpoint
    pub fn new(project_id: &str, tokens: TokenSource, http: HttpClient) -> Self {
        Self::with_base_url(project_id, tokens, http, SECRET_MANAGER_BASE_URL)
    }

    /// Create a client against a custom endpoint (emulators, tests)
    pub fn with_base_url(project_id: &str, tokens: TokenSource, http: HttpClient, base_url: &str) -> Self {
        Self {
            tokens,
            http,
            project_id: project_id.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.tokens.get_token().await?;
        self.http.get(url, Auth::Bearer(&token)).await
    }

    // =========================================================================
    // Secret Manager API helpers
    // =========================================================================

    /// Build Secret Manager API URL
    pub fn secretmanager_url(&self, path: &str) -> String {
        format!("{}/projects/{}/{}", self.base_url, self.project_id, path)
    }

    /// URL listing the versions of a secret
    pub fn secret_versions_url(&self, secret_id: &str) -> String {
        self.secretmanager_url(&format!(
            "secrets/{}/versions",
            urlencoding::encode(secret_id)
        ))
    }

    /// URL accessing the payload of one secret version (`latest` or a number)
    pub fn secret_access_url(&self, secret_id: &str, version: &str) -> String {
        self.secretmanager_url(&format!(
            "secrets/{}/versions/{}:access",
            urlencoding::encode(secret_id),
            urlencoding::encode(version)
        ))
    }
}
