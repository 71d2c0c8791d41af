//! Fivetran Client
//!
//! Builds authenticated requests against the Fivetran REST API.

use super::config::ProviderConfig;
use crate::http::{Auth, HttpClient, JsonResponse};
use anyhow::{Context, Result};
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use url::Url;

/// Page size requested from listing endpoints
pub const PAGE_LIMIT: usize = 100;

/// Headers sent with every call: a raw-key `Authorization` plus JSON content type
pub fn api_call_headers(api_key: &str) -> Result<HeaderMap> {
    tracing::debug!("Building API headers");

    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Basic {}", api_key))
        .context("API key contains characters not allowed in a header")?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// HTTP Basic credential derived from the API key/secret pair
#[derive(Clone)]
pub struct BasicCredential {
    key: String,
    secret: String,
}

impl BasicCredential {
    pub fn new(key: &str, secret: &str) -> Self {
        Self {
            key: key.to_string(),
            secret: secret.to_string(),
        }
    }

    /// `Basic base64(key:secret)`
    pub fn header_value(&self) -> Result<HeaderValue> {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.key, self.secret));
        let mut value = HeaderValue::from_str(&format!("Basic {}", encoded))
            .context("Invalid basic credential")?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Apply the credential; it takes precedence over any `Authorization`
    /// header already present
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(AUTHORIZATION, self.header_value()?);
        Ok(())
    }
}

/// Client for the Fivetran REST API
#[derive(Clone, Debug)]
pub struct FivetranClient {
    pub config: ProviderConfig,
    pub http: HttpClient,
}

impl FivetranClient {
    pub fn new(config: ProviderConfig, http: HttpClient) -> Self {
        Self { config, http }
    }

    /// Build the header set for one call
    pub fn authenticate(&self) -> Result<HeaderMap> {
        tracing::debug!("Authenticating API request");

        let mut headers = api_call_headers(&self.config.api_key)?;
        BasicCredential::new(&self.config.api_key, &self.config.api_secret).apply(&mut headers)?;
        Ok(headers)
    }

    /// `{base}/{route}`
    pub fn route_url(&self, route: &str) -> String {
        format!("{}/{}", self.config.base_url(), route)
    }

    /// Listing URL for one page; the cursor is omitted on the first page
    pub fn listing_url(&self, route: &str, cursor: Option<&str>) -> Result<String> {
        let mut url = Url::parse(&self.route_url(route))
            .with_context(|| format!("Invalid provider URL for {}", route))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
                query.append_pair("cursor", cursor);
            }
            query.append_pair("limit", &PAGE_LIMIT.to_string());
        }
        Ok(url.into())
    }

    /// Fetch one page of a collection
    pub async fn list_page(&self, route: &str, cursor: Option<&str>) -> Result<Value> {
        let url = self.listing_url(route, cursor)?;
        let headers = self.authenticate()?;
        self.http.get(&url, Auth::Headers(&headers)).await
    }

    /// Create a resource under `route`
    pub async fn create(&self, route: &str, payload: &Value) -> Result<JsonResponse> {
        tracing::info!("Making create call to {}", route);

        let url = self.route_url(route);
        let headers = self.authenticate()?;
        self.http.post_json(&url, Auth::Headers(&headers), payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FivetranClient {
        FivetranClient::new(
            ProviderConfig {
                protocol: "https".to_string(),
                host: "api.fivetran.com".to_string(),
                api_version: "v1".to_string(),
                api_key: "key".to_string(),
                api_secret: "secret".to_string(),
            },
            HttpClient::new().unwrap(),
        )
    }

    #[test]
    fn test_api_call_headers() {
        let headers = api_call_headers("abc").unwrap();
        assert_eq!(headers[AUTHORIZATION], "Basic abc");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_credential_replaces_raw_key_header() {
        let headers = client().authenticate().unwrap();
        // base64("key:secret")
        assert_eq!(headers[AUTHORIZATION], "Basic a2V5OnNlY3JldA==");
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_listing_url_first_page_has_no_cursor() {
        let url = client().listing_url("groups", None).unwrap();
        assert_eq!(url, "https://api.fivetran.com/v1/groups?limit=100");
    }

    #[test]
    fn test_listing_url_encodes_cursor() {
        let url = client().listing_url("connectors", Some("eyJ a+b")).unwrap();
        assert_eq!(url, "https://api.fivetran.com/v1/connectors?cursor=eyJ+a%2Bb&limit=100");
    }
}
