//! HTTP utilities for REST API calls
//!
//! Shared by the Secret Manager client (bearer token) and the Fivetran
//! client (prebuilt header set with a basic credential).

use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// How a request is authenticated
#[derive(Clone, Copy)]
pub enum Auth<'a> {
    /// OAuth access token (GCP APIs)
    Bearer(&'a str),
    /// Complete header set, including `Authorization` (Fivetran API)
    Headers(&'a HeaderMap),
}

/// Response of a call whose body is inspected regardless of status
#[derive(Debug, Clone)]
pub struct JsonResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// HTTP client wrapper
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP client; every request is bounded by `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ftprov/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    fn authorize(request: RequestBuilder, auth: Auth<'_>) -> RequestBuilder {
        match auth {
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Headers(headers) => request.headers(headers.clone()),
        }
    }

    /// Make a GET request; non-2xx statuses are errors
    pub async fn get(&self, url: &str, auth: Auth<'_>) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let response = Self::authorize(self.client.get(url), auth)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(anyhow::anyhow!("API request failed: {}", status));
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }

    /// Make a POST request with a JSON body
    ///
    /// Error statuses are returned to the caller as long as the body is JSON,
    /// since the provider describes rejected creations in the body.
    pub async fn post_json(&self, url: &str, auth: Auth<'_>, body: &Value) -> Result<JsonResponse> {
        tracing::debug!("POST {}", url);

        let response = Self::authorize(self.client.post(url), auth)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            tracing::warn!("API error: {} - {}", status, sanitize_for_log(&response_body));
        }

        let body = serde_json::from_str(&response_body).with_context(|| {
            format!(
                "Failed to parse response JSON (status {}): {}",
                status,
                sanitize_for_log(&response_body)
            )
        })?;

        Ok(JsonResponse { status, body })
    }
}

/// Format an API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_api_error(error: &anyhow::Error) -> String {
    let error_str = format!("{error:#}");

    if error_str.contains("403") {
        return "Permission denied. Check the API key or IAM permissions.".to_string();
    }
    if error_str.contains("401") {
        return "Authentication failed. Check the API key/secret or run 'gcloud auth application-default login'.".to_string();
    }
    if error_str.contains("404") {
        return "Resource not found.".to_string();
    }
    if error_str.contains("429") {
        return "Rate limit exceeded. Please try again later.".to_string();
    }
    if error_str.contains("500") || error_str.contains("503") {
        return "Service temporarily unavailable. Please try again.".to_string();
    }
    if error_str.contains("operation timed out") || error_str.contains("timed out") {
        return "Request timed out.".to_string();
    }

    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let out = sanitize_for_log(&body);
        assert!(out.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(out.contains("500 bytes total"));
    }

    #[test]
    fn test_sanitize_strips_control_chars() {
        assert_eq!(sanitize_for_log("a\nb\tc d"), "abc d");
    }

    #[test]
    fn test_sanitize_respects_char_boundaries() {
        let body = "é".repeat(150);
        let out = sanitize_for_log(&body);
        assert!(out.contains("300 bytes total"));
    }

    #[test]
    fn test_format_api_error_maps_status_codes() {
        let err = anyhow::anyhow!("API request failed: 401 Unauthorized");
        assert!(format_api_error(&err).starts_with("Authentication failed"));

        let err = anyhow::anyhow!("API request failed: 404 Not Found");
        assert_eq!(format_api_error(&err), "Resource not found.");
    }
}
