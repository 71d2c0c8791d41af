//! GCP Authentication
//!
//! Access tokens for Secret Manager, either from Application Default
//! Credentials (cached until shortly before expiry) or from a token supplied
//! by the caller.

use anyhow::{Context, Result};
use gcp_auth::TokenProvider;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default scopes for GCP API access
pub const DEFAULT_SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// Environment variable holding a ready-made access token
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Token TTL used when the provider does not tell us (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Token cached together with its (buffered) expiry
#[derive(Clone)]
pub struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Where access tokens come from
#[derive(Clone)]
pub enum TokenSource {
    /// Application Default Credentials with a token cache
    Adc {
        provider: Arc<dyn TokenProvider>,
        cache: Arc<RwLock<Option<CachedToken>>>,
    },
    /// Token handed in by the caller (`--access-token`, env, tests)
    Static(String),
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Adc { .. } => f.write_str("TokenSource::Adc"),
            Self::Static(_) => f.write_str("TokenSource::Static([REDACTED])"),
        }
    }
}

impl TokenSource {
    /// Use Application Default Credentials
    pub async fn adc() -> Result<Self> {
        let provider = gcp_auth::provider().await.context(
            "Failed to initialize GCP authentication. Run 'gcloud auth application-default login'",
        )?;

        Ok(Self::Adc {
            provider,
            cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Use a fixed token
    pub fn fixed(token: impl Into<String>) -> Self {
        Self::Static(token.into())
    }

    /// Explicit token, then `GOOGLE_OAUTH_ACCESS_TOKEN`, then ADC
    pub async fn discover(explicit: Option<&str>) -> Result<Self> {
        if let Some(token) = explicit.filter(|t| !t.is_empty()) {
            return Ok(Self::fixed(token));
        }
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                return Ok(Self::fixed(token));
            }
        }
        Self::adc().await
    }

    /// Get an access token for API calls
    pub async fn get_token(&self) -> Result<String> {
        let (provider, cache) = match self {
            Self::Static(token) => return Ok(token.clone()),
            Self::Adc { provider, cache } => (provider, cache),
        };

        {
            let cached = cache.read().await;
            if let Some(cached) = cached.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let token = provider
            .token(DEFAULT_SCOPES)
            .await
            .context("Failed to get access token")?;
        let token_str = token.as_str().to_string();

        {
            let mut cached = cache.write().await;
            *cached = Some(CachedToken {
                token: token_str.clone(),
                expires_at: Instant::now() + DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER,
            });
        }

        Ok(token_str)
    }
}

/// Get the gcloud configuration directory
pub fn get_gcloud_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CLOUDSDK_CONFIG") {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir().map(|p| p.join("gcloud"))
}

/// Validate a GCP project ID format
/// Project IDs are 6-30 characters of lowercase letters, digits and hyphens,
/// start with a letter and do not end with a hyphen. Numeric project numbers
/// are accepted as well.
pub fn validate_project_id(project: &str) -> bool {
    if !project.is_empty() && project.len() <= 30 && project.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    if project.len() < 6 || project.len() > 30 {
        return false;
    }

    match project.chars().next() {
        Some(c) if c.is_ascii_lowercase() => {},
        _ => return false,
    }

    if project.ends_with('-') {
        return false;
    }

    project.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Read the `project` key of an INI-style gcloud file, optionally inside `[core]`
fn project_from_ini(content: &str, core_only: bool) -> Option<String> {
    let mut in_core_section = !core_only;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line == "[core]" {
            in_core_section = true;
        } else if line.starts_with('[') {
            in_core_section = !core_only;
        } else if in_core_section && line.starts_with("project") && line.contains('=') {
            if let Some(value) = line.split('=').nth(1) {
                let project = value.trim().to_string();
                if validate_project_id(&project) {
                    return Some(project);
                }
            }
        }
    }
    None
}

/// Read the default project from the environment or gcloud configuration
pub fn get_default_project() -> Option<String> {
    for var in ["CLOUDSDK_CORE_PROJECT", "GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"] {
        if let Ok(project) = std::env::var(var) {
            if validate_project_id(&project) {
                return Some(project);
            }
            tracing::warn!("Invalid project ID format in {}", var);
        }
    }

    let config_dir = get_gcloud_config_dir()?;

    if let Ok(content) = std::fs::read_to_string(config_dir.join("properties")) {
        if let Some(project) = project_from_ini(&content, false) {
            return Some(project);
        }
    }

    let active_config = std::fs::read_to_string(config_dir.join("active_config")).ok()?;
    let config_name = active_config.trim();

    // Security: Validate config name to prevent path traversal
    if !config_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        tracing::warn!("Invalid characters in active_config name");
        return None;
    }

    let config_path = config_dir
        .join("configurations")
        .join(format!("config_{}", config_name));

    let content = std::fs::read_to_string(config_path).ok()?;
    project_from_ini(&content, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_project_id() {
        assert!(validate_project_id("my-data-project"));
        assert!(validate_project_id("759965731268"));
        assert!(!validate_project_id("short"));
        assert!(!validate_project_id("Upper-Case-Project"));
        assert!(!validate_project_id("trailing-hyphen-"));
        assert!(!validate_project_id("1starts-with-digit"));
    }

    #[test]
    fn test_project_from_core_section_only() {
        let content = "[compute]\nproject = wrong-project\n[core]\n# comment\nproject = right-project\n";
        assert_eq!(project_from_ini(content, true).as_deref(), Some("right-project"));
    }

    #[test]
    fn test_static_token_is_returned_verbatim() {
        let source = TokenSource::fixed("abc123");
        let token = tokio_test::block_on(source.get_token()).unwrap();
        assert_eq!(token, "abc123");
        assert_eq!(format!("{source:?}"), "TokenSource::Static([REDACTED])");
    }
}
