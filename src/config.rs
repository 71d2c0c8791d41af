//! Configuration Management
//!
//! Persistent settings for ftprov, stored as JSON under the user config dir.

use crate::fivetran::DEFAULT_GLOBAL_SECRET;
use crate::resource::DEFAULT_MAX_PAGES;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default file receiving successful creation responses
pub const DEFAULT_OUTPUT_FILE: &str = "connector_info.txt";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// GCP project holding the secrets
    #[serde(default)]
    pub project_id: Option<String>,
    /// Secret with the Fivetran API settings
    #[serde(default)]
    pub global_secret_id: Option<String>,
    /// File receiving successful responses
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// Page cap for name lookups
    #[serde(default)]
    pub max_pages: Option<usize>,
    /// Per-request timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Directory holding the config and log files
    pub fn app_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ftprov"))
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::app_dir().map(|p| p.join("config.json"))
    }

    /// Load configuration from disk; missing or unreadable files give defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn parse(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config file: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Get effective project (config > gcloud default); CLI flags are applied by the caller
    pub fn effective_project(&self) -> String {
        self.project_id
            .clone()
            .or_else(crate::gcp::auth::get_default_project)
            .unwrap_or_default()
    }

    pub fn effective_global_secret(&self) -> String {
        self.global_secret_id
            .clone()
            .unwrap_or_else(|| DEFAULT_GLOBAL_SECRET.to_string())
    }

    pub fn effective_output(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE))
    }

    pub fn effective_max_pages(&self) -> usize {
        self.max_pages.filter(|n| *n > 0).unwrap_or(DEFAULT_MAX_PAGES)
    }

    pub fn effective_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.filter(|n| *n > 0).unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}
