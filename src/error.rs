//! Error types
//!
//! Typed failures for the provisioning pipeline and the secret store.
//! Transport code underneath keeps using `anyhow` and is converted at the
//! pipeline boundary.

use crate::resource::{Collection, ResourceKind};
use thiserror::Error;

/// Errors raised while fetching secrets
#[derive(Debug, Error)]
pub enum SecretError {
    /// Secret (or the requested version) does not exist
    #[error("secret not found: '{name}'")]
    NotFound { name: String },

    /// Store could not be reached or refused the request
    #[error("secret store '{store}' unavailable: {detail}")]
    Unavailable { store: &'static str, detail: String },

    /// Secret exists but its payload is unusable
    #[error("invalid value for secret '{name}': {detail}")]
    InvalidValue { name: String, detail: String },

    /// Store is misconfigured (missing project, unreadable file)
    #[error("secret store configuration error: {0}")]
    Config(String),
}

/// Errors raised by the result sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write to {location}: {source}")]
    Write {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised while building or creating a resource
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("cannot create {kind} without `{field}`")]
    MissingRequiredField {
        kind: ResourceKind,
        field: &'static str,
    },

    #[error("no {collection} named '{name}' found after scanning {pages} page(s)")]
    UnresolvedDependency {
        collection: Collection,
        name: String,
        pages: usize,
    },

    #[error("gave up looking for {collection} '{name}' after {pages} page(s)")]
    PaginationLimit {
        collection: Collection,
        name: String,
        pages: usize,
    },

    #[error("configuration secret '{secret_id}' unavailable: {source}")]
    MissingConfig {
        secret_id: String,
        #[source]
        source: SecretError,
    },

    #[error("configuration secret '{secret_id}' is invalid: {detail}")]
    InvalidConfig { secret_id: String, detail: String },

    #[error("{operation} failed: {detail}")]
    ProviderRequestFailed { operation: String, detail: String },

    #[error("{kind} response rejected: {reason}")]
    ValidationFailed { kind: ResourceKind, reason: String },
}

impl ProvisionError {
    /// Wrap a transport error from the HTTP layer
    pub fn request(operation: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::ProviderRequestFailed {
            operation: operation.into(),
            detail: format!("{err:#}"),
        }
    }

    /// Whether this error must stop the remaining steps of a batch
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ValidationFailed { .. })
    }
}

pub type ProvisionResult<T> = std::result::Result<T, ProvisionError>;
