//! Payload Builder
//!
//! Turns a [`ResourceRequest`] into the JSON body of a creation call. Work is
//! split in two: [`resolve_inputs`] performs the lookups (parent group id,
//! configuration secrets) and returns an immutable [`ResolvedInputs`]; the
//! per-kind `build_*` functions are pure.

use super::kind::{Collection, ResourceKind};
use super::resolver::{self, PageSource};
use crate::error::{ProvisionError, ProvisionResult};
use crate::secrets::{self, SecretStore};
use serde_json::{json, Map, Value};

/// Defaults applied to every new connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorPolicy {
    pub paused: bool,
    pub is_historical_sync: bool,
    /// Minutes between syncs
    pub sync_frequency: u32,
    pub trust_certificates: bool,
    pub trust_fingerprints: bool,
    pub run_setup_tests: bool,
    pub schedule_type: &'static str,
    pub api_paste_format: &'static str,
}

/// Defaults applied to every new destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestinationPolicy {
    pub region: &'static str,
    pub time_zone_offset: &'static str,
    pub run_setup_tests: bool,
}

pub const CONNECTOR_POLICY: ConnectorPolicy = ConnectorPolicy {
    paused: true,
    is_historical_sync: false,
    sync_frequency: 60,
    trust_certificates: true,
    trust_fingerprints: true,
    run_setup_tests: true,
    schedule_type: "manual",
    api_paste_format: "python",
};

pub const DESTINATION_POLICY: DestinationPolicy = DestinationPolicy {
    region: "US",
    time_zone_offset: "-5",
    run_setup_tests: true,
};

/// Policy constants for all kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub connector: ConnectorPolicy,
    pub destination: DestinationPolicy,
}

impl Policy {
    pub const DEFAULT: Policy = Policy {
        connector: CONNECTOR_POLICY,
        destination: DESTINATION_POLICY,
    };
}

impl Default for Policy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One resource to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub kind: ResourceKind,
    /// Name of the group to create, or of the parent group for dependents
    pub group_name: String,
    /// Provider service type (`google_cloud_sqlserver`, `big_query`, ...)
    pub service: Option<String>,
    /// Secret id of the resource configuration
    pub config_secret: Option<String>,
    /// Secret id folded into a destination's configuration
    pub destination_secret: Option<String>,
}

impl ResourceRequest {
    pub fn warehouse(name: &str) -> Self {
        Self {
            kind: ResourceKind::Warehouse,
            group_name: name.to_string(),
            service: None,
            config_secret: None,
            destination_secret: None,
        }
    }

    pub fn connector(group_name: &str, service: &str, config_secret: &str) -> Self {
        Self {
            kind: ResourceKind::Connector,
            group_name: group_name.to_string(),
            service: Some(service.to_string()),
            config_secret: Some(config_secret.to_string()),
            destination_secret: None,
        }
    }

    pub fn destination(group_name: &str, service: &str, config_secret: &str) -> Self {
        Self {
            kind: ResourceKind::Destination,
            ..Self::connector(group_name, service, config_secret)
        }
    }

    pub fn with_destination_secret(mut self, secret_id: &str) -> Self {
        self.destination_secret = Some(secret_id.to_string());
        self
    }

    /// Field name of the group reference as reported in errors
    fn group_field(&self) -> &'static str {
        if self.kind.needs_group() {
            "group_name"
        } else {
            "name"
        }
    }
}

/// Everything looked up for one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedInputs {
    /// Parent group id (dependents only)
    pub group_id: Option<String>,
    /// Resource configuration, destination secret already folded in
    pub config: Map<String, Value>,
}

/// Collaborators needed to resolve a request's inputs
pub struct BuildContext<'a> {
    pub pages: &'a dyn PageSource,
    pub secrets: &'a dyn SecretStore,
    pub max_pages: usize,
}

/// Trimmed, non-empty value of a required field
fn required<'r>(kind: ResourceKind, field: &'static str, value: Option<&'r str>) -> ProvisionResult<&'r str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => {
            tracing::error!("Cannot create {} without {}", kind, field);
            Err(ProvisionError::MissingRequiredField { kind, field })
        }
    }
}

/// Check the scalar fields a request must carry before any lookup happens
pub fn check_required(request: &ResourceRequest) -> ProvisionResult<()> {
    required(request.kind, request.group_field(), Some(request.group_name.as_str()))?;
    if request.kind.needs_group() {
        required(request.kind, "service", request.service.as_deref())?;
        required(request.kind, "config_secret", request.config_secret.as_deref())?;
    }
    Ok(())
}

/// Fetch a secret that must hold a JSON object
async fn fetch_object(store: &dyn SecretStore, secret_id: &str) -> ProvisionResult<Map<String, Value>> {
    let value = secrets::get_json(store, secret_id)
        .await
        .map_err(|source| ProvisionError::MissingConfig {
            secret_id: secret_id.to_string(),
            source,
        })?;

    match value {
        Value::Object(map) if !map.is_empty() => Ok(map),
        Value::Object(_) => Err(ProvisionError::InvalidConfig {
            secret_id: secret_id.to_string(),
            detail: "configuration is empty".to_string(),
        }),
        _ => Err(ProvisionError::InvalidConfig {
            secret_id: secret_id.to_string(),
            detail: "configuration must be a JSON object".to_string(),
        }),
    }
}

/// Perform the lookups a request depends on
///
/// Dependents resolve their parent group against the provider every time, so
/// a group created earlier in the same run is found through the listing.
pub async fn resolve_inputs(request: &ResourceRequest, ctx: &BuildContext<'_>) -> ProvisionResult<ResolvedInputs> {
    check_required(request)?;

    if !request.kind.needs_group() {
        return Ok(ResolvedInputs::default());
    }

    let group_name = request.group_name.trim();
    let group_id = resolver::resolve(ctx.pages, Collection::Groups, group_name, ctx.max_pages).await?;

    let config_secret = required(request.kind, "config_secret", request.config_secret.as_deref())?;
    let mut config = fetch_object(ctx.secrets, config_secret).await?;

    if request.kind == ResourceKind::Destination {
        if let Some(secret_id) = request.destination_secret.as_deref().filter(|s| !s.trim().is_empty()) {
            let secret = fetch_object(ctx.secrets, secret_id.trim()).await?;
            tracing::debug!("Folding {} keys from '{}' into destination config", secret.len(), secret_id);
            config.extend(secret);
        }
    }

    Ok(ResolvedInputs {
        group_id: Some(group_id),
        config,
    })
}

fn group_id<'i>(kind: ResourceKind, inputs: &'i ResolvedInputs) -> ProvisionResult<&'i str> {
    required(kind, "group_id", inputs.group_id.as_deref())
}

/// `{"name": ...}`
pub fn build_warehouse(request: &ResourceRequest, _inputs: &ResolvedInputs, _policy: Policy) -> ProvisionResult<Value> {
    tracing::info!("Building payload for group request");

    let name = required(ResourceKind::Warehouse, "name", Some(request.group_name.as_str()))?;
    Ok(json!({ "name": name }))
}

pub fn build_connector(request: &ResourceRequest, inputs: &ResolvedInputs, policy: Policy) -> ProvisionResult<Value> {
    tracing::info!("Building payload for connector request");

    let kind = ResourceKind::Connector;
    let service = required(kind, "service", request.service.as_deref())?;
    let group_id = group_id(kind, inputs)?;
    let p = policy.connector;

    Ok(json!({
        "service": service,
        "group_id": group_id,
        "paused": p.paused,
        "is_historical_sync": p.is_historical_sync,
        "sync_frequency": p.sync_frequency,
        "trust_certificates": p.trust_certificates,
        "trust_fingerprints": p.trust_fingerprints,
        "run_setup_tests": p.run_setup_tests,
        "schedule_type": p.schedule_type,
        "api_paste_format": p.api_paste_format,
        "config": inputs.config,
    }))
}

pub fn build_destination(request: &ResourceRequest, inputs: &ResolvedInputs, policy: Policy) -> ProvisionResult<Value> {
    tracing::info!("Building payload for destination request");

    let kind = ResourceKind::Destination;
    let service = required(kind, "service", request.service.as_deref())?;
    let group_id = group_id(kind, inputs)?;
    let p = policy.destination;

    Ok(json!({
        "group_id": group_id,
        "service": service,
        "region": p.region,
        "time_zone_offset": p.time_zone_offset,
        "run_setup_tests": p.run_setup_tests,
        "config": inputs.config,
    }))
}
