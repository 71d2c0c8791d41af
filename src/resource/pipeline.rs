//! Creation Pipeline
//!
//! Runs verify → authenticate → execute → validate → persist for one
//! resource, and drives batches in dependency order.

use super::kind::ResourceKind;
use super::payload::{self, BuildContext, Policy, ResolvedInputs, ResourceRequest};
use super::resolver::DEFAULT_MAX_PAGES;
use super::validator;
use crate::error::{ProvisionError, ProvisionResult};
use crate::fivetran::FivetranClient;
use crate::secrets::SecretStore;
use crate::sink::ResultSink;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

type BuildFn = fn(&ResourceRequest, &ResolvedInputs, Policy) -> ProvisionResult<Value>;
type ValidateFn = fn(&Value) -> bool;
type VerifyFn = fn(&Value) -> ProvisionResult<()>;

/// Per-kind behavior of the pipeline
pub struct KindHandler {
    pub kind: ResourceKind,
    pub route: &'static str,
    pub verify: VerifyFn,
    pub build: BuildFn,
    pub validate: ValidateFn,
}

static HANDLERS: [KindHandler; 3] = [
    KindHandler {
        kind: ResourceKind::Warehouse,
        route: "groups",
        verify: verify_warehouse,
        build: payload::build_warehouse,
        validate: validator::validate_warehouse,
    },
    KindHandler {
        kind: ResourceKind::Connector,
        route: "connectors",
        verify: verify_connector,
        build: payload::build_connector,
        validate: validator::validate_connector,
    },
    KindHandler {
        kind: ResourceKind::Destination,
        route: "destinations",
        verify: verify_destination,
        build: payload::build_destination,
        validate: validator::validate_destination,
    },
];

/// Dispatch table lookup
pub fn handler(kind: ResourceKind) -> &'static KindHandler {
    match kind {
        ResourceKind::Warehouse => &HANDLERS[0],
        ResourceKind::Connector => &HANDLERS[1],
        ResourceKind::Destination => &HANDLERS[2],
    }
}

fn payload_str<'p>(payload: &'p Value, field: &str) -> Option<&'p str> {
    payload
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}

fn verify_fields(kind: ResourceKind, payload: &Value, fields: &[&'static str]) -> ProvisionResult<()> {
    if !payload.is_object() {
        return Err(ProvisionError::MissingRequiredField { kind, field: "payload" });
    }
    for &field in fields {
        if payload_str(payload, field).is_none() {
            return Err(ProvisionError::MissingRequiredField { kind, field });
        }
    }
    Ok(())
}

fn verify_warehouse(payload: &Value) -> ProvisionResult<()> {
    verify_fields(ResourceKind::Warehouse, payload, &["name"])
}

fn verify_connector(payload: &Value) -> ProvisionResult<()> {
    verify_fields(ResourceKind::Connector, payload, &["service", "group_id"])
}

fn verify_destination(payload: &Value) -> ProvisionResult<()> {
    verify_fields(ResourceKind::Destination, payload, &["service", "group_id"])
}

/// Result of a creation call the provider answered
#[derive(Debug, Clone)]
pub enum CreationOutcome {
    /// Accepted; `persisted` carries the sink error text if storing failed
    Created {
        response: Value,
        persisted: Result<(), String>,
    },
    /// The response did not pass validation
    Rejected { response: Value, reason: String },
}

impl CreationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Created { .. })
    }

    pub fn response(&self) -> &Value {
        match self {
            Self::Created { response, .. } | Self::Rejected { response, .. } => response,
        }
    }
}

/// Status of one batch step
#[derive(Debug)]
pub enum StepStatus {
    Created { persisted: Result<(), String> },
    Rejected(ProvisionError),
    Failed(ProvisionError),
    /// Not attempted because an earlier step failed
    Skipped,
}

#[derive(Debug)]
pub struct StepReport {
    pub kind: ResourceKind,
    pub name: String,
    pub status: StepStatus,
}

impl StepReport {
    pub fn is_success(&self) -> bool {
        matches!(self.status, StepStatus::Created { .. })
    }

    /// One-line summary for the terminal
    pub fn summary(&self) -> String {
        match &self.status {
            StepStatus::Created { persisted: Ok(()) } => format!("{} creation successful", self.kind),
            StepStatus::Created { persisted: Err(e) } => {
                format!("{} creation successful (response not stored: {})", self.kind, e)
            }
            StepStatus::Rejected(e) | StepStatus::Failed(e) => {
                format!("Error in {} creation: {}", self.kind, e)
            }
            StepStatus::Skipped => format!("{} creation skipped", self.kind),
        }
    }
}

/// Outcome of a batch run
#[derive(Debug)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.steps.iter().all(StepReport::is_success)
    }

    /// First error that stopped the batch
    pub fn fatal_error(&self) -> Option<&ProvisionError> {
        self.steps.iter().find_map(|s| match &s.status {
            StepStatus::Failed(e) => Some(e),
            _ => None,
        })
    }
}

/// Creates resources against the provider
pub struct Provisioner<'a> {
    client: &'a FivetranClient,
    secrets: &'a dyn SecretStore,
    sink: &'a dyn ResultSink,
    policy: Policy,
    max_pages: usize,
}

impl<'a> Provisioner<'a> {
    pub fn new(client: &'a FivetranClient, secrets: &'a dyn SecretStore, sink: &'a dyn ResultSink) -> Self {
        Self {
            client,
            secrets,
            sink,
            policy: Policy::DEFAULT,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve a request's inputs and build its payload
    pub async fn build_payload(&self, request: &ResourceRequest) -> ProvisionResult<Value> {
        let ctx = BuildContext {
            pages: self.client,
            secrets: self.secrets,
            max_pages: self.max_pages,
        };
        let inputs = payload::resolve_inputs(request, &ctx).await?;
        (handler(request.kind).build)(request, &inputs, self.policy)
    }

    /// Create one resource from a built payload
    ///
    /// Transport failures are errors; a response failing validation is a
    /// `Rejected` outcome, and a sink failure is recorded without failing.
    pub async fn create_resource(&self, kind: ResourceKind, payload: &Value) -> ProvisionResult<CreationOutcome> {
        let handler = handler(kind);
        (handler.verify)(payload)?;

        let response = self
            .client
            .create(handler.route, payload)
            .await
            .map_err(|e| ProvisionError::request(format!("POST {}", handler.route), &e))?;

        tracing::info!("Validating {} response (HTTP {})", kind, response.status);
        let body = response.body;

        if !(handler.validate)(&body) {
            let reason = validator::failure_reason(&body);
            tracing::error!(
                "Response validation failure: {} creation status {} {}",
                kind,
                body.get("code").and_then(|v| v.as_str()).unwrap_or("<missing>"),
                reason
            );
            return Ok(CreationOutcome::Rejected { response: body, reason });
        }

        let persisted = self.sink.persist(&body).map_err(|e| {
            tracing::error!("Error writing {} response to {}: {}", kind, self.sink.location(), e);
            e.to_string()
        });

        Ok(CreationOutcome::Created {
            response: body,
            persisted,
        })
    }

    /// Build and create one resource
    pub async fn provision(&self, request: &ResourceRequest) -> ProvisionResult<CreationOutcome> {
        let payload = self.build_payload(request).await?;
        self.create_resource(request.kind, &payload).await
    }

    /// Provision `requests` in dependency order
    ///
    /// A hard error skips the remaining steps; a rejected response does not.
    /// Nothing already created is rolled back.
    pub async fn run(&self, mut requests: Vec<ResourceRequest>) -> BatchReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        requests.sort_by_key(|r| r.kind);

        let span = tracing::info_span!("batch", %run_id);
        let steps = async {
            tracing::info!("Provisioning {} resource(s)", requests.len());

            let mut steps = Vec::with_capacity(requests.len());
            let mut aborted = false;

            for request in &requests {
                let status = if aborted {
                    StepStatus::Skipped
                } else {
                    match self.provision(request).await {
                        Ok(CreationOutcome::Created { persisted, .. }) => StepStatus::Created { persisted },
                        Ok(CreationOutcome::Rejected { reason, .. }) => {
                            StepStatus::Rejected(ProvisionError::ValidationFailed {
                                kind: request.kind,
                                reason,
                            })
                        }
                        Err(e) => {
                            aborted = e.is_fatal();
                            if aborted {
                                tracing::error!("{} step failed, skipping remaining steps: {}", request.kind, e);
                            }
                            StepStatus::Failed(e)
                        }
                    }
                };

                let step = StepReport {
                    kind: request.kind,
                    name: request.group_name.clone(),
                    status,
                };
                tracing::info!("{}", step.summary());
                steps.push(step);
            }
            steps
        }
        .instrument(span)
        .await;

        BatchReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            steps,
        }
    }
}
