//! Resource provisioning
//!
//! The creation workflow for Fivetran groups, connectors and destinations.
//!
//! # Architecture
//!
//! - [`kind`] - resource kinds, searchable collections, CLI targets
//! - [`validator`] - per-kind success predicates over creation responses
//! - [`resolver`] - cursor-paginated name → id lookup
//! - [`payload`] - request bodies, policy constants, dependency lookups
//! - [`pipeline`] - dispatch table, single creation and batch driver
//!
//! # Example
//!
//! ```ignore
//! use ftprov::resource::{Provisioner, ResourceRequest};
//!
//! async fn create(p: &Provisioner<'_>) -> anyhow::Result<()> {
//!     let request = ResourceRequest::connector("warehouse_11", "google_cloud_sqlserver", "fivetran-src-conn");
//!     let outcome = p.provision(&request).await?;
//!     println!("created: {}", outcome.is_success());
//!     Ok(())
//! }
//! ```

pub mod kind;
pub mod payload;
pub mod pipeline;
pub mod resolver;
pub mod validator;

pub use kind::{Collection, ResourceKind, Target};
pub use payload::{Policy, ResolvedInputs, ResourceRequest};
pub use pipeline::{BatchReport, CreationOutcome, Provisioner, StepReport, StepStatus};
pub use resolver::{resolve, PageScan, PageSource, DEFAULT_MAX_PAGES};
pub use validator::{failure_reason, validate};
