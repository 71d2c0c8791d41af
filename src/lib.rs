//! Provision Fivetran groups, connectors and destinations
//!
//! Provider settings and per-resource configuration are read from a secret
//! store; each resource goes through the same verify → build → authenticate →
//! execute → validate → persist pipeline.

pub mod config;
pub mod error;
pub mod fivetran;
pub mod gcp;
pub mod http;
pub mod resource;
pub mod secrets;
pub mod sink;

pub use error::{ProvisionError, ProvisionResult, SecretError, SinkError};
