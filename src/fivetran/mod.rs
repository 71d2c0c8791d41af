//! Fivetran API module
//!
//! - [`config`] - provider settings decoded from the global secret
//! - [`client`] - authenticated listing and creation calls

pub mod client;
pub mod config;

pub use client::{api_call_headers, BasicCredential, FivetranClient, PAGE_LIMIT};
pub use config::{ProviderConfig, DEFAULT_GLOBAL_SECRET};
