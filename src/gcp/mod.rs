//! GCP API interaction module
//!
//! Authentication and a thin client for Google Secret Manager, where the
//! Fivetran provider settings and per-resource configuration live.
//!
//! # Module Structure
//!
//! - [`auth`] - access tokens (ADC or caller-supplied) and default project discovery
//! - [`client`] - Secret Manager client and URL helpers
//!
//! # Example
//!
//! ```ignore
//! use ftprov::gcp::{auth::TokenSource, client::GcpClient};
//! use ftprov::http::HttpClient;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let tokens = TokenSource::discover(None).await?;
//!     let client = GcpClient::new("my-project", tokens, HttpClient::new()?);
//!     let versions = client.get(&client.secret_versions_url("fivetran-global")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
