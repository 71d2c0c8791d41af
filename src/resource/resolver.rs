//! Name Resolver
//!
//! Translates a resource name into the provider's identifier by walking a
//! cursor-paginated listing until the name turns up or the list runs out.

use super::kind::Collection;
use super::validator::SUCCESS;
use crate::error::{ProvisionError, ProvisionResult};
use crate::fivetran::FivetranClient;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Upper bound on pages fetched for one lookup
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Source of listing pages
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page of `route`; `None` requests the first page
    async fn fetch_page(&self, route: &str, cursor: Option<&str>) -> Result<Value>;
}

#[async_trait]
impl PageSource for FivetranClient {
    async fn fetch_page(&self, route: &str, cursor: Option<&str>) -> Result<Value> {
        self.list_page(route, cursor).await
    }
}

/// Result of scanning one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageScan {
    /// Matching item found; carries its id
    Found(String),
    /// No match on this page; more pages follow
    NextCursor(String),
    /// No match and no further pages
    Exhausted,
}

/// Scan one listing page for an item whose match field equals `name`
/// (case-insensitive)
pub fn scan_page(collection: Collection, name: &str, page: &Value) -> ProvisionResult<PageScan> {
    let code_ok = page
        .get("code")
        .and_then(|v| v.as_str())
        .map(|c| c.eq_ignore_ascii_case(SUCCESS))
        .unwrap_or(false);

    if !code_ok {
        return Err(ProvisionError::ProviderRequestFailed {
            operation: format!("GET {}", collection.route()),
            detail: format!(
                "listing returned code {}: {}",
                page.get("code").and_then(|v| v.as_str()).unwrap_or("<missing>"),
                page.get("message").and_then(|v| v.as_str()).unwrap_or("")
            ),
        });
    }

    let wanted = name.to_lowercase();
    let field = collection.match_field();
    let items = page
        .pointer("/data/items")
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    for item in items {
        let matches = item
            .get(field)
            .and_then(|v| v.as_str())
            .map(|v| v.to_lowercase() == wanted)
            .unwrap_or(false);
        if !matches {
            continue;
        }
        match item.get("id").and_then(|v| v.as_str()) {
            Some(id) if !id.is_empty() => return Ok(PageScan::Found(id.to_string())),
            _ => tracing::warn!("{} '{}' matched but has no id, skipping", collection, name),
        }
    }

    Ok(page
        .pointer("/data/next_cursor")
        .and_then(|v| v.as_str())
        .filter(|c| !c.is_empty())
        .map(|c| PageScan::NextCursor(c.to_string()))
        .unwrap_or(PageScan::Exhausted))
}

/// Resolve `name` to an id within `collection`
///
/// Stops on the first match, when the listing is exhausted, when the provider
/// hands back the cursor it was just given, or after `max_pages` fetches.
pub async fn resolve(
    source: &dyn PageSource,
    collection: Collection,
    name: &str,
    max_pages: usize,
) -> ProvisionResult<String> {
    let max_pages = max_pages.max(1);
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    tracing::info!("Resolving {} '{}'", collection, name);

    loop {
        if pages >= max_pages {
            tracing::error!("Stopped resolving {} '{}' after {} pages", collection, name, pages);
            return Err(ProvisionError::PaginationLimit {
                collection,
                name: name.to_string(),
                pages,
            });
        }

        let page = source
            .fetch_page(collection.route(), cursor.as_deref())
            .await
            .map_err(|e| ProvisionError::request(format!("GET {}", collection.route()), &e))?;
        pages += 1;

        match scan_page(collection, name, &page)? {
            PageScan::Found(id) => {
                tracing::info!("Resolved {} '{}' to {} on page {}", collection, name, id, pages);
                return Ok(id);
            }
            PageScan::NextCursor(next) => {
                if cursor.as_deref() == Some(next.as_str()) {
                    tracing::warn!("Listing of {} repeated cursor, treating as exhausted", collection);
                    break;
                }
                tracing::debug!("{} '{}' not on page {}, following cursor", collection, name, pages);
                cursor = Some(next);
            }
            PageScan::Exhausted => break,
        }
    }

    tracing::warn!("List exhausted: no {} named '{}'", collection, name);
    Err(ProvisionError::UnresolvedDependency {
        collection,
        name: name.to_string(),
        pages,
    })
}
