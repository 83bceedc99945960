//! Offset pagination
//!
//! Jira's paged list endpoints share one envelope:
//! `{"startAt", "maxResults", "total", "isLast", "values": [...]}`.
//! [`JiraClient::fetch_all_pages`] walks it until the listing is exhausted.

use crate::client::JiraClient;
use crate::error::{Error, Result};
use crate::transport::ApiRequest;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Default page size requested from paged endpoints
pub const PAGE_SIZE: u64 = 50;

/// Upper bound on pages walked for a single listing
pub const MAX_PAGES: usize = 1000;

/// One page of a paged listing
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub values: Vec<T>,

    #[serde(rename = "startAt", default)]
    pub start_at: Option<u64>,

    #[serde(rename = "maxResults", default)]
    pub max_results: Option<u64>,

    #[serde(default)]
    pub total: Option<u64>,

    #[serde(rename = "isLast", default)]
    pub is_last: Option<bool>,
}

impl<T> Page<T> {
    /// Whether this page ends the listing, given how many items were seen so far
    pub fn is_final(&self, fetched: u64) -> bool {
        if self.values.is_empty() {
            return true;
        }
        match (self.is_last, self.total) {
            (Some(true), _) => true,
            (_, Some(total)) => fetched >= total,
            (Some(false), None) => false,
            // No paging metadata: a single, complete page
            (None, None) => true,
        }
    }
}

impl JiraClient {
    /// Fetch a single page starting at `start_at`
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        start_at: u64,
    ) -> Result<Page<T>> {
        let paged = request
            .clone()
            .query("startAt", start_at.to_string())
            .query("maxResults", PAGE_SIZE.to_string());
        self.fetch(&paged).await
    }

    /// Fetch every page of a paged listing and concatenate the values.
    ///
    /// A listing that is still unfinished after [`MAX_PAGES`] pages is an
    /// error, never a silently truncated result.
    pub async fn fetch_all_pages<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<Vec<T>> {
        let mut items: Vec<T> = Vec::new();
        let mut start_at = 0u64;

        for page_number in 0..MAX_PAGES {
            let page: Page<T> = self.fetch_page(request, start_at).await?;
            let count = page.values.len() as u64;
            let done = page.is_final(items.len() as u64 + count);

            debug!(
                path = %request.path,
                page = page_number,
                start_at = start_at,
                count = count,
                "Fetched page"
            );

            items.extend(page.values);
            if done {
                return Ok(items);
            }
            start_at += count;
        }

        warn!(path = %request.path, pages = MAX_PAGES, "Paged listing did not end");
        Err(Error::PageLimit {
            path: request.path.clone(),
            pages: MAX_PAGES,
        })
    }
}
