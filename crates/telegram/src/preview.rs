//! Recent post ids from the public `t.me/s/<handle>` preview page.

use std::time::Duration;

use {async_trait::async_trait, regex::Regex, tracing::debug};

use herald_channels::{Error as ChannelError, ListingFetcher, Result as ChannelResult};

use crate::Result;

/// Public preview listing root.
pub const PREVIEW_BASE_URL: &str = "https://t.me/s/";

/// Fetches channel preview pages over plain HTTPS.
pub struct PreviewFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl PreviewFetcher {
    /// Every page read is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: PREVIEW_BASE_URL.to_string(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn page_url(&self, handle: &str) -> String {
        format!("{}/{handle}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ListingFetcher for PreviewFetcher {
    async fn list_recent_item_ids(&self, handle: &str) -> ChannelResult<Vec<i64>> {
        let url = self.page_url(handle);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ChannelError::timeout(format!("GET {url}"))
            } else {
                ChannelError::external(format!("GET {url}"), e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::rejected(format!("GET {url}: HTTP {status}")));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ChannelError::timeout(format!("reading {url}"))
            } else {
                ChannelError::external(format!("reading {url}"), e)
            }
        })?;

        let ids = extract_item_ids(handle, &body)
            .map_err(|e| ChannelError::external("building post link pattern", e))?;
        debug!(handle, count = ids.len(), "fetched preview page");
        Ok(ids)
    }
}

/// Every integer `N` appearing as `<handle>/N` in `page`, in page order.
///
/// The handle is matched case-insensitively and must start at a word
/// boundary, so `xalpha/5` does not count for `alpha`.
pub fn extract_item_ids(handle: &str, page: &str) -> std::result::Result<Vec<i64>, regex::Error> {
    let pattern = Regex::new(&format!(r"(?i)\b{}/(\d+)", regex::escape(handle)))?;
    Ok(pattern
        .captures_iter(page)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect())
}
