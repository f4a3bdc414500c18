//! Backlog flush into the destination group's topics.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use tracing::{debug, info, warn};

use {herald_channels::MessageSink, herald_store::ItemStore};

use crate::Result;

/// Default pause between consecutive sends.
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_millis(1000);

/// Text posted for one relayed link.
#[must_use]
pub fn format_message(handle: &str, link: &str) -> String {
    format!("#{handle} <a href=\"{link}\">{link}</a>")
}

/// Outcome of one flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Links sent and marked delivered.
    pub delivered: Vec<String>,
    /// Links whose send failed; they stay in the backlog.
    pub failed: Vec<String>,
    /// Backlog handles with no thread in the mapping.
    pub unrouted: Vec<String>,
}

impl FlushReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.unrouted.is_empty()
    }
}

/// Sends undelivered links and marks each one delivered after it is sent.
pub struct Forwarder {
    store: Arc<dyn ItemStore>,
    sink: Arc<dyn MessageSink>,
    send_delay: Duration,
}

impl Forwarder {
    pub fn new(store: Arc<dyn ItemStore>, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            store,
            sink,
            send_delay: DEFAULT_SEND_DELAY,
        }
    }

    #[must_use]
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    /// Forward the whole backlog to `destination`, routing each handle to
    /// its thread via `routes`.
    ///
    /// A failed send leaves that link undelivered and moves on; it is retried
    /// by the next flush. Store errors abort the flush.
    pub async fn flush(
        &self,
        destination: i64,
        routes: &BTreeMap<String, i32>,
    ) -> Result<FlushReport> {
        let backlog = self.store.list_undelivered().await?;
        let mut report = FlushReport::default();
        if backlog.is_empty() {
            debug!("backlog empty, nothing to forward");
            return Ok(report);
        }

        let mut sent_any = false;
        for (handle, links) in backlog.iter() {
            let Some(thread_id) = route(routes, handle) else {
                warn!(
                    handle,
                    pending = links.len(),
                    "no thread mapped for channel, leaving links queued"
                );
                report.unrouted.push(handle.to_string());
                continue;
            };

            for link in links {
                if sent_any && !self.send_delay.is_zero() {
                    tokio::time::sleep(self.send_delay).await;
                }
                sent_any = true;

                let text = format_message(handle, link);
                match self.sink.send_text(destination, thread_id, &text).await {
                    Ok(()) => {
                        self.store.mark_delivered(link).await?;
                        debug!(handle, thread_id, link = %link, "link forwarded");
                        report.delivered.push(link.clone());
                    },
                    Err(e) => {
                        warn!(handle, thread_id, link = %link, error = %e, "forward failed");
                        report.failed.push(link.clone());
                    },
                }
            }
        }

        info!(
            destination,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            unrouted = report.unrouted.len(),
            "backlog flushed"
        );
        Ok(report)
    }
}

/// Exact handle match first, then case-insensitive.
fn route(routes: &BTreeMap<String, i32>, handle: &str) -> Option<i32> {
    routes.get(handle).copied().or_else(|| {
        routes
            .iter()
            .find(|(h, _)| h.eq_ignore_ascii_case(handle))
            .map(|(_, thread)| *thread)
    })
}
