//! Concurrent check pass: resolve, fetch and record new posts per channel.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
    sync::Arc,
    time::Duration,
};

use {
    futures::{StreamExt, TryStreamExt, stream},
    tracing::{debug, info, warn},
};

use {
    herald_channels::{IdentityResolver, ListingFetcher},
    herald_store::{CheckPass, ItemStore, link::canonical_link},
};

use crate::Result;

/// Default number of channels checked at once.
pub const DEFAULT_WORKERS: usize = 10;

/// Default bound on a channel's resolve + fetch.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Why a channel contributed nothing to a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The handle did not resolve to a public channel.
    Unresolvable,
    /// The listing could not be read.
    Transport(String),
    /// Resolve + fetch exceeded the request timeout.
    Timeout,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolvable => write!(f, "channel is not public or does not exist"),
            Self::Transport(e) => write!(f, "listing unavailable: {e}"),
            Self::Timeout => write!(f, "timed out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedChannel {
    pub handle: String,
    pub reason: SkipReason,
}

/// What one checked channel contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel_identity: i64,
    /// Links recorded in this pass, ascending by item id.
    pub new_links: Vec<String>,
}

/// Merged outcome of a check pass. Informational: the durable effect is in
/// the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Checked channels by handle, including those with nothing new.
    pub channels: BTreeMap<String, ChannelReport>,
    pub skipped: Vec<SkippedChannel>,
}

impl CheckReport {
    /// Channel identity → number of items recorded in this pass.
    #[must_use]
    pub fn counts(&self) -> HashMap<i64, usize> {
        self.channels
            .values()
            .map(|c| (c.channel_identity, c.new_links.len()))
            .collect()
    }

    /// Total items recorded in this pass.
    #[must_use]
    pub fn new_items(&self) -> usize {
        self.channels.values().map(|c| c.new_links.len()).sum()
    }

    /// Links recorded for `handle`; empty if it was skipped or unknown.
    #[must_use]
    pub fn new_links(&self, handle: &str) -> &[String] {
        self.channels
            .get(handle)
            .map(|c| c.new_links.as_slice())
            .unwrap_or(&[])
    }

    fn merge(&mut self, outcome: ChannelOutcome) {
        match outcome {
            ChannelOutcome::Checked { handle, report } => {
                self.channels.insert(handle, report);
            },
            ChannelOutcome::Skipped(skipped) => self.skipped.push(skipped),
        }
    }
}

enum ChannelOutcome {
    Checked {
        handle: String,
        report: ChannelReport,
    },
    Skipped(SkippedChannel),
}

/// Runs check passes over a set of channel handles.
pub struct Checker {
    store: Arc<dyn ItemStore>,
    resolver: Arc<dyn IdentityResolver>,
    fetcher: Arc<dyn ListingFetcher>,
    workers: usize,
    request_timeout: Duration,
}

impl Checker {
    pub fn new(
        store: Arc<dyn ItemStore>,
        resolver: Arc<dyn IdentityResolver>,
        fetcher: Arc<dyn ListingFetcher>,
    ) -> Self {
        Self {
            store,
            resolver,
            fetcher,
            workers: DEFAULT_WORKERS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Channels checked concurrently (at least one).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Check every handle once and record unseen posts.
    ///
    /// All rows recorded by the pass are committed together. Unresolvable,
    /// unreachable or slow channels are skipped and reported; a store error
    /// abandons the whole pass and nothing from it is kept.
    pub async fn check_all<I, S>(&self, handles: I) -> Result<CheckReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let handles: BTreeSet<String> = handles
            .into_iter()
            .map(|h| h.as_ref().to_string())
            .collect();

        let pass = self.store.begin_pass().await?;
        let pass_ref = pass.as_ref();

        let outcomes: Vec<ChannelOutcome> = stream::iter(&handles)
            .map(|handle| self.check_channel(handle, pass_ref))
            .buffer_unordered(self.workers)
            .try_collect()
            .await?;

        let recorded = pass.commit().await?;

        let mut report = CheckReport::default();
        for outcome in outcomes {
            report.merge(outcome);
        }

        info!(
            channels = handles.len(),
            checked = report.channels.len(),
            skipped = report.skipped.len(),
            new_items = recorded,
            "check pass committed"
        );
        Ok(report)
    }

    async fn check_channel(&self, handle: &str, pass: &dyn CheckPass) -> Result<ChannelOutcome> {
        let (channel_identity, item_ids) = match self.discover(handle).await {
            Ok(found) => found,
            Err(reason) => {
                warn!(handle, reason = %reason, "skipping channel for this pass");
                return Ok(ChannelOutcome::Skipped(SkippedChannel {
                    handle: handle.to_string(),
                    reason,
                }));
            },
        };

        // Ascending ids keep insertion order equal to post order.
        let item_ids: BTreeSet<i64> = item_ids.into_iter().collect();
        let mut new_links = Vec::new();
        for item_id in item_ids {
            if pass.has_item(channel_identity, item_id).await? {
                continue;
            }
            let link = canonical_link(handle, item_id);
            if pass.save_item(channel_identity, item_id, &link).await? {
                new_links.push(link);
            }
        }

        debug!(
            handle,
            channel_identity,
            new_items = new_links.len(),
            "channel checked"
        );
        Ok(ChannelOutcome::Checked {
            handle: handle.to_string(),
            report: ChannelReport {
                channel_identity,
                new_links,
            },
        })
    }

    /// Resolve and fetch, bounded by the request timeout.
    async fn discover(&self, handle: &str) -> std::result::Result<(i64, Vec<i64>), SkipReason> {
        let work = async {
            let channel_identity = self.resolver.resolve(handle).await.map_err(|e| {
                debug!(handle, error = %e, "identity not resolved");
                SkipReason::Unresolvable
            })?;
            let item_ids = self
                .fetcher
                .list_recent_item_ids(handle)
                .await
                .map_err(|e| SkipReason::Transport(e.to_string()))?;
            Ok((channel_identity, item_ids))
        };

        tokio::time::timeout(self.request_timeout, work)
            .await
            .unwrap_or(Err(SkipReason::Timeout))
    }
}
