//! In-process transports and a faulty store for pipeline tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use {
    herald_channels::{
        Error as ChannelError, IdentityResolver, ListingFetcher, MessageSink,
        Result as ChannelResult,
    },
    herald_store::{Backlog, CheckPass, InMemoryStore, ItemStore, StoreStats},
};

/// Resolves a fixed set of handles; everything else is not found.
pub struct FakeResolver {
    identities: HashMap<String, i64>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeResolver {
    pub fn new<const N: usize>(identities: [(&str, i64); N]) -> Self {
        Self {
            identities: identities
                .into_iter()
                .map(|(h, id)| (h.to_string(), id))
                .collect(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn calls(&self, handle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(handle)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl IdentityResolver for FakeResolver {
    async fn resolve(&self, handle: &str) -> ChannelResult<i64> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(handle.to_string())
            .or_default() += 1;
        self.identities
            .get(handle)
            .copied()
            .ok_or_else(|| ChannelError::not_found(handle))
    }
}

#[derive(Clone)]
pub enum FakePage {
    Ids(Vec<i64>),
    Fail,
    Hang,
}

/// Serves canned listings and records how many fetches overlap.
#[derive(Default)]
pub struct FakeFetcher {
    pages: Mutex<HashMap<String, FakePage>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn page(self, handle: &str, page: FakePage) -> Self {
        self.set_page(handle, page);
        self
    }

    pub fn set_page(&self, handle: &str, page: FakePage) {
        self.pages.lock().unwrap().insert(handle.to_string(), page);
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingFetcher for FakeFetcher {
    async fn list_recent_item_ids(&self, handle: &str) -> ChannelResult<Vec<i64>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let page = self.pages.lock().unwrap().get(handle).cloned();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = match page {
            Some(FakePage::Ids(ids)) => Ok(ids),
            Some(FakePage::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            },
            Some(FakePage::Fail) | None => Err(ChannelError::rejected(format!(
                "GET /s/{handle}: HTTP 502 Bad Gateway"
            ))),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Records every send; rejects texts containing a configured needle.
#[derive(Default)]
pub struct FakeSink {
    failing: Mutex<Vec<String>>,
    sent: Mutex<Vec<(i64, i32, String)>>,
    attempts: AtomicUsize,
}

impl FakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_containing(&self, needle: &str) {
        self.failing.lock().unwrap().push(needle.to_string());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn sent(&self) -> Vec<(i64, i32, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageSink for FakeSink {
    async fn send_text(&self, destination: i64, thread_id: i32, text: &str) -> ChannelResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing
            .lock()
            .unwrap()
            .iter()
            .any(|needle| text.contains(needle.as_str()));
        if failing {
            return Err(ChannelError::rejected("Bad Request: message thread not found"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination, thread_id, text.to_string()));
        Ok(())
    }
}

/// An in-memory store whose passes fail when saving for one channel.
pub struct FaultyStore {
    inner: InMemoryStore,
    poisoned_identity: i64,
}

impl FaultyStore {
    pub fn new(inner: InMemoryStore, poisoned_identity: i64) -> Self {
        Self {
            inner,
            poisoned_identity,
        }
    }
}

#[async_trait]
impl ItemStore for FaultyStore {
    async fn begin_pass(&self) -> herald_store::Result<Box<dyn CheckPass>> {
        Ok(Box::new(FaultyPass {
            inner: self.inner.begin_pass().await?,
            poisoned_identity: self.poisoned_identity,
        }))
    }

    async fn has_item(&self, channel_identity: i64, item_id: i64) -> herald_store::Result<bool> {
        self.inner.has_item(channel_identity, item_id).await
    }

    async fn save_item(
        &self,
        channel_identity: i64,
        item_id: i64,
        link: &str,
    ) -> herald_store::Result<bool> {
        self.inner.save_item(channel_identity, item_id, link).await
    }

    async fn list_undelivered(&self) -> herald_store::Result<Backlog> {
        self.inner.list_undelivered().await
    }

    async fn mark_delivered(&self, link: &str) -> herald_store::Result<bool> {
        self.inner.mark_delivered(link).await
    }

    async fn latest_item_id(&self, channel_identity: i64) -> herald_store::Result<Option<i64>> {
        self.inner.latest_item_id(channel_identity).await
    }

    async fn stats(&self) -> herald_store::Result<StoreStats> {
        self.inner.stats().await
    }
}

struct FaultyPass {
    inner: Box<dyn CheckPass>,
    poisoned_identity: i64,
}

#[async_trait]
impl CheckPass for FaultyPass {
    async fn has_item(&self, channel_identity: i64, item_id: i64) -> herald_store::Result<bool> {
        self.inner.has_item(channel_identity, item_id).await
    }

    async fn save_item(
        &self,
        channel_identity: i64,
        item_id: i64,
        link: &str,
    ) -> herald_store::Result<bool> {
        if channel_identity == self.poisoned_identity {
            return Err(herald_store::Error::message("disk I/O error"));
        }
        self.inner.save_item(channel_identity, item_id, link).await
    }

    async fn commit(self: Box<Self>) -> herald_store::Result<usize> {
        self.inner.commit().await
    }
}
