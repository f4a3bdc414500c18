//! In-memory store for testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    Result,
    link::handle_from_link,
    store::{CheckPass, ItemStore},
    types::{Backlog, Item, StoreStats},
};

#[derive(Default)]
struct State {
    items: Vec<Item>,
    next_id: i64,
}

impl State {
    fn contains(&self, channel_identity: i64, item_id: i64) -> bool {
        self.items
            .iter()
            .any(|i| i.channel_identity == channel_identity && i.item_id == item_id)
    }

    fn insert(&mut self, channel_identity: i64, item_id: i64, link: &str, created_at: i64) -> bool {
        if self.contains(channel_identity, item_id) {
            return false;
        }
        self.next_id += 1;
        self.items.push(Item {
            id: self.next_id,
            channel_identity,
            item_id,
            link: link.to_string(),
            created_at,
            delivered: false,
        });
        true
    }
}

/// In-memory store backed by a `Vec`. Nothing is persisted.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded item in insertion order.
    pub fn items(&self) -> Vec<Item> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.items.clone()
    }
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn begin_pass(&self) -> Result<Box<dyn CheckPass>> {
        Ok(Box::new(InMemoryPass {
            state: Arc::clone(&self.state),
            pending: Mutex::new(State::default()),
        }))
    }

    async fn has_item(&self, channel_identity: i64, item_id: i64) -> Result<bool> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.contains(channel_identity, item_id))
    }

    async fn save_item(&self, channel_identity: i64, item_id: i64, link: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.insert(
            channel_identity,
            item_id,
            link,
            chrono::Utc::now().timestamp(),
        ))
    }

    async fn list_undelivered(&self) -> Result<Backlog> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut backlog = Backlog::new();
        for item in state.items.iter().filter(|i| !i.delivered) {
            if let Some(handle) = handle_from_link(&item.link) {
                backlog.push(handle, item.link.as_str());
            }
        }
        Ok(backlog)
    }

    async fn mark_delivered(&self, link: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut changed = false;
        for item in state
            .items
            .iter_mut()
            .filter(|i| i.link == link && !i.delivered)
        {
            item.delivered = true;
            changed = true;
        }
        Ok(changed)
    }

    async fn latest_item_id(&self, channel_identity: i64) -> Result<Option<i64>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state
            .items
            .iter()
            .filter(|i| i.channel_identity == channel_identity)
            .map(|i| i.item_id)
            .max())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(StoreStats {
            total: state.items.len() as i64,
            undelivered: state.items.iter().filter(|i| !i.delivered).count() as i64,
        })
    }
}

/// Buffers a pass's writes until commit.
struct InMemoryPass {
    state: Arc<Mutex<State>>,
    pending: Mutex<State>,
}

#[async_trait]
impl CheckPass for InMemoryPass {
    async fn has_item(&self, channel_identity: i64, item_id: i64) -> Result<bool> {
        if self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(channel_identity, item_id)
        {
            return Ok(true);
        }
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.contains(channel_identity, item_id))
    }

    async fn save_item(&self, channel_identity: i64, item_id: i64, link: &str) -> Result<bool> {
        if self.has_item(channel_identity, item_id).await? {
            return Ok(false);
        }
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        Ok(pending.insert(
            channel_identity,
            item_id,
            link,
            chrono::Utc::now().timestamp(),
        ))
    }

    async fn commit(self: Box<Self>) -> Result<usize> {
        let pending = self.pending.into_inner().unwrap_or_else(|e| e.into_inner());
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut recorded = 0;
        for item in pending.items {
            if state.insert(
                item.channel_identity,
                item.item_id,
                &item.link,
                item.created_at,
            ) {
                recorded += 1;
            }
        }
        Ok(recorded)
    }
}
