//! Persistence traits for recorded items.

use async_trait::async_trait;

use crate::{
    Result,
    types::{Backlog, StoreStats},
};

/// Persistence backend for recorded items and their delivery state.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Open a check pass. Everything saved through the pass becomes visible
    /// atomically on [`CheckPass::commit`]; dropping the pass discards it.
    ///
    /// The SQLite backend holds its connection for the life of the pass, so
    /// callers must go through the pass rather than the store until it ends.
    async fn begin_pass(&self) -> Result<Box<dyn CheckPass>>;

    async fn has_item(&self, channel_identity: i64, item_id: i64) -> Result<bool>;

    /// Record an item outside of a pass. Returns `false` when the
    /// `(channel_identity, item_id)` pair already exists; the existing row
    /// is left untouched.
    async fn save_item(&self, channel_identity: i64, item_id: i64, link: &str) -> Result<bool>;

    /// Undelivered links grouped by the handle parsed from each link, oldest
    /// first within a handle.
    async fn list_undelivered(&self) -> Result<Backlog>;

    /// Flip `link` to delivered. Returns `false` if it was already delivered
    /// or is unknown.
    async fn mark_delivered(&self, link: &str) -> Result<bool>;

    /// Highest item id recorded for a channel.
    async fn latest_item_id(&self, channel_identity: i64) -> Result<Option<i64>>;

    async fn stats(&self) -> Result<StoreStats>;
}

/// Writes of one check pass, shared by all concurrent channel checks.
///
/// Implementations serialize access internally; `has_item` observes items
/// saved earlier in the same pass.
#[async_trait]
pub trait CheckPass: Send + Sync {
    async fn has_item(&self, channel_identity: i64, item_id: i64) -> Result<bool>;

    /// Same contract as [`ItemStore::save_item`], scoped to the pass.
    async fn save_item(&self, channel_identity: i64, item_id: i64, link: &str) -> Result<bool>;

    /// Make the pass durable. Returns the number of rows recorded.
    async fn commit(self: Box<Self>) -> Result<usize>;
}
