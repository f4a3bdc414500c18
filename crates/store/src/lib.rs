//! Durable state for the relay: every observed channel post, keyed by
//! `(channel_identity, item_id)`, doubling as the delivery queue.
//!
//! Rows are append-only. A row is created once, inside the check pass that
//! discovered it, and flipped to delivered once, after a confirmed send.

pub mod error;
pub mod link;
pub mod store;
pub mod store_memory;
pub mod store_sqlite;
pub mod types;

pub use {
    error::{Error, Result},
    store::{CheckPass, ItemStore},
    store_memory::InMemoryStore,
    store_sqlite::SqliteItemStore,
    types::{Backlog, Item, StoreStats},
};

/// Run database migrations for the item store.
///
/// Creates the `items` table. Called by [`SqliteItemStore::new`] and
/// [`SqliteItemStore::open`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
