//! SQLite-backed item store using sqlx.

use std::{
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

use {
    async_trait::async_trait,
    sqlx::{
        Sqlite, SqlitePool, Transaction,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    tokio::sync::Mutex,
    tracing::{debug, warn},
};

use crate::{
    Result,
    link::handle_from_link,
    store::{CheckPass, ItemStore},
    types::{Backlog, StoreStats},
};

const HAS_ITEM_SQL: &str =
    "SELECT EXISTS(SELECT 1 FROM items WHERE channel_identity = ? AND item_id = ?)";

const SAVE_ITEM_SQL: &str = "INSERT OR IGNORE INTO items
     (channel_identity, item_id, link, created_at, delivered)
     VALUES (?, ?, ?, ?, 0)";

/// SQLite-backed persistence for recorded items.
///
/// SQLite has a single writer, so the pool is capped at one connection; a
/// check pass owns it until the pass ends.
pub struct SqliteItemStore {
    pool: SqlitePool,
}

impl SqliteItemStore {
    /// Connect to `database_url` and run migrations.
    ///
    /// `sqlite::memory:` works for tests.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;

        crate::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Open (creating if needed) the database file at `path` and run
    /// migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        crate::run_migrations(&pool).await?;
        debug!(path = %path.display(), "opened item store");

        Ok(Self { pool })
    }

    /// Close the pool, waiting for the connection to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    async fn begin_pass(&self) -> Result<Box<dyn CheckPass>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteCheckPass {
            tx: Mutex::new(tx),
            recorded: AtomicUsize::new(0),
        }))
    }

    async fn has_item(&self, channel_identity: i64, item_id: i64) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar(HAS_ITEM_SQL)
            .bind(channel_identity)
            .bind(item_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists != 0)
    }

    async fn save_item(&self, channel_identity: i64, item_id: i64, link: &str) -> Result<bool> {
        let result = sqlx::query(SAVE_ITEM_SQL)
            .bind(channel_identity)
            .bind(item_id)
            .bind(link)
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_undelivered(&self) -> Result<Backlog> {
        let links: Vec<String> =
            sqlx::query_scalar("SELECT link FROM items WHERE delivered = 0 ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        let mut backlog = Backlog::new();
        for link in links {
            match handle_from_link(&link) {
                Some(handle) => backlog.push(handle, link.as_str()),
                None => warn!(link, "skipping undelivered item with malformed link"),
            }
        }
        Ok(backlog)
    }

    async fn mark_delivered(&self, link: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE items SET delivered = 1 WHERE link = ? AND delivered = 0")
            .bind(link)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn latest_item_id(&self, channel_identity: i64) -> Result<Option<i64>> {
        let latest: Option<i64> =
            sqlx::query_scalar("SELECT MAX(item_id) FROM items WHERE channel_identity = ?")
                .bind(channel_identity)
                .fetch_one(&self.pool)
                .await?;
        Ok(latest)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let (total, undelivered): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN delivered = 0 THEN 1 ELSE 0 END), 0)
             FROM items",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(StoreStats { total, undelivered })
    }
}

/// A check pass backed by one SQLite transaction.
struct SqliteCheckPass {
    tx: Mutex<Transaction<'static, Sqlite>>,
    recorded: AtomicUsize,
}

#[async_trait]
impl CheckPass for SqliteCheckPass {
    async fn has_item(&self, channel_identity: i64, item_id: i64) -> Result<bool> {
        let mut tx = self.tx.lock().await;
        let exists: i64 = sqlx::query_scalar(HAS_ITEM_SQL)
            .bind(channel_identity)
            .bind(item_id)
            .fetch_one(&mut **tx)
            .await?;
        Ok(exists != 0)
    }

    async fn save_item(&self, channel_identity: i64, item_id: i64, link: &str) -> Result<bool> {
        let mut tx = self.tx.lock().await;
        let result = sqlx::query(SAVE_ITEM_SQL)
            .bind(channel_identity)
            .bind(item_id)
            .bind(link)
            .bind(chrono::Utc::now().timestamp())
            .execute(&mut **tx)
            .await?;
        let inserted = result.rows_affected() == 1;
        if inserted {
            self.recorded.fetch_add(1, Ordering::Relaxed);
        }
        Ok(inserted)
    }

    async fn commit(self: Box<Self>) -> Result<usize> {
        let recorded = self.recorded.load(Ordering::Relaxed);
        self.tx.into_inner().commit().await?;
        Ok(recorded)
    }
}
