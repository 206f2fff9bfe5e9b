use std::path::Path;

use tokio_rusqlite::Connection;
use tokio_rusqlite::rusqlite::{OptionalExtension, params};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::DedupStore;

/// SQLite-backed dedup store: one row per player name ever notified.
#[derive(Clone)]
pub struct SqliteDedupStore {
    conn: Connection,
}

impl SqliteDedupStore {
    /// Open or create a database at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).await.map_err(StoreError::Sqlite)?;
        let store = Self { conn };
        store.initialize().await?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(StoreError::Sqlite)?;
        let store = Self { conn };
        store.initialize().await?;
        Ok(store)
    }

    async fn initialize(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                // WAL mode so a racing invocation reading the store does not
                // block a writer
                conn.pragma_update(None, "journal_mode", "WAL")?;

                conn.execute_batch(
                    r#"
                    CREATE TABLE IF NOT EXISTS seen_players (
                        name TEXT PRIMARY KEY,
                        notified_at INTEGER NOT NULL
                    );
                    "#,
                )?;
                Ok(())
            })
            .await?;

        info!("dedup store initialized");
        Ok(())
    }
}

impl DedupStore for SqliteDedupStore {
    async fn get(&self, name: &str) -> Result<Option<i64>> {
        let name = name.to_string();
        let notified_at = self
            .conn
            .call(move |conn| {
                conn.prepare_cached("SELECT notified_at FROM seen_players WHERE name = ?1")?
                    .query_row(params![&name], |row| row.get(0))
                    .optional()
            })
            .await?;

        Ok(notified_at)
    }

    async fn put(&self, name: &str, notified_at: i64) -> Result<()> {
        let name = name.to_string();
        let name_log = name.clone();

        self.conn
            .call(move |conn| {
                // INSERT OR REPLACE keeps the write idempotent under
                // overlapping invocations
                conn.prepare_cached(
                    "INSERT OR REPLACE INTO seen_players (name, notified_at) VALUES (?1, ?2)",
                )?
                .execute(params![&name, notified_at])?;
                Ok(())
            })
            .await?;

        debug!(name = %name_log, notified_at, "recorded notified player");
        Ok(())
    }
}
