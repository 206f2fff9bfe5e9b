//! Durable-store adapters for the notification engine.
//!
//! The engine only ever needs two very small contracts: a key/value map of
//! player name to last-notified timestamp (ALL mode deduplication) and a
//! single durable value holding the next eligible notification time
//! (THRESHOLD mode cooldown). Both are traits so the evaluators can be
//! exercised against in-memory fakes; production wiring uses SQLite for the
//! map and a plain file for the single value.
//!
//! Writes are idempotent on purpose: overlapping invocations of the engine
//! may apply the same write twice, and that must be harmless.

#![allow(async_fn_in_trait)]

mod error;
mod file;
mod memory;
mod sqlite;

pub use error::{Result, StoreError};
pub use file::FileCooldownStore;
pub use memory::{MemoryCooldownStore, MemoryDedupStore};
pub use sqlite::SqliteDedupStore;

/// Durable map of player name to the unix timestamp of the last notification
/// sent for that name. Records are never deleted by the engine; retention is
/// an external concern.
pub trait DedupStore {
    /// Timestamp of the last notification for `name`, if any.
    async fn get(&self, name: &str) -> Result<Option<i64>>;

    /// Record that `name` was notified at `notified_at`. Overwriting an
    /// existing record must succeed.
    async fn put(&self, name: &str, notified_at: i64) -> Result<()>;
}

/// Durable single value: the next unix timestamp at which a threshold
/// notification may fire. Absent means "eligible immediately".
pub trait CooldownStore {
    async fn get(&self) -> Result<Option<i64>>;

    async fn put(&self, next_eligible_at: i64) -> Result<()>;
}
