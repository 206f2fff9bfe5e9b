use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::{CooldownStore, DedupStore};

/// In-memory dedup store. Cloning shares the underlying map, so a test can
/// hand one clone to the engine and keep another for assertions.
#[derive(Debug, Default, Clone)]
pub struct MemoryDedupStore {
    records: Arc<Mutex<HashMap<String, i64>>>,
}

impl MemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DedupStore for MemoryDedupStore {
    async fn get(&self, name: &str) -> Result<Option<i64>> {
        Ok(self.records.lock().unwrap().get(name).copied())
    }

    async fn put(&self, name: &str, notified_at: i64) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert(name.to_string(), notified_at);
        Ok(())
    }
}

/// In-memory cooldown store, shared across clones like [`MemoryDedupStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryCooldownStore {
    next_eligible_at: Arc<Mutex<Option<i64>>>,
}

impl MemoryCooldownStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CooldownStore for MemoryCooldownStore {
    async fn get(&self) -> Result<Option<i64>> {
        Ok(*self.next_eligible_at.lock().unwrap())
    }

    async fn put(&self, next_eligible_at: i64) -> Result<()> {
        *self.next_eligible_at.lock().unwrap() = Some(next_eligible_at);
        Ok(())
    }
}
