use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::fs;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::CooldownStore;

/// Cooldown store backed by a single file holding one decimal unix
/// timestamp. A missing file means no cooldown has ever been recorded, which
/// the engine reads as "eligible immediately".
#[derive(Debug, Clone)]
pub struct FileCooldownStore {
    path: PathBuf,
}

impl FileCooldownStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CooldownStore for FileCooldownStore {
    async fn get(&self) -> Result<Option<i64>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let next_eligible_at = contents.trim().parse::<i64>().map_err(|_| {
            StoreError::Corrupt(format!(
                "{} does not contain a unix timestamp",
                self.path.display()
            ))
        })?;

        Ok(Some(next_eligible_at))
    }

    async fn put(&self, next_eligible_at: i64) -> Result<()> {
        fs::write(&self.path, next_eligible_at.to_string()).await?;
        debug!(next_eligible_at, path = %self.path.display(), "wrote cooldown value");
        Ok(())
    }
}
