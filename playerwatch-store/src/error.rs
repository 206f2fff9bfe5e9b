use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] tokio_rusqlite::rusqlite::Error),

    #[error("database connection error: {0}")]
    Connection(#[from] tokio_rusqlite::Error),

    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt cooldown value: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
