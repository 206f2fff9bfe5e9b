use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("server did not respond within the timeout")]
    Unreachable,

    #[error("malformed reply from server: {0}")]
    ProtocolViolation(String),

    #[error("network error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QueryError>;
