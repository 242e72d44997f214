//! Error types shared by the store initializers, handles and probes.

use thiserror::Error;

/// Errors raised while bootstrapping, probing or closing a data store.
///
/// Setup-time variants display with the tag of the step that failed, so
/// logs tell them apart without inspecting the source error.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("parse dsn: {0}")]
    ParseDsn(#[source] sqlx::Error),

    #[error("parse url: {0}")]
    ParseUrl(String),

    #[error("ping: {0}")]
    Ping(#[source] Box<DataError>),

    #[error("close: {0}")]
    Close(String),

    #[error("handle is closed")]
    Closed,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("context canceled")]
    Canceled,

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl DataError {
    /// Wrap an error as a failed liveness check.
    pub fn ping(err: impl Into<DataError>) -> Self {
        DataError::Ping(Box::new(err.into()))
    }

    /// True when the failure came from the caller's deadline or cancellation
    /// rather than from the store itself.
    pub fn is_context(&self) -> bool {
        match self {
            DataError::DeadlineExceeded | DataError::Canceled => true,
            DataError::Ping(inner) => inner.is_context(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
