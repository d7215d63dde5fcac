use thiserror::Error;
use tokio_postgres::error::SqlState;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Connection lost or never established; the batch cannot continue
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Serialization failure or deadlock between concurrent writers
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("failed to decode stored value: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        if e.is_closed() {
            return StoreError::Unavailable(e.to_string());
        }
        match e.code() {
            Some(code)
                if *code == SqlState::T_R_SERIALIZATION_FAILURE
                    || *code == SqlState::T_R_DEADLOCK_DETECTED
                    || *code == SqlState::UNIQUE_VIOLATION =>
            {
                StoreError::Conflict(e.to_string())
            }
            _ => StoreError::Query(e.to_string()),
        }
    }
}
