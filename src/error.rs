//! Error taxonomy for a symbol's evaluation run

use crate::db::StoreError;
use crate::indicators::IndicatorError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl EngineError {
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, EngineError::Indicator(e) if e.is_insufficient_data())
    }

    /// Worth another attempt for the same symbol
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Store(e) if e.is_retryable())
    }

    /// The batch cannot make progress for any symbol
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Store(e) if e.is_fatal())
    }
}
