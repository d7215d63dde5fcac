//! Errors raised by indicator computations

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("{indicator}: insufficient data, need {required} rows but got {actual}")]
    InsufficientData {
        indicator: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("{indicator}: invalid parameter: {message}")]
    InvalidParameter {
        indicator: &'static str,
        message: String,
    },
}

impl IndicatorError {
    pub fn insufficient(indicator: &'static str, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            indicator,
            required,
            actual,
        }
    }

    pub fn invalid(indicator: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            indicator,
            message: message.into(),
        }
    }

    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}
