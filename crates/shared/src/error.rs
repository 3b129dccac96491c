use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    OutOfRange,
    NoSequenceAssigned,
    NoMatchingSequence,
    UnsupportedFeature,
    Provisioning,
}

/// Typed failures of the sequence controller, surfaced over the control
/// surface as [`ApiError`] values. Never swallowed, never retried here.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SlmError {
    #[error("position {position} is outside the pattern catalog (len {len})")]
    OutOfRange { position: usize, len: usize },
    #[error("no sequence has been assigned")]
    NoSequenceAssigned,
    #[error("no sequence entry found for angle {angle}")]
    NoMatchingSequence { angle: f64 },
    #[error("{0}")]
    UnsupportedFeature(String),
    #[error("pattern provisioning failed: {0}")]
    Provisioning(String),
}

impl SlmError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SlmError::OutOfRange { .. } => ErrorCode::OutOfRange,
            SlmError::NoSequenceAssigned => ErrorCode::NoSequenceAssigned,
            SlmError::NoMatchingSequence { .. } => ErrorCode::NoMatchingSequence,
            SlmError::UnsupportedFeature(_) => ErrorCode::UnsupportedFeature,
            SlmError::Provisioning(_) => ErrorCode::Provisioning,
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        SlmError::UnsupportedFeature(message.into())
    }

    pub fn provisioning(message: impl Into<String>) -> Self {
        SlmError::Provisioning(message.into())
    }
}

/// Wire form of a controller failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<SlmError> for ApiError {
    fn from(value: SlmError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}
