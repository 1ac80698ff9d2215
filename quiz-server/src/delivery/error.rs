use super::storage::StorageError;
use shared::ErrorCode;
use thiserror::Error;

/// Delivery core errors
///
/// | Variant | Class | Caller may retry |
/// |---------|-------|------------------|
/// | `InvalidInput` | client error, no state change | no |
/// | `QuestionNotFound` | client error | no |
/// | `ConsistencyViolation` | fatal, operation halted | no |
/// | `Storage` | transient I/O | reads only |
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Question not found: {0}")]
    QuestionNotFound(u64),

    #[error("Consistency violation: {0}")]
    ConsistencyViolation(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl DeliveryError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Error code surfaced to collaborators
    pub fn code(&self) -> ErrorCode {
        match self {
            DeliveryError::InvalidInput(_) => ErrorCode::InvalidInput,
            DeliveryError::QuestionNotFound(_) => ErrorCode::NotFound,
            DeliveryError::ConsistencyViolation(_) => ErrorCode::ConsistencyViolation,
            DeliveryError::Storage(_) => ErrorCode::StorageUnavailable,
        }
    }
}

impl From<StorageError> for DeliveryError {
    fn from(err: StorageError) -> Self {
        match err {
            // The unique constraint on seq is a backstop, never a retry signal
            StorageError::DuplicateSequence(seq) => DeliveryError::ConsistencyViolation(format!(
                "sequence number {} already assigned",
                seq
            )),
            other => DeliveryError::Storage(other),
        }
    }
}

pub type DeliveryResult<T> = Result<T, DeliveryError>;
