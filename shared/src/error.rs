//! Error codes shared by the server and its clients
//!
//! Error codes are organized by category:
//! - 0xxx: General / client errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as a bare `u16` so non-Rust clients can match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Malformed client-supplied parameters
    InvalidInput = 2,
    /// Resource not found
    NotFound = 3,

    // ==================== 9xxx: System ====================
    /// Unexpected internal error
    InternalError = 9001,
    /// Storage unavailable or failed (safe to retry reads)
    StorageUnavailable = 9002,
    /// Stored state would have been corrupted; operation halted
    ConsistencyViolation = 9003,
}

impl ErrorCode {
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    pub const fn is_client_error(&self) -> bool {
        matches!(self, ErrorCode::InvalidInput | ErrorCode::NotFound)
    }

    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::InvalidInput => "Invalid input",
            ErrorCode::NotFound => "Not found",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StorageUnavailable => "Storage unavailable",
            ErrorCode::ConsistencyViolation => "Consistency violation",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Unknown numeric error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::InvalidInput),
            3 => Ok(ErrorCode::NotFound),
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::StorageUnavailable),
            9003 => Ok(ErrorCode::ConsistencyViolation),
            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Error body returned by every failing HTTP endpoint
///
/// ```json
/// { "code": 2, "message": "lastSeq must be a non-negative integer" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
