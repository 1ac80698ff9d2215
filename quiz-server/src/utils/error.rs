//! 统一错误处理
//!
//! [`AppError`] 把投递引擎的错误映射为 HTTP 响应：
//!
//! | 变体 | 状态码 | 错误码 |
//! |------|--------|--------|
//! | `Validation` | 400 | E0002 |
//! | `NotFound` | 404 | E0003 |
//! | `Storage` | 500 | E9002 |
//! | `Consistency` | 500 | E9003 |
//! | `Internal` | 500 | E9001 |
//!
//! 5xx 的详细信息只写日志，不返回给调用方。
//!
//! ```json
//! { "code": 2, "message": "text is required" }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::{ErrorBody, ErrorCode};
use tracing::error;

use crate::delivery::DeliveryError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 客户端错误 (4xx) ==========
    #[error("Validation failed: {0}")]
    /// 参数校验失败 (400)
    Validation(String),

    #[error("Resource not found: {0}")]
    /// 资源不存在 (404)
    NotFound(String),

    // ========== 系统错误 (5xx) ==========
    #[error("Storage error: {0}")]
    /// 存储不可用 (500)
    Storage(String),

    #[error("Consistency violation: {0}")]
    /// 一致性破坏，操作已中止 (500)
    Consistency(String),

    #[error("Internal server error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) => ErrorCode::InvalidInput,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Storage(_) => ErrorCode::StorageUnavailable,
            AppError::Consistency(_) => ErrorCode::ConsistencyViolation,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::Storage(msg) => {
                error!(target: "database", error = %msg, "Storage error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, code.message())
            }
            AppError::Consistency(msg) => {
                error!(target: "delivery", error = %msg, "Consistency violation");
                (StatusCode::INTERNAL_SERVER_ERROR, code.message())
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, code.message())
            }
        };

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

impl From<DeliveryError> for AppError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::InvalidInput(msg) => AppError::Validation(msg),
            DeliveryError::QuestionNotFound(seq) => {
                AppError::NotFound(format!("Question {} not found", seq))
            }
            DeliveryError::ConsistencyViolation(msg) => AppError::Consistency(msg),
            DeliveryError::Storage(e) => AppError::Storage(e.to_string()),
        }
    }
}
