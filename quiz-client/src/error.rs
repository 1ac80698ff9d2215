//! Client error types

use reqwest::StatusCode;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket transport failed
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Server answered with an error body
    #[error("Server error ({status}): {message}")]
    Server { status: StatusCode, message: String },

    /// Server URL cannot be turned into a WebSocket URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Server did not confirm the live session in time
    #[error("Timed out waiting for ready frame")]
    ReadyTimeout,

    /// Gave up reconnecting
    #[error("Reconnect attempts exhausted after {0} tries")]
    ReconnectExhausted(u32),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Validation failures (4xx) are not worth retrying
    pub fn is_client_error(&self) -> bool {
        matches!(self, ClientError::Server { status, .. } if status.is_client_error())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
