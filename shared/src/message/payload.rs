//! Live channel payloads

use serde::{Deserialize, Serialize};

/// `ack` payload
///
/// Signed on the wire so that malformed values reach validation instead of
/// failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckPayload {
    pub seq: i64,
}

/// `ready` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyPayload {
    /// Server-side session id (diagnostics only)
    pub session_id: u64,
    /// Highest sequence number assigned when the session was registered
    pub current_seq: u64,
}

/// `error` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}
