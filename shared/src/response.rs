//! Response types for the HTTP surface

use serde::{Deserialize, Serialize};

use crate::question::Question;

/// `GET /questions` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionList {
    pub questions: Vec<Question>,
}

/// `GET /reconcile` response
///
/// `questions` is the unacknowledged backlog in ascending `seq` order;
/// `current_seq` is the highest sequence number assigned so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub questions: Vec<Question>,
    pub current_seq: u64,
}

/// `GET /` health response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// ok | degraded
    pub status: String,
    /// RFC 3339 server time
    pub timestamp: String,
    pub uptime_seconds: u64,
    /// connected | error
    pub storage: String,
    pub current_seq: u64,
    pub live_sessions: usize,
}
