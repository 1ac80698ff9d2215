//! Live channel frames
//!
//! JSON text frames exchanged over the `/ws` WebSocket between the server
//! and connected sessions. Every frame carries a `type` tag:
//!
//! | Direction | `type` | Payload |
//! |-----------|--------|---------|
//! | server → client | `ready` | [`ReadyPayload`] |
//! | server → client | `question` | [`Question`] |
//! | server → client | `error` | [`ErrorPayload`] |
//! | client → server | `ack` | [`AckPayload`] |
//!
//! `ready` is always the first frame of an accepted session and is sent only
//! after the session is registered for fanout. A client must not reconcile
//! before it arrives: anything committed after `ready` is pushed, anything
//! before it is in the backlog.

use serde::{Deserialize, Serialize};

use crate::question::Question;

pub mod payload;
pub use payload::*;

/// Frame pushed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Session registered; pushes start after this frame
    Ready(ReadyPayload),
    /// Newly sequenced question (forward-only fanout)
    Question(Question),
    /// Non-fatal error report for this session
    Error(ErrorPayload),
}

impl ServerMessage {
    pub fn ready(session_id: u64, current_seq: u64) -> Self {
        ServerMessage::Ready(ReadyPayload {
            session_id,
            current_seq,
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorPayload {
            message: message.into(),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Frame sent by a client session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Confirmation that `seq` was received and merged
    Ack(AckPayload),
}

impl ClientMessage {
    pub fn ack(seq: u64) -> Self {
        // Sequence numbers never exceed i64::MAX in practice; saturate instead of wrapping.
        ClientMessage::Ack(AckPayload {
            seq: i64::try_from(seq).unwrap_or(i64::MAX),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
