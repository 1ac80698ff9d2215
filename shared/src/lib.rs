//! Shared types for the quiz delivery workspace
//!
//! Domain and wire types used by both `quiz-server` and `quiz-client`:
//! sequenced questions, acknowledgement records, live-channel frames and
//! the HTTP request/response bodies.

pub mod ack;
pub mod error;
pub mod message;
pub mod question;
pub mod request;
pub mod response;

// Re-exports
pub use ack::ClientAck;
pub use error::{ErrorBody, ErrorCode};
pub use message::{AckPayload, ClientMessage, ErrorPayload, ReadyPayload, ServerMessage};
pub use question::{Question, QuestionContent};
pub use request::{CreateQuestionRequest, ReconcileQuery};
pub use response::{HealthResponse, QuestionList, ReconcileResponse};
