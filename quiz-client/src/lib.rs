//! Quiz Client - live subscriber for the quiz server
//!
//! - [`ClientSession`]: connection state machine and local ordered view
//! - [`HttpClient`]: REST calls (reconcile, create, list)
//! - [`QuizClient`]: WebSocket runner with reconnect and reconciliation

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;

pub use client::{ClientEvent, QuizClient};
pub use config::{ClientConfig, ReconnectPolicy};
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use session::{ClientSession, ConnectionState, Gap, PushOutcome};

// Re-export shared types for convenience
pub use shared::{Question, QuestionContent};
