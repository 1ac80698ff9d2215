//! Sequenced delivery core
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  create   ┌───────────┐  commit  ┌──────────────┐
//! │ POST /quest. │ ────────▶ │ Sequencer │ ───────▶ │  QuizStorage │
//! └──────────────┘           └─────┬─────┘          │   (redb)     │
//!                                  │ broadcast      │  questions   │
//!                                  ▼                │  client_acks │
//!                            ┌───────────┐          └──────▲───────┘
//!                            │LiveFanout │                 │
//!                            └─────┬─────┘                 │
//!                                  │ mpsc per session      │
//!                                  ▼                       │
//!                            ┌───────────┐   ack    ┌──────┴───────┐
//!                            │ /ws sess. │ ───────▶ │ AckRecorder  │
//!                            └───────────┘          └──────────────┘
//!                            GET /reconcile ──────▶ ReconcileService (read)
//! ```
//!
//! Delivery is at-least-once: clients dedupe by `seq`.

pub mod acks;
pub mod engine;
pub mod error;
pub mod fanout;
pub mod reconcile;
pub mod sequencer;
pub mod storage;

pub use acks::{AckOutcome, AckRecorder};
pub use engine::DeliveryEngine;
pub use error::{DeliveryError, DeliveryResult};
pub use fanout::{BroadcastReport, LiveFanout, SessionId, Subscription};
pub use reconcile::ReconcileService;
pub use sequencer::Sequencer;
pub use storage::{QuizStorage, StorageError, StorageResult};
